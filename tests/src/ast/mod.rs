mod cardinality;
mod identifier;
