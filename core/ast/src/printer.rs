use std::fmt::Write;

use crate::{
    statements::RootStatement,
    visitor::{DetailValue, ElementRef, VisitControl, Visitor, walk_root},
};

/// Renders a lowered root as an indented outline, one element or detail
/// per line. The output only depends on the tree, which makes it usable
/// for golden comparisons.
#[derive(Debug, Default)]
pub struct TreePrinter {
    output: String,
    depth: usize,
}

impl TreePrinter {
    #[must_use]
    pub fn print(root: &RootStatement) -> String {
        let mut printer = TreePrinter::default();
        let _ = walk_root(&mut printer, root);
        printer.output
    }

    fn line(&mut self, text: impl std::fmt::Display) {
        let _ = writeln!(self.output, "{:indent$}{text}", "", indent = self.depth * 2);
    }
}

impl<'ast> Visitor<'ast> for TreePrinter {
    fn on_element(&mut self, element: ElementRef<'ast>) -> VisitControl {
        self.line(element.kind_name());
        self.depth += 1;
        VisitControl::Continue
    }

    fn exit_element(&mut self, _element: ElementRef<'ast>) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn on_detail(&mut self, name: &'static str, value: DetailValue<'ast>) -> VisitControl {
        self.line(format_args!("{name}: {value}"));
        VisitControl::Continue
    }
}
