//! The three pipeline stages.
//!
//! - Stage A parses every listed file, then every on-disk file reached
//!   through includes, in waves until no new file turns up
//! - Stage B builds the symbol table from the complete Stage A output and
//!   lowers each file
//! - Stage C merges the per-file results
//!
//! Both A and B fan out over a rayon pool unless `single_threaded` is set.
//! Results are collected in listing order, so the output does not depend
//! on scheduling.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use rustc_hash::FxHashSet;
use schema_ast::{
    builder::build_root,
    errors::{Diagnostic, DiagnosticKind},
    position::Range,
    raw::Grammar,
};
use schema_lowering::{ParsedFile, SymbolTable, lower_files};
use tracing::{debug, instrument, trace, warn};

use crate::{
    errors::SchemaError, lowered::LoweredWorkspace, options::ExecutionOptions,
    workspace::{SourceContent, Workspace},
};

/// The Stage A output: one parsed file per ordinal.
#[derive(Debug, Default)]
pub struct ParsedWorkspace {
    files: Vec<ParsedFile>,
    keys: Vec<(PathBuf, PathBuf)>,
}

impl ParsedWorkspace {
    /// Parsed files, indexed by ordinal.
    #[must_use]
    pub fn files(&self) -> &[ParsedFile] {
        &self.files
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files that failed to parse, with their diagnostics.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &Diagnostic)> {
        self.files
            .iter()
            .filter_map(|file| file.root.as_ref().err().map(|error| (&*file.path, error)))
    }

    fn push(&mut self, directory: PathBuf, file: PathBuf, parsed: ParsedFile) {
        self.keys.push((directory, file));
        self.files.push(parsed);
    }
}

enum Origin<'w> {
    Listed(&'w SourceContent),
    Discovered,
}

struct Source<'w> {
    directory: PathBuf,
    file: PathBuf,
    path: Arc<Path>,
    origin: Origin<'w>,
}

impl Source<'_> {
    /// A content failure belongs to this file only and is reported as its
    /// diagnostic.
    fn read(&self) -> Result<String, Diagnostic> {
        let content = match &self.origin {
            Origin::Listed(content) => content.read(),
            Origin::Discovered => fs::read_to_string(&self.path).map_err(anyhow::Error::from),
        };
        content.map_err(|error| {
            Diagnostic::new(
                DiagnosticKind::UnreadableContent {
                    path: self.path.to_path_buf(),
                    reason: format!("{error:#}"),
                },
                Range::file_start(self.path.clone()),
            )
        })
    }
}

/// Runs all three stages.
///
/// # Errors
///
/// Returns [`SchemaError::Infrastructure`] when the worker pool cannot be
/// built, and [`SchemaError::Diagnostic`] when exactly one file failed and
/// `raise_if_single_exception` is set. Unreadable content fails its own
/// file only.
#[instrument(skip_all, fields(files = workspace.len()))]
pub fn compile(
    grammar: &dyn Grammar,
    workspace: &Workspace,
    options: &ExecutionOptions,
) -> Result<LoweredWorkspace, SchemaError> {
    let pool = build_pool(options)?;
    let parsed = parse_in(pool.as_ref(), grammar, workspace)?;
    lower_in(pool.as_ref(), &parsed, options)
}

/// Stage A on its own.
///
/// # Errors
///
/// Returns [`SchemaError::Infrastructure`] when the worker pool cannot be
/// built.
pub fn parse(
    grammar: &dyn Grammar,
    workspace: &Workspace,
    options: &ExecutionOptions,
) -> Result<ParsedWorkspace, SchemaError> {
    let pool = build_pool(options)?;
    parse_in(pool.as_ref(), grammar, workspace)
}

/// Stages B and C on the output of [`parse`].
///
/// # Errors
///
/// Returns [`SchemaError::Diagnostic`] when exactly one file failed and
/// `raise_if_single_exception` is set.
pub fn lower(
    parsed: &ParsedWorkspace,
    options: &ExecutionOptions,
) -> Result<LoweredWorkspace, SchemaError> {
    let pool = build_pool(options)?;
    lower_in(pool.as_ref(), parsed, options)
}

fn build_pool(options: &ExecutionOptions) -> anyhow::Result<Option<ThreadPool>> {
    if options.single_threaded {
        return Ok(None);
    }
    let threads = match options.max_num_threads {
        Some(0) => bail!("`max_num_threads` must be at least 1"),
        Some(threads) => threads,
        None => 0,
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("schema-worker-{index}"))
        .build()
        .context("failed to build the worker pool")?;
    Ok(Some(pool))
}

fn run<T, R>(pool: Option<&ThreadPool>, items: &[T], task: impl Fn(usize, &T) -> R + Sync) -> Vec<R>
where
    T: Sync,
    R: Send,
{
    match pool {
        Some(pool) => pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| task(index, item))
                .collect()
        }),
        None => items
            .iter()
            .enumerate()
            .map(|(index, item)| task(index, item))
            .collect(),
    }
}

#[instrument(skip_all)]
fn parse_in(
    pool: Option<&ThreadPool>,
    grammar: &dyn Grammar,
    workspace: &Workspace,
) -> Result<ParsedWorkspace, SchemaError> {
    let mut pending: Vec<Source<'_>> = workspace
        .files()
        .map(|file| Source {
            directory: file.directory.to_path_buf(),
            file: file.file.to_path_buf(),
            path: Arc::from(file.path()),
            origin: Origin::Listed(file.content),
        })
        .collect();
    let mut known: FxHashSet<PathBuf> = pending.iter().map(|source| source.path.to_path_buf()).collect();
    let mut parsed = ParsedWorkspace::default();

    let mut wave = 0;
    while !pending.is_empty() {
        debug!(wave, count = pending.len(), "parsing wave");
        let first = parsed.len();
        let results = run(pool, &pending, |index, source| {
            parse_source(grammar, first + index, source)
        });
        for (source, result) in pending.into_iter().zip(results) {
            parsed.push(source.directory, source.file, result?);
        }

        let discovered: BTreeSet<PathBuf> = parsed.files[first..]
            .iter()
            .filter_map(|file| file.root.as_ref().ok())
            .flat_map(|root| root.includes().map(|include| include.target_path()))
            .filter(|target| !known.contains(target) && target.is_file())
            .collect();
        pending = discovered
            .into_iter()
            .map(|target| {
                known.insert(target.clone());
                trace!(file = %target.display(), "discovered included file");
                Source {
                    directory: target.parent().map(Path::to_path_buf).unwrap_or_default(),
                    file: target.file_name().map(PathBuf::from).unwrap_or_default(),
                    path: Arc::from(target),
                    origin: Origin::Discovered,
                }
            })
            .collect();
        wave += 1;
    }
    debug!(files = parsed.len(), "parsing finished");
    Ok(parsed)
}

fn parse_source(grammar: &dyn Grammar, ordinal: usize, source: &Source<'_>) -> anyhow::Result<ParsedFile> {
    let ordinal = u32::try_from(ordinal).context("too many files in the workspace")?;
    let root = source
        .read()
        .and_then(|content| grammar.parse(&source.path, &content))
        .and_then(|raw| build_root(source.path.clone(), ordinal, raw))
        .map(Arc::new);
    trace!(file = %source.path.display(), ordinal, ok = root.is_ok(), "parsed file");
    Ok(ParsedFile {
        path: source.path.clone(),
        root,
    })
}

#[instrument(skip_all, fields(files = parsed.len()))]
fn lower_in(
    pool: Option<&ThreadPool>,
    parsed: &ParsedWorkspace,
    options: &ExecutionOptions,
) -> Result<LoweredWorkspace, SchemaError> {
    let table = SymbolTable::build(&parsed.files);
    let results = match pool {
        Some(pool) => pool.install(|| lower_files(&table, &parsed.files, true)),
        None => lower_files(&table, &parsed.files, false),
    };

    let mut lowered = LoweredWorkspace::default();
    for (((directory, file), parsed_file), result) in parsed.keys.iter().zip(&parsed.files).zip(results) {
        match result {
            Ok(root) => lowered.insert_root(directory.clone(), file.clone(), root),
            Err(diagnostic) => {
                if !options.quiet {
                    warn!(file = %parsed_file.path.display(), %diagnostic, "file failed");
                }
                lowered.insert_error(parsed_file.path.to_path_buf(), diagnostic);
            }
        }
    }
    debug!(
        failed = lowered.errors().len(),
        structures = lowered.structure_count(),
        "workspace lowered"
    );
    if options.raise_if_single_exception
        && let Some(diagnostic) = lowered.take_single_error()
    {
        return Err(SchemaError::Diagnostic(diagnostic));
    }
    Ok(lowered)
}
