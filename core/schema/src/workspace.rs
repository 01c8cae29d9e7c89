//! Workspace description: directories mapping file names to content.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

type Thunk = Box<dyn Fn() -> anyhow::Result<String> + Send + Sync>;

/// Content of one file, either in memory or produced on demand.
pub enum SourceContent {
    Text(String),
    Lazy(Thunk),
}

impl SourceContent {
    pub fn lazy(thunk: impl Fn() -> anyhow::Result<String> + Send + Sync + 'static) -> Self {
        SourceContent::Lazy(Box::new(thunk))
    }

    /// # Errors
    ///
    /// Returns the thunk's failure for lazy content.
    pub fn read(&self) -> anyhow::Result<String> {
        match self {
            SourceContent::Text(text) => Ok(text.clone()),
            SourceContent::Lazy(thunk) => thunk(),
        }
    }
}

impl fmt::Debug for SourceContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceContent::Text(text) => f.debug_tuple("Text").field(text).finish(),
            SourceContent::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

impl From<String> for SourceContent {
    fn from(text: String) -> Self {
        SourceContent::Text(text)
    }
}

impl From<&str> for SourceContent {
    fn from(text: &str) -> Self {
        SourceContent::Text(text.to_string())
    }
}

/// One entry of the sorted workspace listing.
#[derive(Debug)]
pub struct WorkspaceFile<'w> {
    pub directory: &'w Path,
    pub file: &'w Path,
    pub content: &'w SourceContent,
}

impl WorkspaceFile<'_> {
    /// The path diagnostics and includes refer to: `directory/file`.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.directory.join(self.file)
    }
}

#[derive(Debug, Default)]
pub struct Workspace {
    directories: BTreeMap<PathBuf, BTreeMap<PathBuf, SourceContent>>,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(
        &mut self,
        directory: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
        content: impl Into<SourceContent>,
    ) -> &mut Self {
        self.directories
            .entry(directory.into())
            .or_default()
            .insert(file.into(), content.into());
        self
    }

    #[must_use]
    pub fn with_file(
        mut self,
        directory: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
        content: impl Into<SourceContent>,
    ) -> Self {
        self.add_file(directory, file, content);
        self
    }

    /// Every file, sorted by directory then file name.
    pub fn files(&self) -> impl Iterator<Item = WorkspaceFile<'_>> {
        self.directories.iter().flat_map(|(directory, files)| {
            files.iter().map(move |(file, content)| WorkspaceFile {
                directory,
                file,
                content,
            })
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directories.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
