use serde::Deserialize;

/// How a pipeline run is executed.
///
/// Deserializable so embedding applications can load it from their own
/// configuration files; missing keys take the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Parse and lower every file on the calling thread.
    pub single_threaded: bool,
    /// Worker count; `None` uses the host parallelism.
    pub max_num_threads: Option<usize>,
    /// Suppress per-file failure warnings.
    pub quiet: bool,
    /// Return the diagnostic itself when exactly one file failed.
    pub raise_if_single_exception: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            single_threaded: false,
            max_num_threads: None,
            quiet: false,
            raise_if_single_exception: true,
        }
    }
}

impl ExecutionOptions {
    #[must_use]
    pub fn with_single_threaded(mut self, single_threaded: bool) -> Self {
        self.single_threaded = single_threaded;
        self
    }

    #[must_use]
    pub fn with_max_num_threads(mut self, max_num_threads: Option<usize>) -> Self {
        self.max_num_threads = max_num_threads;
        self
    }

    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    #[must_use]
    pub fn with_raise_if_single_exception(mut self, raise: bool) -> Self {
        self.raise_if_single_exception = raise;
        self
    }
}
