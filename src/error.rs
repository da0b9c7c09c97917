use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("{0} not found. Does the folder exist?")]
    #[diagnostic(help("create the output folder or pass another one with -f"))]
    MissingFolder(Utf8PathBuf),

    #[error("input file must be either a .txt or .csv file: {0}")]
    UnsupportedInputExtension(String),

    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("two records resolve to the same output path: {0}")]
    #[diagnostic(help("give the records distinct names or remove the duplicate rows"))]
    PathCollision(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read input file at {0}")]
    InputRead(Utf8PathBuf),

    #[error("input line {line}: {message}")]
    InputParse { line: usize, message: String },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("catalog request failed: {0}")]
    Http(String),

    #[error("catalog server returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("query request failed: {0}")]
    QueryHttp(String),

    #[error("query service returned status {status}: {message}")]
    QueryStatus { status: u16, message: String },

    #[error("malformed query result: {0}")]
    QueryParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("progress display unavailable: {0}")]
    Progress(String),
}

impl CatalogError {
    /// Errors that stop a run before any task is dispatched.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CatalogError::MissingFolder(_)
                | CatalogError::UnsupportedInputExtension(_)
                | CatalogError::InvalidWorkerCount(_)
                | CatalogError::PathCollision(_)
                | CatalogError::ConfigRead(_)
                | CatalogError::ConfigParse(_)
                | CatalogError::InputRead(_)
                | CatalogError::InputParse { .. }
                | CatalogError::WorkerPool(_)
        )
    }
}
