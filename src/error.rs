use std::fmt;

/// A raw name that does not have the `Last, First` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unparsable name {raw:?}")]
pub struct UnparsableName {
    pub raw: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchCause {
    #[error("transport error")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid url")]
    InvalidUrl(#[from] url::ParseError),
    #[error("no form on page")]
    NoForm,
}

#[derive(Debug, thiserror::Error)]
#[error("Fetch failed for {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new<U: Into<String>, C: Into<FetchCause>>(url: U, cause: C) -> Self {
        FetchError {
            url: url.into(),
            cause: cause.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RowParseKind {
    #[error("no cell at column {0}")]
    MissingCell(usize),
    #[error(transparent)]
    Name(#[from] UnparsableName),
}

/// Failure scoped to one data row; `row` counts from the top of the table.
#[derive(Debug, thiserror::Error)]
#[error("Row {row}: {kind}")]
pub struct RowParseError {
    pub row: usize,
    #[source]
    pub kind: RowParseKind,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unsupported backend {0:?}")]
    UnsupportedBackend(String),
    #[error("Invalid connection descriptor {0:?}")]
    InvalidDescriptor(String),
    #[error("Database error")]
    Sqlite(#[from] sqlx::error::Error),
    #[error("MongoDB error")]
    Mongo(#[from] mongodb::error::Error),
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("Serialization error")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Unknown task {0:?}")]
    UnknownTask(String),
    #[error("Invalid parliament {0:?}")]
    InvalidEra(String),
    #[error("No parliament given")]
    MissingEra,
    #[error("Parliament {era:?} is not listed on {url}")]
    EraNotListed { era: String, url: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    RowParse(#[from] RowParseError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Terminal error of a run, with the context needed to diagnose it.
#[derive(Debug)]
pub struct RunError {
    pub task: String,
    pub strategy: Option<String>,
    pub source: ScrapeError,
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Some(strategy) => write!(
                f,
                "Task {} (strategy {}) failed: {}",
                self.task, strategy, self.source
            ),
            None => write!(f, "Task {} failed: {}", self.task, self.source),
        }
    }
}
