use serde::Serialize;
use std::fmt;

pub mod config;
pub mod fetch;
pub mod listing;
pub mod name;
pub mod parl;
pub mod runner;
pub mod select;
pub mod store;

mod data;
mod error;
mod utils;

pub use config::{CancelFlag, RowPolicy, ScrapeConfig};
pub use data::Table;
pub use error::{
    FetchCause, FetchError, RowParseError, RowParseKind, RunError, ScrapeError, StoreError,
    UnparsableName,
};
pub use fetch::{Document, Fetch, FetchConfig, HttpClient};
pub use listing::Rows;
pub use runner::{RunSummary, Runner};
pub use select::Registry;
pub use store::{Backend, Connection, ConnectionDescriptor, Options};

/// A legislator, the one record this crate produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    name: String,
}

impl Person {
    /// Wraps an already normalized name.
    pub fn new<S: Into<String>>(name: S) -> Result<Person, UnparsableName> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UnparsableName { raw: name });
        }
        Ok(Person { name })
    }

    /// Builds a person from listing text such as `"Smith, John (Party)"`.
    pub fn from_raw_name(raw: &str) -> Result<Person, UnparsableName> {
        Ok(Person {
            name: name::normalize(raw)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// An extraction routine bound to one format of the source site.
#[async_trait::async_trait]
pub trait Strategy: Send + Sync {
    fn id(&self) -> &'static str;

    /// Retrieves the listing document for the run described by `config`.
    async fn fetch(&self, client: &dyn Fetch, config: &ScrapeConfig)
        -> Result<Document, ScrapeError>;

    /// Lazily turns the listing rows into people.
    fn extract(&self, doc: &Document) -> Rows;
}
