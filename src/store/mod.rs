//! Persistence of scraped people behind a scheme-selected adapter.

mod jsonl;
mod mongo;
mod sqlite;

pub use jsonl::JsonLinesAdapter;
pub use mongo::MongoDbAdapter;
pub use sqlite::{PeopleTable, SqliteAdapter};

use crate::{error::StoreError, Person};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use url::form_urlencoded;

pub type Options = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MongoDb,
    Sqlite,
    JsonLines,
}

impl Backend {
    pub fn from_scheme(scheme: &str) -> Result<Backend, StoreError> {
        match scheme {
            "mongodb" => Ok(Backend::MongoDb),
            "sqlite" => Ok(Backend::Sqlite),
            "jsonl" => Ok(Backend::JsonLines),
            _ => Err(StoreError::UnsupportedBackend(scheme.to_string())),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Backend::MongoDb => "mongodb",
            Backend::Sqlite => "sqlite",
            Backend::JsonLines => "jsonl",
        }
    }
}

/// `(scheme, address, options)`, written as `scheme://address?key=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub scheme: String,
    pub address: String,
    pub options: Options,
}

impl FromStr for ConnectionDescriptor {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidDescriptor(s.to_string());
        let (scheme, rest) = s.split_once("://").ok_or_else(invalid)?;
        let (address, query) = rest.split_once('?').unwrap_or((rest, ""));
        if scheme.is_empty() || address.is_empty() {
            return Err(invalid());
        }

        Ok(ConnectionDescriptor {
            scheme: scheme.to_string(),
            address: address.to_string(),
            options: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        })
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.address)?;
        if !self.options.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.options)
                .finish();
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
pub trait Adapter: Send + Sync {
    /// Where this adapter writes, as it was constructed.
    fn descriptor(&self) -> ConnectionDescriptor;

    /// Persists or updates `person`. Called once per record, in dispatch order.
    async fn save(&self, person: Person) -> Result<(), StoreError>;
}

pub struct Connection {
    adapter: Box<dyn Adapter>,
}

impl Connection {
    pub async fn new(
        scheme: &str,
        address: &str,
        options: Options,
    ) -> Result<Connection, StoreError> {
        let backend = Backend::from_scheme(scheme)?;
        let adapter: Box<dyn Adapter> = match backend {
            Backend::MongoDb => Box::new(MongoDbAdapter::new(address, options)),
            Backend::Sqlite => Box::new(SqliteAdapter::new(address, &options).await?),
            Backend::JsonLines => Box::new(JsonLinesAdapter::new(address, &options).await?),
        };
        debug!("Connected to {} backend at {}", backend.scheme(), address);

        Ok(Connection { adapter })
    }

    pub async fn open(descriptor: &ConnectionDescriptor) -> Result<Connection, StoreError> {
        Connection::new(
            &descriptor.scheme,
            &descriptor.address,
            descriptor.options.clone(),
        )
        .await
    }

    /// Wraps an adapter that is not reachable through a scheme.
    pub fn with_adapter<A: Adapter + 'static>(adapter: A) -> Connection {
        Connection {
            adapter: Box::new(adapter),
        }
    }

    pub fn descriptor(&self) -> ConnectionDescriptor {
        self.adapter.descriptor()
    }

    pub async fn save(&self, person: Person) -> Result<(), StoreError> {
        self.adapter.save(person).await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Connection")
            .field(&self.adapter.descriptor())
            .finish()
    }
}
