use super::{Adapter, ConnectionDescriptor, Options};
use crate::{error::StoreError, Person};
use mongodb::{bson::doc, options::ReplaceOptions, Client, Collection};
use tokio::sync::OnceCell;
use tracing::debug;
use url::form_urlencoded;

const DATABASE: &str = "database";
const COLLECTION: &str = "collection";

/// Upserts people by name into a MongoDB collection.
///
/// Nothing is opened until the first save.
pub struct MongoDbAdapter {
    address: String,
    options: Options,
    collection: OnceCell<Collection<Person>>,
}

impl MongoDbAdapter {
    pub fn new(address: &str, options: Options) -> MongoDbAdapter {
        MongoDbAdapter {
            address: address.to_string(),
            options,
            collection: OnceCell::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn database(&self) -> &str {
        self.options.get(DATABASE).map_or("pupa", String::as_str)
    }

    pub fn collection_name(&self) -> &str {
        self.options.get(COLLECTION).map_or("people", String::as_str)
    }

    /// Connection string; options other than the database and collection
    /// names are passed to the driver.
    pub fn uri(&self) -> String {
        let mut uri = if self.address.starts_with("mongodb://")
            || self.address.starts_with("mongodb+srv://")
        {
            self.address.clone()
        } else {
            format!("mongodb://{}", self.address)
        };

        let driver_options = self
            .options
            .iter()
            .filter(|(k, _)| k.as_str() != DATABASE && k.as_str() != COLLECTION)
            .collect::<Vec<_>>();
        if !driver_options.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(driver_options)
                .finish();
            let host = uri.find("://").map_or(0, |i| i + 3);
            if !uri[host..].contains('/') {
                uri.push('/');
            }
            uri.push(if uri.contains('?') { '&' } else { '?' });
            uri.push_str(&query);
        }
        uri
    }

    async fn collection(&self) -> Result<&Collection<Person>, StoreError> {
        self.collection
            .get_or_try_init(|| async {
                debug!("Open MongoDB {}", self.address);
                let client = Client::with_uri_str(self.uri()).await?;
                Ok::<_, StoreError>(
                    client
                        .database(self.database())
                        .collection::<Person>(self.collection_name()),
                )
            })
            .await
    }
}

#[async_trait::async_trait]
impl Adapter for MongoDbAdapter {
    fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor {
            scheme: "mongodb".to_string(),
            address: self.address.clone(),
            options: self.options.clone(),
        }
    }

    async fn save(&self, person: Person) -> Result<(), StoreError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection()
            .await?
            .replace_one(doc! { "name": person.name() }, &person, options)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_address_and_options() {
        let adapter = MongoDbAdapter::new("localhost:27017", Options::new());
        assert_eq!(adapter.address(), "localhost:27017");
        assert!(adapter.options().is_empty());
        assert_eq!(adapter.uri(), "mongodb://localhost:27017");
        assert_eq!(adapter.database(), "pupa");
        assert_eq!(adapter.collection_name(), "people");
        assert!(adapter.collection.get().is_none());
    }

    #[test]
    fn driver_options_go_into_uri() {
        let options = Options::from([
            ("database".to_string(), "parl".to_string()),
            ("replicaSet".to_string(), "rs0".to_string()),
        ]);
        let adapter = MongoDbAdapter::new("db.example.org:27017", options);
        assert_eq!(adapter.database(), "parl");
        assert_eq!(adapter.uri(), "mongodb://db.example.org:27017/?replicaSet=rs0");
    }
}
