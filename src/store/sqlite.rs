use super::{Adapter, ConnectionDescriptor, Options};
use crate::{error::StoreError, utils, Person, Table};
use futures::TryStreamExt;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};

pub struct PeopleTable {
    name: String,
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl Table for PeopleTable {
    type Record<'a> = &'a Person;

    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create(&self) -> Result<(), sqlx::Error> {
        if !utils::is_table_exists(self.get_pool(), &self.name).await? {
            let query = format!(
                "CREATE TABLE {} (
                    id TEXT PRIMARY KEY,
                    name TEXT,
                    created_at DATETIME
                 )",
                &self.name
            );
            sqlx::query(query.as_str()).execute(self.get_pool()).await?;
        }
        Ok(())
    }

    async fn insert<'a>(&self, record: Self::Record<'a>) -> Result<(), sqlx::Error> {
        let mut tx = self.get_pool().begin().await?;
        let query = format!(
            "INSERT INTO {} (id, name, created_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            &self.name
        );
        sqlx::query(&query)
            .bind(record.name())
            .bind(record.name())
            .bind(utils::get_now())
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

impl PeopleTable {
    /// Stored names, oldest first.
    pub async fn names(&self) -> Result<Vec<String>, sqlx::Error> {
        let mut names: Vec<String> = vec![];
        let query = format!("SELECT name FROM {} ORDER BY rowid", self.name);
        let mut rows = sqlx::query(&query).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            names.push(row.try_get("name")?);
        }
        Ok(names)
    }
}

/// Stores people in a SQLite file; `address` is the file path and the
/// `table` option names the table (`people` by default).
pub struct SqliteAdapter {
    pub people: PeopleTable,
    address: String,
    options: Options,
}

impl SqliteAdapter {
    pub async fn new(address: &str, options: &Options) -> Result<SqliteAdapter, StoreError> {
        let opt = SqliteConnectOptions::new()
            .filename(address)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        let people = PeopleTable {
            name: options
                .get("table")
                .map_or("people", String::as_str)
                .to_string(),
            pool,
        };

        if !utils::is_table_exists(&people.pool, &people.name).await? {
            tracing::debug!("Create table {}", people.name);
            people.create().await?;
        } else {
            tracing::debug!("Use table {}", people.name);
        }

        Ok(SqliteAdapter {
            people,
            address: address.to_string(),
            options: options.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Adapter for SqliteAdapter {
    fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor {
            scheme: "sqlite".to_string(),
            address: self.address.clone(),
            options: self.options.clone(),
        }
    }

    async fn save(&self, person: Person) -> Result<(), StoreError> {
        Ok(self.people.insert(&person).await?)
    }
}
