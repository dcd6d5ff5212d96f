use crate::fetch::Fetch;
use crate::{
    CancelFlag, Connection, Registry, RowPolicy, RunError, ScrapeConfig, ScrapeError,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a run that was not aborted by an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub task: String,
    pub strategy: String,
    pub dispatched: usize,
    pub skipped: usize,
    /// The run stopped early on request; `dispatched` records were kept.
    pub cancelled: bool,
}

/// Selects a strategy, runs it and dispatches every person to the connection,
/// one at a time and in extraction order.
pub struct Runner {
    registry: Registry,
    client: Arc<dyn Fetch>,
    connection: Connection,
    row_policy: RowPolicy,
    cancel: CancelFlag,
}

impl Runner {
    pub fn new(registry: Registry, client: Arc<dyn Fetch>, connection: Connection) -> Runner {
        Runner {
            registry,
            client,
            connection,
            row_policy: RowPolicy::default(),
            cancel: CancelFlag::default(),
        }
    }

    pub fn row_policy(mut self, row_policy: RowPolicy) -> Self {
        self.row_policy = row_policy;
        self
    }

    pub fn cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(&self, task: &str, config: &ScrapeConfig) -> Result<RunSummary, RunError> {
        let id = self.registry.select(task, config).map_err(|source| RunError {
            task: task.to_string(),
            strategy: None,
            source,
        })?;
        let fail = |source: ScrapeError| RunError {
            task: task.to_string(),
            strategy: Some(id.clone()),
            source,
        };
        let strategy = self
            .registry
            .strategy(&id)
            .ok_or_else(|| fail(ScrapeError::UnknownTask(task.to_string())))?;

        let mut summary = RunSummary {
            task: task.to_string(),
            strategy: id.clone(),
            dispatched: 0,
            skipped: 0,
            cancelled: false,
        };
        if self.cancel.is_cancelled() {
            warn!("Task {} cancelled before start", task);
            summary.cancelled = true;
            return Ok(summary);
        }

        info!("Scrape {} with {}", task, id);
        let doc = strategy
            .fetch(self.client.as_ref(), config)
            .await
            .map_err(fail)?;
        let rows = strategy.extract(&doc);
        info!("{} rows on {}", rows.len(), doc.url);

        for row in rows {
            if self.cancel.is_cancelled() {
                warn!(
                    "Task {} cancelled after {} records",
                    task, summary.dispatched
                );
                summary.cancelled = true;
                break;
            }

            match row {
                Ok(person) => {
                    debug!("[{}] Dispatch {}", summary.dispatched + 1, person);
                    self.connection
                        .save(person)
                        .await
                        .map_err(|e| fail(e.into()))?;
                    summary.dispatched += 1;
                }
                Err(e) => match self.row_policy {
                    RowPolicy::Abort => return Err(fail(e.into())),
                    RowPolicy::Skip => {
                        warn!("Skip row on {}: {}", doc.url, e);
                        summary.skipped += 1;
                    }
                },
            }
        }

        info!(
            "Task {} done: {} dispatched, {} skipped",
            task, summary.dispatched, summary.skipped
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parl::fixtures::FixtureClient;
    use crate::parl::{self, legacy, modern};
    use crate::store::{Adapter, ConnectionDescriptor, Options, SqliteAdapter};
    use crate::{Person, RowParseKind, StoreError};
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Mutex;
    use tokio::fs;

    async fn runner(db: &str, client: FixtureClient) -> Runner {
        if Path::new(db).is_file() {
            fs::remove_file(db).await.unwrap();
        }
        let connection = Connection::new("sqlite", db, Options::new()).await.unwrap();
        Runner::new(Registry::default(), Arc::new(client), connection)
    }

    async fn stored(db: &str) -> Vec<String> {
        let s = SqliteAdapter::new(db, &Options::new()).await.unwrap();
        s.people.names().await.unwrap()
    }

    fn legacy_client(listing: &str) -> FixtureClient {
        FixtureClient::default()
            .page(legacy::SELECTION_URL, "legacy_selection.html")
            .page(&legacy::listing_url("f1b2c3d4"), listing)
    }

    #[tokio::test]
    async fn current_members_in_extraction_order() {
        let client = FixtureClient::default().page(modern::LIST_URL, "modern.html");
        let r = runner("test_run1.db", client).await;

        let summary = r.run("people", &ScrapeConfig::new()).await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                task: "people".to_string(),
                strategy: parl::MODERN.to_string(),
                dispatched: 4,
                skipped: 0,
                cancelled: false,
            }
        );
        assert_eq!(
            stored("test_run1.db").await,
            vec![
                "Diane Ablonczy",
                "Peter Adams",
                "John Q. Smith",
                "Peter Ivan Van Loan"
            ]
        );

        fs::remove_file("test_run1.db").await.unwrap();
    }

    #[tokio::test]
    async fn historical_parliament() {
        let r = runner("test_run2.db", legacy_client("legacy_listing.html")).await;
        let config = ScrapeConfig::new().with("parliament", "12");

        let summary = r.run("people", &config).await.unwrap();
        assert_eq!(summary.strategy, parl::LEGACY);
        assert_eq!(summary.dispatched, 3);
        assert_eq!(
            stored("test_run2.db").await,
            vec!["Robert Laird Borden", "Wilfrid Laurier", "Agnes Macphail"]
        );

        fs::remove_file("test_run2.db").await.unwrap();
    }

    #[tokio::test]
    async fn bad_row_aborts_by_default() {
        let r = runner("test_run3.db", legacy_client("legacy_listing_bad_row.html")).await;
        let config = ScrapeConfig::new().with("parliament", "12");

        let e = r.run("people", &config).await.unwrap_err();
        assert_eq!(e.task, "people");
        assert_eq!(e.strategy.as_deref(), Some(parl::LEGACY));
        match e.source {
            ScrapeError::RowParse(row) => {
                assert_eq!(row.row, 3);
                assert!(matches!(row.kind, RowParseKind::Name(_)));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(stored("test_run3.db").await, vec!["Robert Laird Borden"]);

        fs::remove_file("test_run3.db").await.unwrap();
    }

    #[tokio::test]
    async fn bad_row_skipped_and_counted() {
        let r = runner("test_run4.db", legacy_client("legacy_listing_bad_row.html"))
            .await
            .row_policy(RowPolicy::Skip);
        let config = ScrapeConfig::new().with("parliament", "12");

        let summary = r.run("people", &config).await.unwrap();
        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            stored("test_run4.db").await,
            vec!["Robert Laird Borden", "Agnes Macphail"]
        );

        fs::remove_file("test_run4.db").await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_run_keeps_what_was_dispatched() {
        let cancel = CancelFlag::new();
        let client = FixtureClient::default().page(modern::LIST_URL, "modern.html");
        let r = runner("test_run5.db", client)
            .await
            .cancel_flag(cancel.clone());
        cancel.cancel();

        let summary = r.run("people", &ScrapeConfig::new()).await.unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.dispatched, 0);
        assert!(stored("test_run5.db").await.is_empty());

        fs::remove_file("test_run5.db").await.unwrap();
    }

    /// Keeps saved names in memory and raises the cancel flag on the first save.
    #[derive(Clone, Default)]
    struct CancelOnSave {
        cancel: CancelFlag,
        saved: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Adapter for CancelOnSave {
        fn descriptor(&self) -> ConnectionDescriptor {
            ConnectionDescriptor {
                scheme: "memory".to_string(),
                address: "-".to_string(),
                options: Options::new(),
            }
        }

        async fn save(&self, person: Person) -> Result<(), StoreError> {
            self.saved.lock().unwrap().push(person.name().to_string());
            self.cancel.cancel();
            Ok(())
        }
    }

    #[tokio::test]
    async fn cancelled_between_rows() {
        let adapter = CancelOnSave::default();
        let client = FixtureClient::default().page(modern::LIST_URL, "modern.html");
        let r = Runner::new(
            Registry::default(),
            Arc::new(client),
            Connection::with_adapter(adapter.clone()),
        )
        .cancel_flag(adapter.cancel.clone());

        let summary = r.run("people", &ScrapeConfig::new()).await.unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(*adapter.saved.lock().unwrap(), vec!["Diane Ablonczy"]);
    }

    #[tokio::test]
    async fn unknown_task_has_no_strategy() {
        let r = runner("test_run6.db", FixtureClient::default()).await;
        let e = r.run("bills", &ScrapeConfig::new()).await.unwrap_err();
        assert_eq!(e.strategy, None);
        assert!(matches!(&e.source, ScrapeError::UnknownTask(t) if t == "bills"));
        assert_eq!(e.to_string(), "Task bills failed: Unknown task \"bills\"");

        fs::remove_file("test_run6.db").await.unwrap();
    }

    #[tokio::test]
    async fn fetch_failure_names_the_url() {
        let r = runner("test_run7.db", FixtureClient::default()).await;
        let e = r.run("people", &ScrapeConfig::new()).await.unwrap_err();
        assert_eq!(e.strategy.as_deref(), Some(parl::MODERN));
        assert!(matches!(&e.source, ScrapeError::Fetch(f) if f.url == modern::LIST_URL));

        fs::remove_file("test_run7.db").await.unwrap();
    }
}
