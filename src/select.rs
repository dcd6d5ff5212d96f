use crate::parl::{self, PeopleFirstToThirtyFifth, PeopleThirtySixthToDate};
use crate::{ScrapeConfig, ScrapeError, Strategy};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const PEOPLE: &str = "people";

type Resolver = Box<dyn Fn(&ScrapeConfig) -> Result<String, ScrapeError> + Send + Sync>;

/// Picks the strategy for the `people` task from the requested parliament.
/// Without a parliament the current format is assumed.
pub fn people_strategy(config: &ScrapeConfig) -> Result<String, ScrapeError> {
    let id = match config.parliament_number()? {
        Some(n) if n < parl::MODERN_SINCE => parl::LEGACY,
        _ => parl::MODERN,
    };
    Ok(id.to_string())
}

/// Strategies by identifier, plus per-task rules for choosing one.
///
/// A task without its own rule resolves to the strategy of the same name.
pub struct Registry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
    resolvers: HashMap<String, Resolver>,
}

impl Registry {
    pub fn empty() -> Registry {
        Registry {
            strategies: HashMap::new(),
            resolvers: HashMap::new(),
        }
    }

    pub fn with_strategy<S: Strategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies
            .insert(strategy.id().to_string(), Arc::new(strategy));
        self
    }

    /// Replaces the resolution rule of `task`.
    pub fn resolve_with<F>(mut self, task: &str, resolver: F) -> Self
    where
        F: Fn(&ScrapeConfig) -> Result<String, ScrapeError> + Send + Sync + 'static,
    {
        self.resolvers.insert(task.to_string(), Box::new(resolver));
        self
    }

    /// Identifier of the strategy that runs `task` under `config`.
    pub fn select(&self, task: &str, config: &ScrapeConfig) -> Result<String, ScrapeError> {
        let id = match self.resolvers.get(task) {
            Some(resolve) => resolve(config)?,
            None => task.to_string(),
        };
        if self.strategies.contains_key(&id) {
            Ok(id)
        } else {
            Err(ScrapeError::UnknownTask(task.to_string()))
        }
    }

    pub fn strategy(&self, id: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(id).cloned()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::empty()
            .with_strategy(PeopleThirtySixthToDate)
            .with_strategy(PeopleFirstToThirtyFifth)
            .resolve_with(PEOPLE, people_strategy)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut strategies = self.strategies.keys().collect::<Vec<_>>();
        strategies.sort();
        let mut tasks = self.resolvers.keys().collect::<Vec<_>>();
        tasks.sort();
        f.debug_struct("Registry")
            .field("strategies", &strategies)
            .field("tasks", &tasks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Document, Fetch};
    use crate::Rows;
    use pretty_assertions::assert_eq;

    fn people(parliament: Option<&str>) -> Result<String, ScrapeError> {
        let config = match parliament {
            Some(p) => ScrapeConfig::new().with("parliament", p),
            None => ScrapeConfig::new(),
        };
        Registry::default().select(PEOPLE, &config)
    }

    #[test]
    fn no_parliament_selects_modern() {
        assert_eq!(people(None).unwrap(), parl::MODERN);
    }

    #[test]
    fn threshold_is_36th_parliament() {
        assert_eq!(people(Some("12")).unwrap(), parl::LEGACY);
        assert_eq!(people(Some("1")).unwrap(), parl::LEGACY);
        assert_eq!(people(Some("35")).unwrap(), parl::LEGACY);
        assert_eq!(people(Some("36")).unwrap(), parl::MODERN);
        assert_eq!(people(Some("41")).unwrap(), parl::MODERN);
    }

    #[test]
    fn ordinal_parliament() {
        assert_eq!(people(Some("37th")).unwrap(), parl::MODERN);
        assert_eq!(people(Some("12th")).unwrap(), parl::LEGACY);
        assert_eq!(people(Some("1st")).unwrap(), parl::LEGACY);
    }

    #[test]
    fn selection_is_deterministic() {
        for p in ["3", "36", "40"] {
            assert_eq!(people(Some(p)).unwrap(), people(Some(p)).unwrap());
        }
    }

    #[test]
    fn non_numeric_parliament() {
        assert!(matches!(
            people(Some("latest")),
            Err(ScrapeError::InvalidEra(p)) if p == "latest"
        ));
    }

    #[test]
    fn unknown_task() {
        let e = Registry::default()
            .select("bills", &ScrapeConfig::new())
            .unwrap_err();
        assert!(matches!(e, ScrapeError::UnknownTask(t) if t == "bills"));
    }

    struct Committees;

    #[async_trait::async_trait]
    impl Strategy for Committees {
        fn id(&self) -> &'static str {
            "committees"
        }

        async fn fetch(
            &self,
            client: &dyn Fetch,
            _config: &ScrapeConfig,
        ) -> Result<Document, ScrapeError> {
            Ok(client.get("http://example.org/committees").await?)
        }

        fn extract(&self, _doc: &Document) -> Rows {
            Rows::empty()
        }
    }

    #[test]
    fn other_tasks_resolve_to_same_name() {
        let registry = Registry::default().with_strategy(Committees);
        assert_eq!(
            registry
                .select("committees", &ScrapeConfig::new())
                .unwrap(),
            "committees"
        );
        assert!(registry.strategy("committees").is_some());
    }

    #[test]
    fn resolution_can_be_overridden() {
        let registry = Registry::default()
            .with_strategy(Committees)
            .resolve_with("people", |_| Ok("committees".to_string()));
        assert_eq!(
            registry.select("people", &ScrapeConfig::new()).unwrap(),
            "committees"
        );
    }
}
