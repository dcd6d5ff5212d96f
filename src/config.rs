use crate::error::ScrapeError;
use itertools::Itertools;
use lazy_regex::regex_find;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const PARLIAMENT: &str = "parliament";

/// Criteria given at invocation time. Read-only for the lifetime of a run;
/// options the selector does not know about are handed to the strategy as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeConfig {
    options: BTreeMap<String, String>,
}

impl ScrapeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from `key value key value ...` criteria.
    /// Returns `None` when a key has no value.
    pub fn from_pairs<I, S>(criteria: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = criteria.into_iter().map(Into::into).collect::<Vec<String>>();
        if items.len() % 2 != 0 {
            return None;
        }
        let options = items.into_iter().tuples().collect();
        Some(ScrapeConfig { options })
    }

    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn parliament(&self) -> Option<&str> {
        self.get(PARLIAMENT).map(str::trim)
    }

    /// The parliament as a number, if one was given. Only the leading digits
    /// count, so ordinals such as `37th` are accepted.
    pub fn parliament_number(&self) -> Result<Option<i64>, ScrapeError> {
        self.parliament()
            .map(|p| {
                regex_find!(r"\A[+-]?\d+", p)
                    .and_then(|digits| digits.parse::<i64>().ok())
                    .ok_or_else(|| ScrapeError::InvalidEra(p.to_string()))
            })
            .transpose()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// What to do when a single row cannot be turned into a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RowPolicy {
    /// Stop the run on the first bad row.
    #[default]
    Abort,
    /// Log the row, count it and carry on.
    Skip,
}

/// Shared stop signal, checked by the runner between rows.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
