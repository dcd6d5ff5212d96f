//! Members of the Parliament of Canada, as published on parl.gc.ca.
//!
//! The site lists members of the 36th Parliament onwards on one ASP.NET page
//! and every earlier parliament on the older Parlinfo lists, so each format
//! gets its own strategy.

pub mod legacy;
pub mod modern;

pub use legacy::PeopleFirstToThirtyFifth;
pub use modern::PeopleThirtySixthToDate;

pub const MODERN: &str = "people_36th_to_date";
pub const LEGACY: &str = "people_1st_to_35th";

/// First parliament published in the modern format.
pub const MODERN_SINCE: i64 = 36;

const HEADER_ROWS: usize = 2;
const NAME_COLUMN: usize = 1;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::error::{FetchCause, FetchError};
    use crate::fetch::{Document, Fetch};
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;
    use url::Url;

    pub fn document(url: &str, file: &str) -> Document {
        let body = fs::read_to_string(format!("tests/htmls/{}", file)).expect("Invalid file path");
        Document::new(Url::parse(url).unwrap(), body)
    }

    /// Serves fixture files by url and records what was asked of it.
    #[derive(Default)]
    pub struct FixtureClient {
        pages: HashMap<String, String>,
        forms: HashMap<String, String>,
        pub log: Mutex<Vec<String>>,
    }

    impl FixtureClient {
        pub fn page(mut self, url: &str, file: &str) -> Self {
            self.pages.insert(url.to_string(), file.to_string());
            self
        }

        pub fn form(mut self, url: &str, file: &str) -> Self {
            self.forms.insert(url.to_string(), file.to_string());
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Fetch for FixtureClient {
        async fn get(&self, url: &str) -> Result<Document, FetchError> {
            self.log.lock().unwrap().push(format!("GET {}", url));
            match self.pages.get(url) {
                Some(file) => Ok(document(url, file)),
                None => Err(FetchError::new(
                    url,
                    FetchCause::Status(reqwest::StatusCode::NOT_FOUND),
                )),
            }
        }

        async fn submit_form(
            &self,
            url: &str,
            fields: &[(&str, &str)],
        ) -> Result<Document, FetchError> {
            let fields = fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            self.log
                .lock()
                .unwrap()
                .push(format!("FORM {} {}", url, fields));
            match self.forms.get(url) {
                Some(file) => Ok(document(url, file)),
                None => Err(FetchError::new(url, FetchCause::NoForm)),
            }
        }
    }
}
