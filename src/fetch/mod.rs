mod form;

pub use form::{Form, Method};

use crate::error::{FetchCause, FetchError};
use reqwest::{Client, RequestBuilder};
use scraper::Html;
use std::time::Duration;
use tracing::{
    debug, debug_span, error_span, info_span, trace_span, warn, warn_span, Instrument, Level,
    Span,
};
use url::Url;

/// A fetched page. Parsing is done on demand so the handle stays `Send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: Url,
    pub body: String,
}

impl Document {
    pub fn new(url: Url, body: String) -> Self {
        Document { url, body }
    }

    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    /// Stateless retrieval of `url`.
    async fn get(&self, url: &str) -> Result<Document, FetchError>;

    /// Navigates to `url`, fills its form with `fields` and submits it,
    /// keeping cookies between the two requests.
    async fn submit_form(&self, url: &str, fields: &[(&str, &str)])
        -> Result<Document, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Extra attempts after a transport error or a 5xx answer.
    pub retries: u32,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: Duration::from_secs(30),
            retries: 0,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

pub struct HttpClient {
    stateless: Client,
    session: Client,
    retries: u32,
    span: Span,
}

impl HttpClient {
    /// `channel` names the log span every request of this client runs in,
    /// and `level` is the severity that span is recorded at.
    pub fn new(
        channel: &str,
        level: Level,
        config: FetchConfig,
    ) -> Result<HttpClient, reqwest::Error> {
        let stateless = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        let session = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .build()?;

        Ok(HttpClient {
            stateless,
            session,
            retries: config.retries,
            span: channel_span(channel, level),
        })
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    async fn send<F>(&self, url: &Url, request: F) -> Result<Document, FetchError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            match send_once(url, request()).await {
                Err(e) if attempt < self.retries && is_retryable(&e.cause) => {
                    attempt += 1;
                    warn!("Retry {}/{} for {}: {}", attempt, self.retries, url, e.cause);
                }
                result => return result,
            }
        }
    }
}

async fn send_once(url: &Url, request: RequestBuilder) -> Result<Document, FetchError> {
    debug!("Visit {}", url);
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::new(url.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::new(url.as_str(), FetchCause::Status(status)));
    }

    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::new(url.as_str(), e))?;
    Ok(Document::new(final_url, body))
}

// Span levels are part of the callsite, so each one needs its own macro.
fn channel_span(channel: &str, level: Level) -> Span {
    if level == Level::ERROR {
        error_span!("fetch", channel = channel)
    } else if level == Level::WARN {
        warn_span!("fetch", channel = channel)
    } else if level == Level::INFO {
        info_span!("fetch", channel = channel)
    } else if level == Level::DEBUG {
        debug_span!("fetch", channel = channel)
    } else {
        trace_span!("fetch", channel = channel)
    }
}

fn is_retryable(cause: &FetchCause) -> bool {
    match cause {
        FetchCause::Transport(_) => true,
        FetchCause::Status(status) => status.is_server_error(),
        FetchCause::InvalidUrl(_) | FetchCause::NoForm => false,
    }
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::new(url, e))
}

#[async_trait::async_trait]
impl Fetch for HttpClient {
    async fn get(&self, url: &str) -> Result<Document, FetchError> {
        async {
            let url = parse_url(url)?;
            self.send(&url, || self.stateless.get(url.clone())).await
        }
        .instrument(self.span.clone())
        .await
    }

    async fn submit_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<Document, FetchError> {
        async {
            let page_url = parse_url(url)?;
            let page = self
                .send(&page_url, || self.session.get(page_url.clone()))
                .await?;

            let mut form = {
                let html = page.html();
                Form::first(&html, &page.url)
                    .ok_or_else(|| FetchError::new(url, FetchCause::NoForm))?
                    .map_err(|e| FetchError::new(url, e))?
            };
            for (name, value) in fields {
                form.set(name, value);
            }
            debug!("Submit form to {} ({:?})", form.action, form.method);

            match form.method {
                Method::Get => {
                    let mut action = form.action.clone();
                    action.set_query(None);
                    action.query_pairs_mut().extend_pairs(&form.fields);
                    self.send(&action, || self.session.get(action.clone()))
                        .await
                }
                Method::Post => {
                    self.send(&form.action, || {
                        self.session.post(form.action.clone()).form(&form.fields)
                    })
                    .await
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }
}
