use super::{HEADER_ROWS, LEGACY, NAME_COLUMN};
use crate::fetch::{Document, Fetch};
use crate::listing::TableLayout;
use crate::{Rows, ScrapeConfig, ScrapeError, Strategy};
use lazy_static::lazy_static;
use scraper::Selector;
use tracing::debug;
use url::form_urlencoded::byte_serialize;

pub const SELECTION_URL: &str = "http://www.parl.gc.ca/Parlinfo/Lists/Members.aspx?Language=E";

const LISTING_URL: &str = "http://www.parl.gc.ca/Parlinfo/Lists/Members.aspx?Language=E&Parliament={}&Riding=&Name=&Party=&Province=&Gender=&New=False&Current=False&First=False&Picture=False&Section=False&ElectionDate=";

const E: &str = "Invalid selector";
lazy_static! {
    static ref PARLIAMENTS: Selector =
        Selector::parse("select#ctl00_cphContent_cboParliamentCriteria option").expect(E);
    static ref ROWS: Selector = Selector::parse("tr").expect(E);
}

/// Members of the 1st to 35th Parliaments, from the Parlinfo lists.
#[derive(Debug, Default)]
pub struct PeopleFirstToThirtyFifth;

/// Value of the first parliament option whose label starts with `parliament`.
///
/// Labels sharing a prefix (`1` and `10`) resolve to whichever comes first in
/// the page.
pub fn parliament_token(doc: &Document, parliament: &str) -> Option<String> {
    let html = doc.html();
    let token = html
        .select(&PARLIAMENTS)
        .filter(|option| {
            option
                .text()
                .collect::<String>()
                .trim_start()
                .starts_with(parliament)
        })
        .find_map(|option| option.value().attr("value").map(ToString::to_string));
    token
}

pub fn listing_url(token: &str) -> String {
    let token = byte_serialize(token.as_bytes()).collect::<String>();
    LISTING_URL.replacen("{}", &token, 1)
}

#[async_trait::async_trait]
impl Strategy for PeopleFirstToThirtyFifth {
    fn id(&self) -> &'static str {
        LEGACY
    }

    async fn fetch(
        &self,
        client: &dyn Fetch,
        config: &ScrapeConfig,
    ) -> Result<Document, ScrapeError> {
        let parliament = config.parliament().ok_or(ScrapeError::MissingEra)?;

        let selection = client.get(SELECTION_URL).await?;
        let token = parliament_token(&selection, parliament).ok_or_else(|| {
            ScrapeError::EraNotListed {
                era: parliament.to_string(),
                url: SELECTION_URL.to_string(),
            }
        })?;
        debug!("Parliament {} is listed as {}", parliament, token);

        Ok(client.get(&listing_url(&token)).await?)
    }

    fn extract(&self, doc: &Document) -> Rows {
        TableLayout {
            rows: &ROWS,
            header_rows: HEADER_ROWS,
            name_column: NAME_COLUMN,
        }
        .rows(doc)
    }
}
