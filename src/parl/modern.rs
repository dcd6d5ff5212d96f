use super::{HEADER_ROWS, MODERN, NAME_COLUMN};
use crate::fetch::{Document, Fetch};
use crate::listing::TableLayout;
use crate::{Rows, ScrapeConfig, ScrapeError, Strategy};
use lazy_static::lazy_static;
use scraper::Selector;
use tracing::debug;

pub const LIST_URL: &str =
    "http://www.parl.gc.ca/MembersOfParliament/MainMPsCompleteList.aspx?TimePeriod=Historical&Language=E";

pub const PARLIAMENT_FIELD: &str = "MasterPage$MasterPage$BodyContent$PageContent$Content$ListCriteriaContent$ListCriteriaContent$ucComboParliament$cboParliaments";

const E: &str = "Invalid selector";
lazy_static! {
    static ref ROWS: Selector = Selector::parse(
        "#MasterPage_MasterPage_BodyContent_PageContent_Content_ListContent_ListContent_grdCompleteList tr"
    )
    .expect(E);
}

/// Members of the 36th Parliament to date, from the complete list of MPs.
#[derive(Debug, Default)]
pub struct PeopleThirtySixthToDate;

#[async_trait::async_trait]
impl Strategy for PeopleThirtySixthToDate {
    fn id(&self) -> &'static str {
        MODERN
    }

    async fn fetch(
        &self,
        client: &dyn Fetch,
        config: &ScrapeConfig,
    ) -> Result<Document, ScrapeError> {
        let doc = match config.parliament() {
            Some(parliament) => {
                debug!("Select parliament {} on {}", parliament, LIST_URL);
                client
                    .submit_form(LIST_URL, &[(PARLIAMENT_FIELD, parliament)])
                    .await?
            }
            None => client.get(LIST_URL).await?,
        };
        Ok(doc)
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
