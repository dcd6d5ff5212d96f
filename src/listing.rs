use crate::error::{RowParseError, RowParseKind};
use crate::fetch::Document;
use crate::Person;
use lazy_static::lazy_static;
use scraper::Selector;
use std::vec;

lazy_static! {
    static ref TD: Selector = Selector::parse("td").expect("Invalid selector");
}

/// Where the people sit in a listing table.
#[derive(Debug, Clone, Copy)]
pub struct TableLayout {
    pub rows: &'static Selector,
    /// Leading rows that hold headings rather than people.
    pub header_rows: usize,
    /// Zero-based cell holding the `Last, First` name.
    pub name_column: usize,
}

impl TableLayout {
    pub fn rows(&self, doc: &Document) -> Rows {
        let html = doc.html();
        let raw = html
            .select(self.rows)
            .enumerate()
            .skip(self.header_rows)
            .map(|(index, row)| RawRow {
                index,
                name: row
                    .select(&TD)
                    .nth(self.name_column)
                    .map(|td| td.text().collect::<String>()),
            })
            .collect::<Vec<_>>();

        Rows {
            inner: raw.into_iter(),
            name_column: self.name_column,
        }
    }
}

#[derive(Debug)]
struct RawRow {
    index: usize,
    name: Option<String>,
}

/// Data rows of a listing, normalized one at a time as the iterator advances.
#[derive(Debug)]
pub struct Rows {
    inner: vec::IntoIter<RawRow>,
    name_column: usize,
}

impl Rows {
    pub fn empty() -> Rows {
        Rows {
            inner: Vec::new().into_iter(),
            name_column: 0,
        }
    }
}

impl Iterator for Rows {
    type Item = Result<Person, RowParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.inner.next()?;
        let person = match raw.name {
            None => Err(RowParseKind::MissingCell(self.name_column)),
            Some(name) => Person::from_raw_name(&name).map_err(RowParseKind::from),
        };
        Some(person.map_err(|kind| RowParseError {
            row: raw.index,
            kind,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Rows {}
