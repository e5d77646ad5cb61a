// src/scrape/mod.rs

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Cells of a data row after footnote filtering.
pub const ROW_WIDTH: usize = 5;

static FOOTNOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-h]?$").expect("footnote regex should compile"));
static ROW_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("selector for table rows should parse"));
static CELL_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("selector for table cells should parse"));

/// One accepted row of the school life expectancy table, as scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedRow {
    pub country: String,
    pub year: String,
    pub total: String,
    pub men: String,
    pub women: String,
}

impl ScrapedRow {
    /// Build a row from exactly [`ROW_WIDTH`] cells, in table order.
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        match cells {
            [country, year, total, men, women] => Some(Self {
                country: country.clone(),
                year: year.clone(),
                total: total.clone(),
                men: men.clone(),
                women: women.clone(),
            }),
            _ => None,
        }
    }
}

/// A selected row whose filtered cell count was not [`ROW_WIDTH`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    /// Position among all `<tr>` elements of the document.
    pub index: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrapeOutcome {
    pub rows: Vec<ScrapedRow>,
    pub anomalies: Vec<Anomaly>,
}

/// Where the data rows live among the document's `<tr>` elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSelection {
    /// Inclusive, 0-indexed positions.
    Range { first: usize, last: usize },
    /// Rows following the first innermost row with a cell containing `marker`.
    AfterMarker {
        marker: String,
        #[serde(default)]
        max_rows: Option<usize>,
    },
}

impl Default for RowSelection {
    fn default() -> Self {
        RowSelection::Range {
            first: 18,
            last: 200,
        }
    }
}

impl RowSelection {
    /// Pick the `(index, row)` pairs this selection covers.
    fn select<'a>(&self, rows: Vec<ElementRef<'a>>) -> Vec<(usize, ElementRef<'a>)> {
        let indexed = rows.into_iter().enumerate();
        match self {
            RowSelection::Range { first, last } => indexed
                .skip(*first)
                .take(last.saturating_add(1).saturating_sub(*first))
                .collect(),
            RowSelection::AfterMarker { marker, max_rows } => {
                let mut after = indexed
                    .skip_while(|(_, row)| !is_marker_row(*row, marker))
                    .peekable();
                if after.peek().is_none() {
                    warn!(%marker, "no table row contains the marker; nothing selected");
                    return Vec::new();
                }
                // drop the marker row itself
                after.next();
                match max_rows {
                    Some(n) => after.take(*n).collect(),
                    None => after.collect(),
                }
            }
        }
    }
}

/// Filtered text of every `<td>` below the row.
fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    filter_cells(row.select(&CELL_SEL).map(|td| td.text().collect::<String>()))
}

/// Innermost rows only: a layout row wrapping the data table never matches.
fn is_marker_row(row: ElementRef<'_>, marker: &str) -> bool {
    let nested = row.select(&ROW_SEL).any(|inner| inner.id() != row.id());
    !nested && row_cells(row).iter().any(|cell| cell.contains(marker))
}

/// True for cells holding a footnote letter (or nothing at all).
pub fn is_footnote(cell: &str) -> bool {
    FOOTNOTE.is_match(cell)
}

/// Trim each cell and drop footnote markers, keeping order.
pub fn filter_cells<I, S>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|c| c.as_ref().trim().to_string())
        .filter(|c| !is_footnote(c))
        .collect()
}

/// Parse the table rows out of an HTML document.
#[instrument(level = "debug", skip(html), fields(html_len = html.len()))]
pub fn parse_document(html: &str, selection: &RowSelection) -> ScrapeOutcome {
    let doc = Html::parse_document(html);
    let rows: Vec<ElementRef<'_>> = doc.select(&ROW_SEL).collect();
    debug!(total_rows = rows.len(), "found table rows");

    let mut outcome = ScrapeOutcome::default();
    for (index, row) in selection.select(rows) {
        let cells = row_cells(row);
        match ScrapedRow::from_cells(&cells) {
            Some(parsed) => outcome.rows.push(parsed),
            None => {
                warn!(index, cells = ?cells, "found a weird one: unexpected cell count");
                outcome.anomalies.push(Anomaly { index, cells });
            }
        }
    }

    debug!(
        accepted = outcome.rows.len(),
        anomalies = outcome.anomalies.len(),
        "finished scraping"
    );
    outcome
}
