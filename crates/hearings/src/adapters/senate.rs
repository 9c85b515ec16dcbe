use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{Adapted, AdapterError, RawRecord};
use crate::dates::{resolve_date, to_iso_timestamp};
use crate::text::{canonicalize_clock, cell_to_lines, normalize};
use crate::types::{CanonicalRecord, Chamber};

pub const SOURCE_LABEL: &str = "senate-table";

static RE_NO_HEARING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bno\s+(?:committee\s+)?(?:hearings?|meetings?)\b")
        .expect("invalid regex: no hearing sentinel")
});

/// One data row of a day block, with its block's date already resolved.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub date: String,
    pub committee_html: String,
    pub time_venue_html: String,
    pub agenda_html: String,
    pub remarks_html: Option<String>,
}

/// Adapts the Senate's weekly schedule page.
///
/// Every `<table>` is a candidate day block: first row the date label, second
/// row the column headers, the rest data rows of committee, time and venue,
/// and agenda. A block whose label does not resolve contributes nothing.
pub fn adapt(html: &str, fallback_year: Option<i32>) -> Result<Adapted, AdapterError> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();

    let tables: Vec<ElementRef> = document.select(&table_selector).collect();
    if tables.is_empty() {
        return Err(AdapterError::Structure(
            "no schedule tables found in Senate page".to_string(),
        ));
    }

    let mut rows = Vec::new();
    let mut skipped = 0;

    for table in tables {
        let table_rows = direct_rows(table);
        if table_rows.len() < 3 {
            continue;
        }

        let label = normalize(&table_rows[0].text().collect::<String>());
        let Some(date) = resolve_date(&label, fallback_year) else {
            log::debug!("Skipping table with unresolvable date label {:?}", label);
            continue;
        };

        for row in &table_rows[2..] {
            let cells = row_cells(*row);
            let Some(first) = cells.first() else {
                continue;
            };
            if RE_NO_HEARING.is_match(&normalize(&first.text().collect::<String>())) {
                continue;
            }
            if cells.len() < 3 {
                skipped += 1;
                continue;
            }

            rows.push(RawRecord::Table(TableRow {
                date: date.clone(),
                committee_html: cells[0].inner_html(),
                time_venue_html: cells[1].inner_html(),
                agenda_html: cells[2].inner_html(),
                remarks_html: cells.get(3).map(|c| c.inner_html()),
            }));
        }
    }

    let mut adapted = Adapted::collect(rows, fallback_year);
    adapted.report.dropped += skipped;

    log::info!(
        "Senate table: kept {} row(s), dropped {}",
        adapted.report.kept,
        adapted.report.dropped
    );
    Ok(adapted)
}

/// Builds a record only when date, time and committee are all present.
pub(crate) fn adapt_row(row: TableRow) -> Option<CanonicalRecord> {
    let (committee, committee_cancelled) =
        super::take_cancelled_marker(&cell_to_lines(&row.committee_html).join(" "));

    let mut time_venue = cell_to_lines(&row.time_venue_html).into_iter();
    let (time_line, time_cancelled) =
        super::take_cancelled_marker(&canonicalize_clock(&time_venue.next().unwrap_or_default()));
    let (time, onwards) = super::split_onwards(&time_line);
    let venue = time_venue.collect::<Vec<_>>().join(", ");

    if committee.is_empty() || time.is_empty() {
        log::debug!(
            "Dropping Senate row on {}: committee {:?}, time {:?}",
            row.date,
            committee,
            time
        );
        return None;
    }

    let remarks = row
        .remarks_html
        .as_deref()
        .map(|html| cell_to_lines(html).join("; "))
        .unwrap_or_default();

    let mut record = CanonicalRecord::new(Chamber::Senate, SOURCE_LABEL);
    record.id = format!(
        "senate-{}",
        super::slugify(&format!("{} {} {}", row.date, time, committee))
    );
    record.status = super::compose_status(committee_cancelled || time_cancelled, "", &remarks);
    record.iso_date = to_iso_timestamp(&row.date, &time).unwrap_or_default();
    record.agenda = cell_to_lines(&row.agenda_html).join("; ");
    record.committee = committee;
    record.date = row.date;
    record.time = time;
    record.venue = venue;
    if onwards {
        record.notes = super::ONWARDS_NOTE.to_string();
    }
    Some(record)
}

/// Rows that belong to this table, not to tables nested inside its cells.
fn direct_rows(table: ElementRef) -> Vec<ElementRef> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn row_cells(row: ElementRef) -> Vec<ElementRef> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .collect()
}
