use crate::error::LoadError;
use crate::types::{HierarchyId, RawRow, Row};
use crate::util::{parse_f64_safe, parse_lots_safe};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    /// Rows where at least one hierarchy id was blank and became `Unknown`.
    pub unknown_ids: usize,
}

pub fn load_rows(path: impl AsRef<Path>) -> Result<(Vec<Row>, LoadReport), LoadError> {
    let path = path.as_ref();
    let rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let (rows, report) = read_rows(rdr)?;
    info!(
        path = %path.display(),
        loaded = report.loaded_rows,
        skipped = report.parse_errors,
        "loaded sales rows"
    );
    Ok((rows, report))
}

pub fn load_rows_from_reader<R: Read>(reader: R) -> Result<(Vec<Row>, LoadReport), LoadError> {
    read_rows(ReaderBuilder::new().flexible(true).from_reader(reader))
}

fn read_rows<R: Read>(mut rdr: csv::Reader<R>) -> Result<(Vec<Row>, LoadReport), LoadError> {
    // Headers are required; a malformed header row is a hard error.
    let has_lots_column = rdr
        .headers()?
        .iter()
        .any(|h| matches!(h.trim(), "Lots" | "lots"));

    let mut report = LoadReport::default();
    let mut rows: Vec<Row> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let raw = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(line = report.total_rows, error = %e, "skipping unreadable row");
                report.parse_errors += 1;
                continue;
            }
        };

        // Item-level exports have no lot column: each line is one lot.
        let lots = if has_lots_column {
            match parse_lots_safe(raw.lots.as_deref()) {
                Some(n) => n,
                None => {
                    report.parse_errors += 1;
                    continue;
                }
            }
        } else {
            1
        };
        let revenue = match parse_f64_safe(raw.revenue.as_deref()) {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                report.parse_errors += 1;
                continue;
            }
        };

        let region = HierarchyId::normalize(raw.region.as_deref().unwrap_or(""));
        let district = HierarchyId::normalize(raw.district.as_deref().unwrap_or(""));
        let territory = HierarchyId::normalize(raw.territory.as_deref().unwrap_or(""));
        if region.is_unknown() || district.is_unknown() || territory.is_unknown() {
            report.unknown_ids += 1;
        }

        rows.push(Row {
            region,
            district,
            territory,
            lots,
            revenue,
        });
    }

    report.loaded_rows = rows.len();
    Ok((rows, report))
}
