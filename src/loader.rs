use crate::error::{ReportError, Result};
use crate::types::{Dataset, RawRecord, Region, SalaryRecord};
use crate::util::parse_brl;
use csv::ReaderBuilder;
use std::path::Path;

pub const BLANK_SPECIALTY: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub dropped_rows: usize,
    pub blank_specialties: usize,
    pub zeroed_values: usize,
    pub encoding: SourceEncoding,
}

/// Read a raw `;` delimited salary file and normalize it.
///
/// Rows that are structurally broken are dropped. An empty result is an error:
/// nothing downstream may run on a missing region.
pub fn load_dataset(region: Region, path: &Path) -> Result<(Dataset, LoadReport)> {
    let bytes = std::fs::read(path).map_err(|e| ReportError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let (text, encoding) = decode(bytes);

    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut total_rows = 0usize;
    let mut dropped_rows = 0usize;
    let mut raw: Vec<RawRecord> = Vec::new();
    for result in rdr.deserialize::<RawRecord>() {
        total_rows += 1;
        match result {
            Ok(r) => raw.push(r),
            Err(e) => {
                tracing::debug!(%region, "dropping row {}: {}", total_rows, e);
                dropped_rows += 1;
            }
        }
    }

    let (dataset, mut report) = load_records(region, raw)?;
    report.total_rows = total_rows;
    report.dropped_rows = dropped_rows;
    report.encoding = encoding;
    Ok((dataset, report))
}

/// Normalize rows already held in memory (e.g. straight from the scraper).
pub fn load_records(region: Region, rows: Vec<RawRecord>) -> Result<(Dataset, LoadReport)> {
    let total_rows = rows.len();
    let mut blank_specialties = 0usize;
    let mut zeroed_values = 0usize;

    let records: Vec<SalaryRecord> = rows
        .into_iter()
        .map(|row| {
            let specialty = match row.specialty.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => {
                    blank_specialties += 1;
                    BLANK_SPECIALTY.to_string()
                }
            };
            let clt = parse_brl(&row.clt);
            let pj = parse_brl(&row.pj);
            zeroed_values += [clt, pj].iter().filter(|v| **v == 0.0).count();
            SalaryRecord {
                role: row.role.trim().to_string(),
                specialty,
                clt,
                pj,
                higher: clt.max(pj),
            }
        })
        .collect();

    if records.is_empty() {
        return Err(ReportError::EmptyDataset(region));
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: records.len(),
        dropped_rows: 0,
        blank_specialties,
        zeroed_values,
        encoding: SourceEncoding::Utf8,
    };
    Ok((Dataset { region, records }, report))
}

/// UTF-8 first, Latin-1 when the bytes are not valid UTF-8. A leading BOM is
/// removed so it never ends up glued to the first header name.
fn decode(bytes: Vec<u8>) -> (String, SourceEncoding) {
    let (mut text, encoding) = match String::from_utf8(bytes) {
        Ok(s) => (s, SourceEncoding::Utf8),
        // Every byte is a valid Latin-1 code point.
        Err(e) => (
            e.into_bytes().iter().map(|&b| b as char).collect(),
            SourceEncoding::Latin1,
        ),
    };
    if text.starts_with('\u{feff}') {
        text.replace_range(..'\u{feff}'.len_utf8(), "");
    }
    (text, encoding)
}
