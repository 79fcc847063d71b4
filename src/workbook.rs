// Spreadsheet sink: one sheet per KPI on the way out, plain cell grids on the
// way back in for the email.
use crate::error::{ReportError, Result};
use crate::types::{AnalystRow, CategoryMeanRow, DifferenceRow, PjAdvantageRow, TopSalaryRow};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tabled::Tabled;

pub const CURRENCY_FORMAT: &str = "R$ #,##0.00";
pub const PERCENT_FORMAT: &str = "0.00%";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    Currency,
    Percentage,
    Plain,
}

/// Zero-based inclusive column range with a width and number format.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub first: u16,
    pub last: u16,
    pub width: f64,
    pub format: ColumnFormat,
}

impl ColumnSpec {
    pub fn new(first: u16, last: u16, width: f64, format: ColumnFormat) -> Self {
        Self { first, last, width, format }
    }

    fn covers(&self, col: u16) -> bool {
        (self.first..=self.last).contains(&col)
    }
}

pub trait SheetRow {
    fn cells(&self) -> Vec<Cell>;
}

impl SheetRow for TopSalaryRow {
    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.role.clone()),
            Cell::Text(self.specialty.clone()),
            Cell::Number(self.clt),
            Cell::Number(self.pj),
            Cell::Number(self.higher),
        ]
    }
}

impl SheetRow for DifferenceRow {
    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.role.clone()),
            Cell::Text(self.specialty.clone()),
            Cell::Number(self.higher_br),
            Cell::Number(self.higher_sp),
            Cell::Number(self.diff),
        ]
    }
}

impl SheetRow for PjAdvantageRow {
    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.role.clone()),
            Cell::Text(self.specialty.clone()),
            Cell::Number(self.clt),
            Cell::Number(self.pj),
            Cell::Number(self.advantage),
        ]
    }
}

impl SheetRow for AnalystRow {
    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.role.clone()),
            Cell::Text(self.specialty.clone()),
            Cell::Number(self.higher),
        ]
    }
}

impl SheetRow for CategoryMeanRow {
    fn cells(&self) -> Vec<Cell> {
        vec![Cell::Text(self.category.clone()), Cell::Number(self.mean_higher)]
    }
}

/// One KPI ready for the workbook: sheet name, header row, cells, formats.
#[derive(Debug, Clone)]
pub struct KpiTable {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub columns: Vec<ColumnSpec>,
}

impl KpiTable {
    pub fn from_rows<T>(sheet_name: &str, rows: &[T], columns: Vec<ColumnSpec>) -> Self
    where
        T: Tabled + SheetRow,
    {
        Self {
            sheet_name: sheet_name.to_string(),
            headers: T::headers().into_iter().map(|h| h.into_owned()).collect(),
            rows: rows.iter().map(SheetRow::cells).collect(),
            columns,
        }
    }

    pub fn format_of(&self, col: u16) -> ColumnFormat {
        self.columns
            .iter()
            .find(|c| c.covers(col))
            .map(|c| c.format)
            .unwrap_or(ColumnFormat::Plain)
    }
}

pub fn write_workbook(path: &Path, tables: &[KpiTable]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ReportError::output_path(dir, e))?;
    }

    let currency = Format::new().set_num_format(CURRENCY_FORMAT);
    let percent = Format::new().set_num_format(PERCENT_FORMAT);
    let header = Format::new().set_bold();

    let mut workbook = Workbook::new();
    for table in tables {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&table.sheet_name)?;

        for (c, name) in table.headers.iter().enumerate() {
            sheet.write_string_with_format(0, c as u16, name, &header)?;
        }
        for spec in &table.columns {
            for col in spec.first..=spec.last {
                sheet.set_column_width(col, spec.width)?;
            }
        }

        for (r, row) in table.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match (cell, table.format_of(c)) {
                    (Cell::Text(s), _) => {
                        sheet.write_string(r, c, s)?;
                    }
                    (Cell::Number(v), ColumnFormat::Currency) => {
                        sheet.write_number_with_format(r, c, *v, &currency)?;
                    }
                    (Cell::Number(v), ColumnFormat::Percentage) => {
                        sheet.write_number_with_format(r, c, *v, &percent)?;
                    }
                    (Cell::Number(v), ColumnFormat::Plain) => {
                        sheet.write_number(r, c, *v)?;
                    }
                }
            }
        }
    }
    workbook.save(path)?;
    tracing::info!("workbook saved to {} ({} sheets)", path.display(), tables.len());
    Ok(())
}

/// A sheet read back from disk: first row as headers, the rest as raw cells.
#[derive(Debug, Clone)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Data>>,
}

pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<SheetData> {
    if !path.exists() {
        return Err(ReportError::ReadBack(format!(
            "workbook not found: {}",
            path.display()
        )));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(sheet_name)?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    Ok(SheetData {
        headers,
        rows: rows.map(|r| r.to_vec()).collect(),
    })
}
