use crate::error::{ReportError, Result};
use crate::types::RawRecord;
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Persist a scraped table as `;` delimited UTF-8 with a BOM, header
/// `Cargo;Especialidade;CLT;PJ`.
pub fn write_raw_csv(path: &Path, rows: &[RawRecord]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ReportError::output_path(dir, e))?;
    }
    let mut file = std::fs::File::create(path).map_err(|e| ReportError::output_path(path, e))?;
    file.write_all("\u{feff}".as_bytes())
        .map_err(|e| ReportError::output_path(path, e))?;
    let mut wtr = WriterBuilder::new().delimiter(b';').from_writer(file);
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|e| ReportError::output_path(path, e))?;
    Ok(())
}

pub fn preview_table<T>(title: &str, rows: &[T])
where
    T: Tabled,
{
    println!("\n{}\n", title);
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(rows).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_dataset;
    use crate::types::Region;
    use tempfile::tempdir;

    #[test]
    fn raw_csv_round_trips_through_loader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw").join("br.csv");
        let rows = vec![
            RawRecord::new("Dev Jr", "", "3.000,00", "4.000,00"),
            RawRecord::new("Analista; de sistemas", "Java", "R$ 8.000,00", "9.500,00"),
        ];
        write_raw_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("\u{feff}Cargo;Especialidade;CLT;PJ\n"));

        let (ds, _) = load_dataset(Region::Br, &path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].specialty, "-");
        assert_eq!(ds.records[1].role, "Analista; de sistemas");
        assert_eq!(ds.records[1].higher, 9500.0);
    }

    #[test]
    fn raw_file_over_a_directory_is_a_persistence_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("br.csv");
        std::fs::create_dir(&path).unwrap();

        let err = write_raw_csv(&path, &[RawRecord::new("DBA", "-", "1,00", "2,00")]).unwrap_err();
        assert!(matches!(err, ReportError::OutputPath { .. }));
    }
}
