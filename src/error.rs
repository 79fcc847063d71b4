use std::path::Path;
use thiserror::Error;

use crate::types::Region;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction failed for {region}: {reason}")]
    Extraction { region: Region, reason: String },

    #[error("Load failed for {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("Dataset {0} is empty")]
    EmptyDataset(Region),

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("Workbook write error: {source}")]
    Persistence {
        #[from]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("Cannot write {path}: {source}")]
    OutputPath {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Workbook read error: {0}")]
    ReadBack(String),

    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

impl From<calamine::XlsxError> for ReportError {
    fn from(err: calamine::XlsxError) -> Self {
        ReportError::ReadBack(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for ReportError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        ReportError::Delivery(err.to_string())
    }
}

impl From<lettre::error::Error> for ReportError {
    fn from(err: lettre::error::Error) -> Self {
        ReportError::Delivery(err.to_string())
    }
}

impl From<lettre::address::AddressError> for ReportError {
    fn from(err: lettre::address::AddressError) -> Self {
        ReportError::Delivery(format!("invalid address: {}", err))
    }
}

impl ReportError {
    /// Wrap an I/O failure on an output file or directory.
    pub fn output_path(path: &Path, source: std::io::Error) -> Self {
        ReportError::OutputPath {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
