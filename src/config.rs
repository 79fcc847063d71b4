// Runtime settings. Everything has a default matching the public APInfo pages;
// a JSON file can override any field and the environment overrides addresses.
use crate::error::{ReportError, Result};
use crate::types::Region;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "SALARY_REPORT_CONFIG";
pub const SENDER_ENV: &str = "SALARY_REPORT_SENDER";
pub const RECIPIENT_ENV: &str = "SALARY_REPORT_RECIPIENT";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub flow_name: String,
    pub data_dir: PathBuf,
    pub br_file: String,
    pub sp_file: String,
    pub workbook_file: String,
    pub scrape: ScrapeConfig,
    pub email: EmailConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            flow_name: "Diferenca Salarial em TI entre BR e SP".to_string(),
            data_dir: PathBuf::from("data"),
            br_file: "salarios_ti_brasil.csv".to_string(),
            sp_file: "salarios_ti_sp.csv".to_string(),
            workbook_file: "resultado_kpis.xlsx".to_string(),
            scrape: ScrapeConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScrapeConfig {
    pub br_url: String,
    pub sp_url: String,
    pub table_selector: String,
    pub timeout_secs: u64,
    pub retry_delay_secs: u64,
    /// Initial fetch plus retries.
    pub attempts: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            br_url: "https://www.apinfo2.com/apinfo/informacao/p12sal-br.cfm".to_string(),
            sp_url: "https://www.apinfo2.com/apinfo/informacao/p25sal-sp.cfm".to_string(),
            table_selector: "section center table".to_string(),
            timeout_secs: 20,
            retry_delay_secs: 2,
            attempts: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
    pub recipient: String,
    pub recipient_name: String,
    pub subject: String,
    /// Name of the env var holding the SMTP app password.
    pub password_env: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender: String::new(),
            recipient: String::new(),
            recipient_name: String::new(),
            subject: "Relatório KPIs: Salários TI (SP vs BR)".to_string(),
            password_env: "SENHA_APP".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the JSON file if one is given, then env overrides.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut cfg = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p).map_err(|e| {
                    ReportError::Config(format!("cannot read {}: {}", p.display(), e))
                })?;
                serde_json::from_str(&text)
                    .map_err(|e| ReportError::Config(format!("{}: {}", p.display(), e)))?
            }
            None => Config::default(),
        };
        if let Ok(sender) = std::env::var(SENDER_ENV) {
            cfg.email.sender = sender;
        }
        if let Ok(recipient) = std::env::var(RECIPIENT_ENV) {
            cfg.email.recipient = recipient;
        }
        Ok(cfg)
    }

    pub fn raw_path(&self, region: Region) -> PathBuf {
        let file = match region {
            Region::Br => &self.br_file,
            Region::Sp => &self.sp_file,
        };
        self.data_dir.join(file)
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.data_dir.join(&self.workbook_file)
    }
}
