use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

use crate::util::{display_currency, display_percentage};

/// One scraped row, exactly as it appears in the raw `;` delimited file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(rename = "Cargo")]
    pub role: String,
    #[serde(rename = "Especialidade", default)]
    pub specialty: Option<String>,
    #[serde(rename = "CLT")]
    pub clt: String,
    #[serde(rename = "PJ")]
    pub pj: String,
}

impl RawRecord {
    pub fn new(role: &str, specialty: &str, clt: &str, pj: &str) -> Self {
        Self {
            role: role.to_string(),
            specialty: Some(specialty.to_string()),
            clt: clt.to_string(),
            pj: pj.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryRecord {
    pub role: String,
    pub specialty: String,
    pub clt: f64,
    pub pj: f64,
    pub higher: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Br,
    Sp,
}

impl Region {
    pub fn code(self) -> &'static str {
        match self {
            Region::Br => "BR",
            Region::Sp => "SP",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Normalized rows of one region, in scrape order. Never mutated after loading.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub region: Region,
    pub records: Vec<SalaryRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Role grouping used by the management-vs-technical KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Management,
    Technical,
    Other,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Management, Category::Technical, Category::Other];

    pub fn label(self) -> &'static str {
        match self {
            Category::Management => "Gestão/Liderança",
            Category::Technical => "Técnico/Operacional",
            Category::Other => "Outros",
        }
    }
}

#[derive(Debug, Tabled, Clone, PartialEq)]
pub struct TopSalaryRow {
    #[tabled(rename = "Cargo")]
    pub role: String,
    #[tabled(rename = "Especialidade")]
    pub specialty: String,
    #[tabled(rename = "CLT", display_with = "display_currency")]
    pub clt: f64,
    #[tabled(rename = "PJ", display_with = "display_currency")]
    pub pj: f64,
    #[tabled(rename = "Maior_Salario", display_with = "display_currency")]
    pub higher: f64,
}

#[derive(Debug, Tabled, Clone, PartialEq)]
pub struct DifferenceRow {
    #[tabled(rename = "Cargo")]
    pub role: String,
    #[tabled(rename = "Especialidade")]
    pub specialty: String,
    #[tabled(rename = "Maior_Salario_BR", display_with = "display_currency")]
    pub higher_br: f64,
    #[tabled(rename = "Maior_Salario_SP", display_with = "display_currency")]
    pub higher_sp: f64,
    #[tabled(rename = "Diferenca_Absoluta", display_with = "display_currency")]
    pub diff: f64,
}

#[derive(Debug, Tabled, Clone, PartialEq)]
pub struct PjAdvantageRow {
    #[tabled(rename = "Cargo")]
    pub role: String,
    #[tabled(rename = "Especialidade")]
    pub specialty: String,
    #[tabled(rename = "CLT", display_with = "display_currency")]
    pub clt: f64,
    #[tabled(rename = "PJ", display_with = "display_currency")]
    pub pj: f64,
    /// Fraction, e.g. `0.25` for a 25% PJ premium.
    #[tabled(rename = "Vantagem_PJ_Perc", display_with = "display_percentage")]
    pub advantage: f64,
}

#[derive(Debug, Tabled, Clone, PartialEq)]
pub struct AnalystRow {
    #[tabled(rename = "Cargo")]
    pub role: String,
    #[tabled(rename = "Especialidade")]
    pub specialty: String,
    #[tabled(rename = "Maior_Salario", display_with = "display_currency")]
    pub higher: f64,
}

#[derive(Debug, Tabled, Clone, PartialEq)]
pub struct CategoryMeanRow {
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[tabled(rename = "Maior_Salario", display_with = "display_currency")]
    pub mean_higher: f64,
}
