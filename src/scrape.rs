use crate::config::ScrapeConfig;
use crate::error::{ReportError, Result};
use crate::types::{RawRecord, Region};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use std::thread::sleep;
use std::time::Duration;
use tracing::{info, warn};

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Invalid CSS selector for table rows"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Invalid CSS selector for table cells"));

/// Where the raw salary tables come from.
pub trait TableSource {
    fn fetch_table(&self, region: Region) -> Result<Vec<RawRecord>>;
}

pub struct HttpScraper {
    client: Client,
    br_url: String,
    sp_url: String,
    table_selector: Selector,
    attempts: usize,
    retry_delay: Duration,
}

impl HttpScraper {
    pub fn new(cfg: &ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("salary_report/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReportError::Config(format!("http client: {}", e)))?;
        let table_selector = Selector::parse(&cfg.table_selector).map_err(|e| {
            ReportError::Config(format!("table selector {:?}: {:?}", cfg.table_selector, e))
        })?;
        Ok(Self {
            client,
            br_url: cfg.br_url.clone(),
            sp_url: cfg.sp_url.clone(),
            table_selector,
            attempts: cfg.attempts.max(1),
            retry_delay: Duration::from_secs(cfg.retry_delay_secs),
        })
    }

    fn url_for(&self, region: Region) -> &str {
        match region {
            Region::Br => &self.br_url,
            Region::Sp => &self.sp_url,
        }
    }

    fn get_page(&self, url: &str) -> reqwest::Result<String> {
        self.client.get(url).send()?.error_for_status()?.text()
    }
}

impl TableSource for HttpScraper {
    fn fetch_table(&self, region: Region) -> Result<Vec<RawRecord>> {
        let url = self.url_for(region);
        wait_for_table(
            region,
            url,
            &self.table_selector,
            self.attempts,
            self.retry_delay,
            |u| self.get_page(u),
        )
    }
}

/// Fetch `url` until the target table shows up, giving up after `attempts`
/// tries. A table with a header and no data rows fails at once.
pub fn wait_for_table<F, E>(
    region: Region,
    url: &str,
    table: &Selector,
    attempts: usize,
    retry_delay: Duration,
    mut get_page: F,
) -> Result<Vec<RawRecord>>
where
    F: FnMut(&str) -> std::result::Result<String, E>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut last_problem = String::from("no attempt made");

    for attempt in 1..=attempts {
        info!(%region, attempt, "fetching {}", url);
        match get_page(url) {
            Ok(html) => match parse_salary_table(&html, table) {
                Some(rows) if rows.is_empty() => {
                    return Err(ReportError::Extraction {
                        region,
                        reason: format!("table at {} has no data rows", url),
                    });
                }
                Some(rows) => {
                    info!(%region, "{} rows extracted", rows.len());
                    return Ok(rows);
                }
                None => {
                    last_problem = "target table not present".to_string();
                }
            },
            Err(e) => last_problem = e.to_string(),
        }
        warn!(%region, attempt, "{}", last_problem);
        if attempt < attempts {
            sleep(retry_delay);
        }
    }

    Err(ReportError::Extraction {
        region,
        reason: format!("{} after {} attempts ({})", last_problem, attempts, url),
    })
}

/// Pull `(role, specialty, CLT, PJ)` rows out of the first table matching
/// `table`. The first `<tr>` is the header row. `None` when no table matches.
pub fn parse_salary_table(html: &str, table: &Selector) -> Option<Vec<RawRecord>> {
    let doc = Html::parse_document(html);
    let table = doc.select(table).next()?;

    let rows = table
        .select(&ROW_SELECTOR)
        .skip(1)
        .filter_map(|tr| {
            let cells: Vec<String> = tr.select(&CELL_SELECTOR).map(cell_text).collect();
            if cells.len() < 4 {
                return None;
            }
            Some(RawRecord::new(&cells[0], &cells[1], &cells[2], &cells[3]))
        })
        .collect();
    Some(rows)
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}
