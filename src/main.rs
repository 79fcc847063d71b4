// Entry point.
//
// One invocation is one run of the salary comparison flow:
// - scrape the Brazil and São Paulo tables and save them as raw CSV,
// - load and normalize both, compute the six KPIs,
// - write the KPI workbook, then mail the highlights.
// A failed run mails a failure notice and exits non-zero.
mod config;
mod email;
mod error;
mod loader;
mod output;
mod pipeline;
mod reports;
mod scrape;
mod types;
mod util;
mod workbook;

use anyhow::Result;
use config::{Config, CONFIG_ENV};
use email::SmtpMailer;
use pipeline::{Stage, StageFailure};
use scrape::HttpScraper;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from)
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    if dotenv::dotenv().is_err() {
        info!("no .env file; using process environment only");
    }

    let cfg = Config::load(config_path().as_deref())?;
    info!("starting {}", cfg.flow_name);
    let mailer = SmtpMailer::new(cfg.email.clone());

    let outcome = HttpScraper::new(&cfg.scrape)
        .map_err(|error| StageFailure {
            stage: Stage::Setup,
            error,
        })
        .and_then(|scraper| pipeline::run(&cfg, &scraper, &mailer));

    match outcome {
        Ok(summary) => {
            info!(
                "done: BR {} rows, SP {} rows, workbook {}",
                util::format_int(summary.br_rows),
                util::format_int(summary.sp_rows),
                summary.workbook.display()
            );
            Ok(())
        }
        Err(failure) => {
            error!("run aborted at {}", failure.stage);
            pipeline::notify_failure(&cfg, &mailer, &failure);
            Err(failure.into())
        }
    }
}
