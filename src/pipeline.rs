// Run orchestration: extract both regions, load, compute, persist, mail.
// Any stage error stops the run; the caller decides how to report it.
use crate::config::Config;
use crate::email::{self, Mailer};
use crate::error::{ReportError, Result};
use crate::loader::{load_dataset, LoadReport};
use crate::output::{preview_table, write_raw_csv};
use crate::reports::{self, KpiResults};
use crate::scrape::TableSource;
use crate::types::{Dataset, Region};
use crate::workbook::write_workbook;
use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    ExtractBr,
    ExtractSp,
    Load,
    Kpis,
    SaveWorkbook,
    SendEmail,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Setup => "Configuração",
            Stage::ExtractBr => "Extrair Dados Brasil",
            Stage::ExtractSp => "Extrair Dados SP",
            Stage::Load => "Carregar e Tratar Dados",
            Stage::Kpis => "Medir KPIs",
            Stage::SaveWorkbook => "Salvar Excel",
            Stage::SendEmail => "Enviar Email",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: ReportError,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub br_rows: usize,
    pub sp_rows: usize,
    pub workbook: PathBuf,
}

fn in_stage<T>(stage: Stage, f: impl FnOnce() -> Result<T>) -> std::result::Result<T, StageFailure> {
    info!("stage started: {}", stage);
    f().map_err(|error| {
        error!("stage failed: {}: {}", stage, error);
        StageFailure { stage, error }
    })
}

fn extract(cfg: &Config, source: &dyn TableSource, region: Region) -> Result<PathBuf> {
    let rows = source.fetch_table(region)?;
    if rows.is_empty() {
        return Err(ReportError::Extraction {
            region,
            reason: "no rows extracted".to_string(),
        });
    }
    let path = cfg.raw_path(region);
    write_raw_csv(&path, &rows)?;
    info!(%region, "{} rows saved to {}", rows.len(), path.display());
    Ok(path)
}

fn load(region: Region, path: &Path) -> Result<Dataset> {
    let (dataset, report) = load_dataset(region, path)?;
    log_load_report(region, &report);
    Ok(dataset)
}

fn log_load_report(region: Region, report: &LoadReport) {
    info!(
        %region,
        "{} of {} rows loaded ({:?})",
        report.loaded_rows,
        report.total_rows,
        report.encoding
    );
    if report.dropped_rows > 0 {
        warn!(%region, "{} malformed rows dropped", report.dropped_rows);
    }
    if report.blank_specialties > 0 {
        info!(%region, "{} blank specialties set to \"-\"", report.blank_specialties);
    }
    if report.zeroed_values > 0 {
        warn!(%region, "{} salary cells normalized to zero", report.zeroed_values);
    }
}

fn preview(kpis: &KpiResults) {
    preview_table(reports::SHEET_TOP_BR, &kpis.top_br);
    preview_table(reports::SHEET_TOP_SP, &kpis.top_sp);
    preview_table(reports::SHEET_DIFFERENCE, &kpis.differences);
    preview_table(reports::SHEET_PJ_ADVANTAGE, &kpis.pj_advantage);
    preview_table(reports::SHEET_ANALYSTS, &kpis.analysts);
    preview_table(reports::SHEET_CATEGORIES, &kpis.categories);
}

/// One full run. Nothing is mailed unless every earlier stage succeeded.
pub fn run(
    cfg: &Config,
    source: &dyn TableSource,
    mailer: &dyn Mailer,
) -> std::result::Result<RunSummary, StageFailure> {
    let br_path = in_stage(Stage::ExtractBr, || extract(cfg, source, Region::Br))?;
    let sp_path = in_stage(Stage::ExtractSp, || extract(cfg, source, Region::Sp))?;

    let (br, sp) = in_stage(Stage::Load, || {
        Ok((load(Region::Br, &br_path)?, load(Region::Sp, &sp_path)?))
    })?;

    let kpis = in_stage(Stage::Kpis, || reports::compute_all(&br, &sp))?;
    preview(&kpis);

    let workbook = cfg.workbook_path();
    in_stage(Stage::SaveWorkbook, || write_workbook(&workbook, &kpis.to_tables()))?;

    in_stage(Stage::SendEmail, || {
        let tables = email::prepare_email_tables(&workbook)?;
        let html = email::render_report_html(&tables, &cfg.email.recipient_name, Local::now());
        mailer.send_html(&cfg.email.subject, &html)
    })?;

    info!("{} finished", cfg.flow_name);
    Ok(RunSummary {
        br_rows: br.len(),
        sp_rows: sp.len(),
        workbook,
    })
}

/// Mail the failing stage and error text. A notification that cannot be sent
/// is logged and otherwise ignored.
pub fn notify_failure(cfg: &Config, mailer: &dyn Mailer, failure: &StageFailure) {
    let html = email::render_failure_html(
        &cfg.flow_name,
        failure.stage.label(),
        &failure.error.to_string(),
    );
    match mailer.send_html(&email::failure_subject(&cfg.flow_name), &html) {
        Ok(()) => info!("failure notification sent"),
        Err(e) => error!("failure notification could not be sent: {}", e),
    }
}
