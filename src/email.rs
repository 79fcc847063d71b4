use crate::config::EmailConfig;
use crate::error::{ReportError, Result};
use crate::reports::{SHEET_DIFFERENCE, SHEET_PJ_ADVANTAGE, SHEET_TOP_SP};
use crate::util::{format_currency, format_percentage};
use crate::workbook::{read_sheet, SheetData};
use calamine::Data;
use chrono::{DateTime, Local};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::path::Path;
use tracing::info;

const MONEY_COLUMNS: [&str; 6] = [
    "CLT",
    "PJ",
    "Maior_Salario",
    "Maior_Salario_BR",
    "Maior_Salario_SP",
    "Diferenca_Absoluta",
];
const PERCENT_COLUMNS: [&str; 1] = ["Vantagem_PJ_Perc"];
const HEADER_LABELS: [(&str, &str); 4] = [
    ("Maior_Salario_BR", "Salário BR"),
    ("Maior_Salario_SP", "Salário SP"),
    ("Diferenca_Absoluta", "Diferença"),
    ("Vantagem_PJ_Perc", "Vantagem (%)"),
];

/// A sheet turned into display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct EmailTables {
    pub top_sp: DisplayTable,
    pub differences: DisplayTable,
    pub pj_advantage: DisplayTable,
}

/// Re-read the persisted workbook and format the three sheets that go out by
/// email.
pub fn prepare_email_tables(workbook: &Path) -> Result<EmailTables> {
    info!("reading {} for the email body", workbook.display());
    Ok(EmailTables {
        top_sp: to_display(read_sheet(workbook, SHEET_TOP_SP)?),
        differences: to_display(read_sheet(workbook, SHEET_DIFFERENCE)?),
        pj_advantage: to_display(read_sheet(workbook, SHEET_PJ_ADVANTAGE)?),
    })
}

pub fn to_display(sheet: SheetData) -> DisplayTable {
    let kinds: Vec<&str> = sheet.headers.iter().map(String::as_str).collect();
    let rows = sheet
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| match kinds.get(i) {
                    Some(h) if MONEY_COLUMNS.contains(h) => display_money(cell),
                    Some(h) if PERCENT_COLUMNS.contains(h) => display_percent(cell),
                    _ => display_plain(cell),
                })
                .collect()
        })
        .collect();
    let headers = sheet
        .headers
        .iter()
        .map(|h| {
            HEADER_LABELS
                .iter()
                .find(|(from, _)| *from == h.as_str())
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| h.clone())
        })
        .collect();
    DisplayTable { headers, rows }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn display_money(cell: &Data) -> String {
    cell_number(cell).map(format_currency).unwrap_or_else(|| display_plain(cell))
}

fn display_percent(cell: &Data) -> String {
    cell_number(cell).map(format_percentage).unwrap_or_else(|| display_plain(cell))
}

fn display_plain(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_table(table: &DisplayTable) -> String {
    let mut html = String::from("<table border=\"0\" class=\"dataframe\">\n  <thead>\n    <tr>");
    for h in &table.headers {
        html.push_str(&format!("<th>{}</th>", escape_html(h)));
    }
    html.push_str("</tr>\n  </thead>\n  <tbody>\n");
    for row in &table.rows {
        html.push_str("    <tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("  </tbody>\n</table>");
    html
}

const STYLE: &str = r#"<style>
    body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; color: #333; background-color: #f4f4f4; }
    .container { width: 90%; margin: 20px auto; background-color: #fff; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
    h1 { color: #2c3e50; text-align: center; border-bottom: 2px solid #3498db; padding-bottom: 15px; }
    h2 { color: #16a085; margin-top: 30px; font-size: 18px; }
    p { font-size: 14px; color: #555; line-height: 1.5; }
    table { width: 100%; border-collapse: collapse; margin-top: 10px; background-color: #fff; }
    th { background-color: #007acc; color: #ffffff; padding: 12px; text-transform: uppercase; font-size: 12px; border: 1px solid #005f99; }
    td { padding: 10px; border: 1px solid #ddd; font-size: 13px; color: #444; }
    th, td { text-align: center; vertical-align: middle; }
    tr:nth-child(even) { background-color: #f9f9f9; }
    tr:hover { background-color: #eef7ff; }
    .footer { text-align: center; margin-top: 40px; font-size: 12px; color: #999; }
</style>"#;

pub fn render_report_html(
    tables: &EmailTables,
    recipient_name: &str,
    generated_at: DateTime<Local>,
) -> String {
    let greeting = if recipient_name.trim().is_empty() {
        "Olá,".to_string()
    } else {
        format!("Olá, {}.", escape_html(recipient_name.trim()))
    };
    format!(
        r#"<html>
<head>{style}</head>
<body>
  <div class="container">
    <h1>Relatório Executivo: Salários TI</h1>
    <p>{greeting}</p>
    <p>O processo de ETL foi concluído. Seguem os destaques estratégicos do mercado:</p>

    <h2>Top 5 Maiores Salários em SP</h2>
    {sp}

    <h2>Top 5 Diferença Salarial (Brasil vs SP)</h2>
    <p>Cargos com maior disparidade absoluta de valores.</p>
    {diff}

    <h2>Top 5 Vantagem PJ (%) - Brasil</h2>
    <p>Cargos onde a modalidade PJ oferece o maior ganho percentual sobre a CLT.</p>
    {pj}

    <div class="footer">
      <p>Relatório gerado automaticamente em {when}</p>
    </div>
  </div>
</body>
</html>
"#,
        style = STYLE,
        greeting = greeting,
        sp = render_table(&tables.top_sp),
        diff = render_table(&tables.differences),
        pj = render_table(&tables.pj_advantage),
        when = generated_at.format("%d/%m/%Y %H:%M"),
    )
}

pub fn failure_subject(flow_name: &str) -> String {
    format!("Falha no Fluxo: {}", flow_name)
}

pub fn render_failure_html(flow_name: &str, stage: &str, error_text: &str) -> String {
    format!(
        r#"<p>O fluxo <strong>{flow}</strong> falhou.</p>
<p><strong>Etapa:</strong> {stage}</p>
<p><strong>Estado:</strong> Falha</p>
<p><strong>Mensagem de Erro:</strong></p>
<pre>{error}</pre>
<p>Por favor, verifique os logs para mais detalhes.</p>
"#,
        flow = escape_html(flow_name),
        stage = escape_html(stage),
        error = escape_html(error_text),
    )
}

/// Outbound HTML mail.
pub trait Mailer {
    fn send_html(&self, subject: &str, html_body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    cfg: EmailConfig,
    password: Option<String>,
}

impl SmtpMailer {
    /// The app password comes only from the environment. Missing settings
    /// surface when a message is sent, not here.
    pub fn new(cfg: EmailConfig) -> Self {
        let password = std::env::var(&cfg.password_env).ok();
        SmtpMailer { cfg, password }
    }
}

impl Mailer for SmtpMailer {
    fn send_html(&self, subject: &str, html_body: &str) -> Result<()> {
        let password = self.password.clone().ok_or_else(|| {
            ReportError::Delivery(format!("{} is not set in the environment", self.cfg.password_env))
        })?;
        if self.cfg.sender.trim().is_empty() || self.cfg.recipient.trim().is_empty() {
            return Err(ReportError::Delivery(
                "email sender and recipient must be set".to_string(),
            ));
        }
        let from: Mailbox = self.cfg.sender.parse()?;
        let to: Mailbox = self.cfg.recipient.parse()?;
        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        info!(
            "connecting to {}:{} to mail {}",
            self.cfg.smtp_host, self.cfg.smtp_port, self.cfg.recipient
        );
        let transport = SmtpTransport::starttls_relay(&self.cfg.smtp_host)?
            .port(self.cfg.smtp_port)
            .credentials(Credentials::new(self.cfg.sender.clone(), password))
            .build();
        transport.send(&message)?;
        info!("email sent to {}", self.cfg.recipient);
        Ok(())
    }
}
