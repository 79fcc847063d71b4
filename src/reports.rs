use crate::error::{ReportError, Result};
use crate::types::{
    AnalystRow, Category, CategoryMeanRow, Dataset, DifferenceRow, PjAdvantageRow, SalaryRecord,
    TopSalaryRow,
};
use crate::util::average;
use crate::workbook::{ColumnFormat, ColumnSpec, KpiTable};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const TOP_N: usize = 5;

pub const SHEET_TOP_BR: &str = "Top 5 BR";
pub const SHEET_TOP_SP: &str = "Top 5 SP";
pub const SHEET_DIFFERENCE: &str = "Top 5 Diferença";
pub const SHEET_PJ_ADVANTAGE: &str = "Top 5 Vantagem PJ";
pub const SHEET_ANALYSTS: &str = "Ranking Linguagens";
pub const SHEET_CATEGORIES: &str = "Media Gestao vs Tec";

const ANALYST_ROLE: &str = "analista de sistemas";
const MANAGEMENT_KEYWORDS: [&str; 4] = ["agile", "master", "coach", "adm"];
const TECHNICAL_KEYWORDS: [&str; 3] = ["analista", "suporte", "dev"];

fn ensure_loaded(ds: &Dataset) -> Result<()> {
    if ds.is_empty() {
        return Err(ReportError::EmptyDataset(ds.region));
    }
    Ok(())
}

// Vec::sort_by is stable, so equal keys keep scrape order.
fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn top_salaries(ds: &Dataset) -> Result<Vec<TopSalaryRow>> {
    ensure_loaded(ds)?;
    let mut rows: Vec<&SalaryRecord> = ds.records.iter().collect();
    rows.sort_by(|a, b| desc(a.higher, b.higher));
    Ok(rows
        .into_iter()
        .take(TOP_N)
        .map(|r| TopSalaryRow {
            role: r.role.clone(),
            specialty: r.specialty.clone(),
            clt: r.clt,
            pj: r.pj,
            higher: r.higher,
        })
        .collect())
}

/// Inner join on `(role, specialty)`. Pairs present in only one region are
/// dropped; duplicated keys yield one row per combination.
pub fn top_differences(br: &Dataset, sp: &Dataset) -> Result<Vec<DifferenceRow>> {
    ensure_loaded(br)?;
    ensure_loaded(sp)?;

    let mut sp_by_key: HashMap<(&str, &str), Vec<&SalaryRecord>> = HashMap::new();
    for r in &sp.records {
        sp_by_key
            .entry((r.role.as_str(), r.specialty.as_str()))
            .or_default()
            .push(r);
    }

    let mut rows: Vec<DifferenceRow> = Vec::new();
    for b in &br.records {
        let Some(matches) = sp_by_key.get(&(b.role.as_str(), b.specialty.as_str())) else {
            continue;
        };
        for s in matches {
            rows.push(DifferenceRow {
                role: b.role.clone(),
                specialty: b.specialty.clone(),
                higher_br: b.higher,
                higher_sp: s.higher,
                diff: (b.higher - s.higher).abs(),
            });
        }
    }
    rows.sort_by(|a, b| desc(a.diff, b.diff));
    rows.truncate(TOP_N);
    Ok(rows)
}

/// `(pj - clt) / clt` as a fraction. Rows without a CLT figure are skipped.
pub fn top_pj_advantage(ds: &Dataset) -> Result<Vec<PjAdvantageRow>> {
    ensure_loaded(ds)?;
    let mut rows: Vec<PjAdvantageRow> = ds
        .records
        .iter()
        .filter(|r| r.clt > 0.0)
        .map(|r| PjAdvantageRow {
            role: r.role.clone(),
            specialty: r.specialty.clone(),
            clt: r.clt,
            pj: r.pj,
            advantage: (r.pj - r.clt) / r.clt,
        })
        .collect();
    rows.sort_by(|a, b| desc(a.advantage, b.advantage));
    rows.truncate(TOP_N);
    Ok(rows)
}

/// Every systems-analyst row, best paid first. No row limit.
pub fn analyst_ranking(ds: &Dataset) -> Result<Vec<AnalystRow>> {
    ensure_loaded(ds)?;
    let mut rows: Vec<AnalystRow> = ds
        .records
        .iter()
        .filter(|r| r.role.to_lowercase().contains(ANALYST_ROLE))
        .map(|r| AnalystRow {
            role: r.role.clone(),
            specialty: r.specialty.clone(),
            higher: r.higher,
        })
        .collect();
    rows.sort_by(|a, b| desc(a.higher, b.higher));
    Ok(rows)
}

/// Management keywords are checked first, so "Agile Coach Dev" is management.
pub fn categorize(role: &str) -> Category {
    let role = role.to_lowercase();
    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| role.contains(k));
    if matches_any(&MANAGEMENT_KEYWORDS) {
        Category::Management
    } else if matches_any(&TECHNICAL_KEYWORDS) {
        Category::Technical
    } else {
        Category::Other
    }
}

pub fn category_means(ds: &Dataset) -> Result<Vec<CategoryMeanRow>> {
    ensure_loaded(ds)?;
    let mut groups: HashMap<Category, Vec<f64>> = HashMap::new();
    for r in &ds.records {
        groups.entry(categorize(&r.role)).or_default().push(r.higher);
    }

    let mut rows: Vec<(f64, CategoryMeanRow)> = Category::ALL
        .iter()
        .filter_map(|c| groups.get(c).map(|v| (*c, average(v))))
        .map(|(c, mean)| {
            (
                mean,
                CategoryMeanRow {
                    category: c.label().to_string(),
                    mean_higher: mean,
                },
            )
        })
        .collect();
    rows.sort_by(|a, b| desc(a.0, b.0));
    Ok(rows.into_iter().map(|(_, row)| row).collect())
}

/// All six KPIs of one run.
#[derive(Debug, Clone)]
pub struct KpiResults {
    pub top_br: Vec<TopSalaryRow>,
    pub top_sp: Vec<TopSalaryRow>,
    pub differences: Vec<DifferenceRow>,
    pub pj_advantage: Vec<PjAdvantageRow>,
    pub analysts: Vec<AnalystRow>,
    pub categories: Vec<CategoryMeanRow>,
}

pub fn compute_all(br: &Dataset, sp: &Dataset) -> Result<KpiResults> {
    Ok(KpiResults {
        top_br: top_salaries(br)?,
        top_sp: top_salaries(sp)?,
        differences: top_differences(br, sp)?,
        pj_advantage: top_pj_advantage(br)?,
        analysts: analyst_ranking(br)?,
        categories: category_means(sp)?,
    })
}

impl KpiResults {
    /// Sheets in workbook order, each with its column formats.
    pub fn to_tables(&self) -> Vec<KpiTable> {
        let money_c_to_e = vec![ColumnSpec::new(2, 4, 15.0, ColumnFormat::Currency)];
        vec![
            KpiTable::from_rows(SHEET_TOP_BR, &self.top_br, money_c_to_e.clone()),
            KpiTable::from_rows(SHEET_TOP_SP, &self.top_sp, money_c_to_e.clone()),
            KpiTable::from_rows(SHEET_DIFFERENCE, &self.differences, money_c_to_e),
            KpiTable::from_rows(
                SHEET_PJ_ADVANTAGE,
                &self.pj_advantage,
                vec![
                    ColumnSpec::new(2, 3, 15.0, ColumnFormat::Currency),
                    ColumnSpec::new(4, 4, 12.0, ColumnFormat::Percentage),
                ],
            ),
            KpiTable::from_rows(
                SHEET_ANALYSTS,
                &self.analysts,
                vec![ColumnSpec::new(2, 2, 15.0, ColumnFormat::Currency)],
            ),
            KpiTable::from_rows(
                SHEET_CATEGORIES,
                &self.categories,
                vec![ColumnSpec::new(1, 1, 15.0, ColumnFormat::Currency)],
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_records;
    use crate::types::{RawRecord, Region};

    fn rec(role: &str, specialty: &str, clt: f64, pj: f64) -> SalaryRecord {
        SalaryRecord {
            role: role.to_string(),
            specialty: specialty.to_string(),
            clt,
            pj,
            higher: clt.max(pj),
        }
    }

    fn ds(region: Region, records: Vec<SalaryRecord>) -> Dataset {
        Dataset { region, records }
    }

    fn sample_br() -> Dataset {
        ds(
            Region::Br,
            vec![
                rec("Dev Jr", "-", 3000.0, 4000.0),
                rec("Analista de sistemas", "Java", 8000.0, 9000.0),
                rec("Analista de Sistemas", "COBOL", 9500.0, 9000.0),
                rec("Suporte", "N1", 2000.0, 2000.0),
                rec("Scrum Master", "-", 12000.0, 15000.0),
                rec("Arquiteto", "Cloud", 20000.0, 25000.0),
                rec("Estagiario", "-", 0.0, 1500.0),
            ],
        )
    }

    #[test]
    fn top_salaries_are_sorted_and_capped() {
        let br = sample_br();
        let top = top_salaries(&br).unwrap();
        assert_eq!(top.len(), TOP_N);
        assert!(top.windows(2).all(|w| w[0].higher >= w[1].higher));
        assert_eq!(top[0].role, "Arquiteto");
        for row in &top {
            assert!(br.records.iter().any(|r| r.role == row.role && r.higher == row.higher));
        }
    }

    #[test]
    fn top_salaries_short_dataset_and_stable_ties() {
        let sp = ds(
            Region::Sp,
            vec![rec("A", "-", 1000.0, 0.0), rec("B", "-", 0.0, 1000.0), rec("C", "-", 500.0, 0.0)],
        );
        let top = top_salaries(&sp).unwrap();
        let roles: Vec<&str> = top.iter().map(|r| r.role.as_str()).collect();
        assert_eq!(roles, vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_dataset_fails_loudly() {
        let empty = ds(Region::Sp, vec![]);
        assert!(matches!(top_salaries(&empty), Err(ReportError::EmptyDataset(Region::Sp))));
        assert!(matches!(
            top_differences(&sample_br(), &empty),
            Err(ReportError::EmptyDataset(Region::Sp))
        ));
    }

    #[test]
    fn difference_joins_on_role_and_specialty() {
        let (br, _) = load_records(
            Region::Br,
            vec![RawRecord::new("Dev Jr", "", "3.000,00", "4.000,00")],
        )
        .unwrap();
        let (sp, _) = load_records(
            Region::Sp,
            vec![RawRecord::new("Dev Jr", "", "5.000,00", "5.500,00")],
        )
        .unwrap();
        let diff = top_differences(&br, &sp).unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].higher_br, 4000.0);
        assert_eq!(diff[0].higher_sp, 5500.0);
        assert_eq!(diff[0].diff, 1500.0);
    }

    #[test]
    fn difference_without_common_pairs_is_empty() {
        let br = ds(Region::Br, vec![rec("Dev Jr", "-", 1.0, 2.0)]);
        let sp = ds(
            Region::Sp,
            vec![rec("dev jr", "-", 1.0, 2.0), rec("Dev Jr", "Java", 1.0, 2.0)],
        );
        assert!(top_differences(&br, &sp).unwrap().is_empty());
    }

    #[test]
    fn difference_keeps_only_shared_pairs_sorted() {
        let br = ds(
            Region::Br,
            vec![
                rec("A", "-", 1000.0, 0.0),
                rec("B", "-", 1000.0, 0.0),
                rec("Only BR", "-", 99999.0, 0.0),
            ],
        );
        let sp = ds(
            Region::Sp,
            vec![rec("B", "-", 4000.0, 0.0), rec("A", "-", 1500.0, 0.0), rec("Only SP", "-", 1.0, 0.0)],
        );
        let diff = top_differences(&br, &sp).unwrap();
        let roles: Vec<&str> = diff.iter().map(|r| r.role.as_str()).collect();
        assert_eq!(roles, vec!["B", "A"]);
        assert_eq!(diff[0].diff, 3000.0);
    }

    #[test]
    fn pj_advantage_skips_zero_clt() {
        let br = sample_br();
        let adv = top_pj_advantage(&br).unwrap();
        assert!(adv.iter().all(|r| r.clt > 0.0));
        assert!(adv.iter().all(|r| r.role != "Estagiario"));
        assert_eq!(adv[0].role, "Dev Jr");
        assert!((adv[0].advantage - 1.0 / 3.0).abs() < 1e-12);
        assert!(adv.windows(2).all(|w| w[0].advantage >= w[1].advantage));
    }

    #[test]
    fn pj_advantage_all_zero_clt_is_empty() {
        let br = ds(Region::Br, vec![rec("A", "-", 0.0, 100.0), rec("B", "-", 0.0, 0.0)]);
        assert!(top_pj_advantage(&br).unwrap().is_empty());
    }

    #[test]
    fn analyst_ranking_is_case_insensitive_and_unbounded() {
        let mut records: Vec<SalaryRecord> = (0..8)
            .map(|i| rec("Analista de sistemas", &format!("L{}", i), 1000.0 * i as f64, 0.0))
            .collect();
        records.push(rec("ANALISTA DE SISTEMAS Sr", "Go", 50000.0, 0.0));
        records.push(rec("Analista de dados", "SQL", 90000.0, 0.0));
        let ranking = analyst_ranking(&ds(Region::Br, records)).unwrap();
        assert_eq!(ranking.len(), 9);
        assert_eq!(ranking[0].role, "ANALISTA DE SISTEMAS Sr");
        assert_eq!(ranking[1].specialty, "L7");
    }

    #[test]
    fn management_wins_over_technical() {
        assert_eq!(categorize("Agile Coach Dev"), Category::Management);
        assert_eq!(categorize("Administrador de redes"), Category::Management);
        assert_eq!(categorize("Dev Backend"), Category::Technical);
        assert_eq!(categorize("Analista de suporte"), Category::Technical);
        assert_eq!(categorize("Arquiteto"), Category::Other);
    }

    #[test]
    fn category_means_sorted_descending() {
        let sp = ds(
            Region::Sp,
            vec![
                rec("Scrum Master", "-", 10000.0, 12000.0),
                rec("Product Coach", "-", 8000.0, 0.0),
                rec("Dev Pleno", "-", 7000.0, 9000.0),
                rec("Suporte", "-", 3000.0, 0.0),
            ],
        );
        let means = category_means(&sp).unwrap();
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].category, "Gestão/Liderança");
        assert_eq!(means[0].mean_higher, 10000.0);
        assert_eq!(means[1].category, "Técnico/Operacional");
        assert_eq!(means[1].mean_higher, 6000.0);
    }

    #[test]
    fn tables_follow_sheet_order() {
        let br = sample_br();
        let sp = ds(Region::Sp, br.records.clone());
        let tables = compute_all(&br, &sp).unwrap().to_tables();
        let names: Vec<&str> = tables.iter().map(|t| t.sheet_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                SHEET_TOP_BR,
                SHEET_TOP_SP,
                SHEET_DIFFERENCE,
                SHEET_PJ_ADVANTAGE,
                SHEET_ANALYSTS,
                SHEET_CATEGORIES
            ]
        );
        assert_eq!(tables[3].headers[4], "Vantagem_PJ_Perc");
    }

    #[test]
    fn every_sheet_column_has_its_number_format() {
        use crate::workbook::ColumnFormat::{Currency as C, Percentage as P, Plain as T};

        let br = sample_br();
        let sp = ds(Region::Sp, br.records.clone());
        let tables = compute_all(&br, &sp).unwrap().to_tables();
        let expected: [&[ColumnFormat]; 6] = [
            &[T, T, C, C, C],
            &[T, T, C, C, C],
            &[T, T, C, C, C],
            &[T, T, C, C, P],
            &[T, T, C],
            &[T, C],
        ];
        for (table, formats) in tables.iter().zip(expected) {
            assert_eq!(table.headers.len(), formats.len(), "{}", table.sheet_name);
            let actual: Vec<ColumnFormat> =
                (0..table.headers.len() as u16).map(|c| table.format_of(c)).collect();
            assert_eq!(actual, formats, "{}", table.sheet_name);
            // Nothing past the last header carries a format.
            assert_eq!(table.format_of(formats.len() as u16), T, "{}", table.sheet_name);
        }
    }
}
