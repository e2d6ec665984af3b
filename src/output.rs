//! Rendering of threshold tables and evaluations.
//!
//! Supports a plain-text table, a JSON report, and CSV export.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::calculator::{Evaluation, GradingStrategy};
use crate::grid::{Grid, RoundingPolicy};
use crate::thresholds::{Diagnostics, DropReason, ThresholdTable};

/// One displayed row of the threshold table.
#[derive(Debug, Serialize, PartialEq)]
pub struct TableRow {
    pub points_from: String,
    pub points_to: String,
    pub grade: String,
    pub percent_source: String,
}

pub fn table_rows(table: &ThresholdTable) -> Vec<TableRow> {
    table
        .thresholds
        .iter()
        .map(|t| TableRow {
            points_from: table.grid.format(t.start),
            points_to: table.grid.format(t.end),
            grade: t.grade.clone(),
            percent_source: format!("{}–{}%", t.percent_min, t.percent_max),
        })
        .collect()
}

/// Renders the table as aligned plain text.
pub fn render_table(table: &ThresholdTable) -> String {
    const HEADERS: [&str; 4] = ["Points from", "Points to", "Grade", "Percent (source)"];

    let rows = table_rows(table);
    if rows.is_empty() {
        return "No valid thresholds.\n".to_string();
    }

    let cells: Vec<[&str; 4]> = rows
        .iter()
        .map(|r| {
            [
                r.points_from.as_str(),
                r.points_to.as_str(),
                r.grade.as_str(),
                r.percent_source.as_str(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule: Vec<&str> = rule.iter().map(String::as_str).collect();
    push_line(&mut out, &rule, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// Renders gaps, scale range, and dropped bands.
pub fn render_diagnostics(diagnostics: &Diagnostics, grid: Grid) -> String {
    let mut out = String::new();

    let Some((start, end)) = diagnostics.span else {
        out.push_str("No valid thresholds.\n");
        return out;
    };

    if diagnostics.gaps.is_empty() {
        out.push_str("No point gaps.\n");
    } else {
        out.push_str("Point gaps (allowed, graded up):\n");
        for gap in &diagnostics.gaps {
            let _ = writeln!(
                out,
                "  {} – {} -> {}",
                grid.format(gap.from),
                grid.format(gap.to),
                gap.resolves_to
            );
        }
    }

    for dropped in &diagnostics.dropped {
        let reason = match dropped.reason {
            DropReason::Collapsed => "no point value fits the band",
            DropReason::Overlapped => "every point value is taken by a lower grade",
        };
        let _ = writeln!(out, "Grade {} omitted: {}", dropped.grade, reason);
    }

    let _ = writeln!(out, "Scale range: {} – {}", grid.format(start), grid.format(end));
    out
}

/// One-line summary of an evaluation.
pub fn summary_line(evaluation: &Evaluation, grid: Grid) -> String {
    format!(
        "Points: {} / {} | Percent: {} | Grade: {}",
        grid.format(evaluation.points),
        grid.format(evaluation.max_points),
        evaluation.percent_display(),
        evaluation.grade
    )
}

/// Everything the calculator knows for one configuration, as JSON.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub max_points: f64,
    pub grid: Grid,
    pub rounding: RoundingPolicy,
    pub scale: &'a str,
    pub table: &'a ThresholdTable,
    pub diagnostics: Diagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<&'a Evaluation>,
}

impl<'a> Report<'a> {
    pub fn new(scale: &'a str, strategy: &GradingStrategy, table: &'a ThresholdTable) -> Self {
        Self {
            generated_at: Utc::now(),
            max_points: table.max_points,
            grid: strategy.grid,
            rounding: strategy.rounding,
            scale,
            table,
            diagnostics: table.diagnostics(),
            evaluation: None,
        }
    }

    pub fn with_evaluation(mut self, evaluation: &'a Evaluation) -> Self {
        self.evaluation = Some(evaluation);
        self
    }
}

pub fn to_json(report: &Report<'_>) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes the table as CSV rows with a header.
pub fn write_csv<W: Write>(writer: W, table: &ThresholdTable) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    for row in table_rows(table) {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the table to a CSV file, replacing any existing file.
pub fn write_csv_path(path: impl AsRef<Path>, table: &ThresholdTable) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), rows = table.thresholds.len(), "Writing CSV table");
    write_csv(File::create(path)?, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{EarnedInput, GradeCalculator, MaxPoints};
    use crate::scale::{Scale, ScaleBand, ScaleId};
    use std::env;
    use std::fs;

    fn two_band_table() -> ThresholdTable {
        let bands = vec![ScaleBand::new("1", 0, 25), ScaleBand::new("2", 30, 45)];
        ThresholdTable::build(20.0, &bands, Grid::Whole)
    }

    fn calculator() -> GradeCalculator {
        let strategy = GradingStrategy {
            scale: Scale::builtin(ScaleId::Detailed),
            grid: Grid::Half,
            rounding: RoundingPolicy::Up,
        };
        GradeCalculator::new(strategy, MaxPoints::new(25.0, Grid::Half).unwrap())
    }

    #[test]
    fn test_render_table() {
        let rendered = render_table(&two_band_table());
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Points from"));
        assert!(lines[1].starts_with("---"));
        assert!(lines[2].contains("1") && lines[2].contains("0–25%"));
        assert!(lines[3].contains("6") && lines[3].contains("30–45%"));
    }

    #[test]
    fn test_render_empty_table() {
        let table = ThresholdTable::build(1.0, &[ScaleBand::new("A", 10, 20)], Grid::Whole);
        assert_eq!(render_table(&table), "No valid thresholds.\n");
    }

    #[test]
    fn test_table_rows_use_decimal_comma() {
        let calc = calculator();
        let rows = table_rows(calc.table());
        assert_eq!(rows[1].points_from, "6,5");
        assert_eq!(rows[1].grade, "1+");
    }

    #[test]
    fn test_render_diagnostics_lists_gaps() {
        let bands = vec![ScaleBand::new("low", 0, 20), ScaleBand::new("high", 60, 100)];
        let table = ThresholdTable::build(10.0, &bands, Grid::Whole);
        let rendered = render_diagnostics(&table.diagnostics(), Grid::Whole);

        assert!(rendered.contains("3 – 5 -> high"));
        assert!(rendered.contains("Scale range: 0 – 10"));
    }

    #[test]
    fn test_render_diagnostics_without_gaps() {
        let rendered = render_diagnostics(&two_band_table().diagnostics(), Grid::Whole);
        assert!(rendered.starts_with("No point gaps."));
    }

    #[test]
    fn test_summary_line() {
        let calc = calculator();
        let eval = calc.evaluate(&EarnedInput::expression("6+0,5", 0.0));
        assert_eq!(
            summary_line(&eval, Grid::Half),
            "Points: 6,5 / 25 | Percent: 26.00% | Grade: 1+"
        );
    }

    #[test]
    fn test_json_report() {
        let calc = calculator();
        let eval = calc.evaluate(&EarnedInput::manual(7.0));
        let report =
            Report::new("detailed", calc.strategy(), calc.table()).with_evaluation(&eval);

        let json = to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["max_points"], 25.0);
        assert_eq!(value["grid"], "half");
        assert_eq!(value["rounding"], "up");
        assert_eq!(value["evaluation"]["grade"], "2-");
        assert_eq!(value["table"]["thresholds"][0]["grade"], "1");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_write_csv_path() {
        let path = env::temp_dir().join("grade_scale_test_table.csv");
        let _ = fs::remove_file(&path);

        write_csv_path(&path, &two_band_table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "points_from,points_to,grade,percent_source");
        assert_eq!(lines[1], "0,5,1,0–25%");
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_csv_quotes_decimal_comma() {
        let calc = calculator();
        let mut buffer = Vec::new();
        write_csv(&mut buffer, calc.table()).unwrap();

        let content = String::from_utf8(buffer).unwrap();
        assert!(content.contains("\"6,5\",\"6,5\",1+"));
    }
}
