//! CLI entry point for the grade scale calculator.
//!
//! Prints threshold tables, grades single inputs, and runs an interactive
//! session that re-grades on every line.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use grade_scale::{
    calculator::{EarnedInput, Evaluation, GradeCalculator, MaxPoints},
    config::AppConfig,
    grid::{Grid, RoundingPolicy},
    output::{
        Report, render_diagnostics, render_table, summary_line, to_json, write_csv, write_csv_path,
    },
    scale::ScaleId,
    telemetry,
};
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "grade_scale")]
#[command(about = "Convert earned points into grades on a percentage scale", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Commands,
}

// Overrides for values read from the environment.
#[derive(Args, Debug)]
struct SettingsArgs {
    /// Maximum number of points (a comma decimal is accepted, e.g. 25,5)
    #[arg(short, long, global = true, value_parser = parse_points)]
    max_points: Option<f64>,

    /// Point precision
    #[arg(short, long, global = true, value_enum)]
    grid: Option<Grid>,

    /// Built-in grading scale
    #[arg(short, long, global = true, value_enum)]
    scale: Option<ScaleId>,

    /// CSV file with a custom scale (grade,percent_min,percent_max)
    #[arg(long, global = true, value_name = "CSV")]
    scale_file: Option<PathBuf>,

    /// How earned points are snapped to the grid
    #[arg(short, long, global = true, value_enum)]
    rounding: Option<RoundingPolicy>,
}

impl SettingsArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(max_points) = self.max_points {
            config.max_points = max_points;
        }
        if let Some(grid) = self.grid {
            config.grid = grid;
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
            config.scale_file = None;
        }
        if let Some(scale_file) = self.scale_file {
            config.scale_file = Some(scale_file);
        }
        if let Some(rounding) = self.rounding {
            config.rounding = rounding;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the threshold table for the configured maximum
    Table {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Grade earned points or a partial-credit sum
    Grade {
        /// Earned points; also the fallback when the expression is invalid
        #[arg(short, long, value_parser = parse_points, required_unless_present = "expr")]
        points: Option<f64>,

        /// Sum of partial credits, e.g. "2+1,5+0,5"
        #[arg(short, long)]
        expr: Option<String>,

        /// Print a JSON report instead of a summary line
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show point gaps, omitted grades, and the covered range
    Diagnose,
    /// Grade lines read from stdin until `quit`
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    cli.settings.apply(&mut config);

    let _log_guard = telemetry::init(&config.log_file_path)?;

    let strategy = config
        .strategy()
        .with_context(|| format!("failed to load scale {}", scale_name(&config)))?;
    let max_points = config.max_points()?;
    let calculator = GradeCalculator::new(strategy, max_points);
    let scale = scale_name(&config);

    info!(
        max_points = max_points.get(),
        grid = ?config.grid,
        rounding = ?config.rounding,
        scale = %scale,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Table {
            format: Format::Csv,
            output: Some(path),
        } => {
            write_csv_path(&path, calculator.table())
                .with_context(|| format!("cannot write {}", path.display()))?;
            info!(path = %path.display(), "Threshold table written");
        }
        Commands::Table { format, output } => {
            let mut out: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    File::create(path)
                        .with_context(|| format!("cannot create {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };

            match format {
                Format::Text => write!(out, "{}", render_table(calculator.table()))?,
                Format::Json => {
                    let report = Report::new(&scale, calculator.strategy(), calculator.table());
                    writeln!(out, "{}", to_json(&report)?)?;
                }
                Format::Csv => write_csv(&mut out, calculator.table())?,
            }
            out.flush()?;

            if let Some(path) = output {
                info!(path = %path.display(), "Threshold table written");
            }
        }
        Commands::Grade { points, expr, json } => {
            let input = EarnedInput {
                manual: points.unwrap_or(0.0),
                expression: expr,
            };
            let evaluation = calculator.evaluate(&input);

            if json {
                let report = Report::new(&scale, calculator.strategy(), calculator.table())
                    .with_evaluation(&evaluation);
                println!("{}", to_json(&report)?);
            } else {
                print_evaluation(&evaluation, config.grid);
            }
        }
        Commands::Diagnose => {
            print!(
                "{}",
                render_diagnostics(&calculator.table().diagnostics(), config.grid)
            );
        }
        Commands::Interactive => {
            run_interactive(calculator, io::stdin().lock(), io::stdout().lock())?;
        }
    }

    Ok(())
}

fn scale_name(config: &AppConfig) -> String {
    match &config.scale_file {
        Some(path) => path.display().to_string(),
        None => config
            .scale
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default(),
    }
}

fn parse_points(value: &str) -> Result<f64, String> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("'{value}' is not a number"))
}

fn print_evaluation(evaluation: &Evaluation, grid: Grid) {
    for warning in &evaluation.warnings {
        eprintln!("Warning: {warning}");
    }
    let marker = if evaluation.failing { " (failing)" } else { "" };
    println!("{}{}", summary_line(evaluation, grid), marker);
}

/// Reads one command or expression per line. The session owns the only mutable
/// state: the current calculator and the last accepted point value.
fn run_interactive<R: BufRead, W: Write>(
    mut calculator: GradeCalculator,
    input: R,
    mut out: W,
) -> Result<()> {
    let grid = calculator.strategy().grid;
    let mut last_points = 0.0;

    writeln!(
        out,
        "Max points: {}. Enter points or a sum like 2+1,5; `max <n>`, `table`, `diagnose`, `quit`.",
        grid.format(calculator.max_points().get())
    )?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        debug!(line, "Session input");

        match line {
            "" => continue,
            "quit" | "exit" => break,
            "table" => write!(out, "{}", render_table(calculator.table()))?,
            "diagnose" => write!(
                out,
                "{}",
                render_diagnostics(&calculator.table().diagnostics(), grid)
            )?,
            _ => {
                if let Some(value) = line.strip_prefix("max ") {
                    match parse_points(value).map(|v| MaxPoints::new(v, grid)) {
                        Ok(Ok(max_points)) => {
                            calculator = calculator.with_max_points(max_points);
                            writeln!(out, "Max points: {}", grid.format(max_points.get()))?;
                        }
                        Ok(Err(err)) => {
                            warn!(error = %err, "Max points rejected");
                            writeln!(out, "Error: {err}")?;
                        }
                        Err(err) => writeln!(out, "Error: {err}")?,
                    }
                    continue;
                }

                let evaluation = calculator.evaluate(&EarnedInput::expression(line, last_points));
                for warning in &evaluation.warnings {
                    writeln!(out, "Warning: {warning}")?;
                }
                let marker = if evaluation.failing { " (failing)" } else { "" };
                writeln!(out, "{}{}", summary_line(&evaluation, grid), marker)?;
                last_points = evaluation.points;
            }
        }
    }

    out.flush()?;
    Ok(())
}
