//! Environment-driven defaults for the calculator.
//!
//! `.env` is loaded by the binary; every value can be overridden on the command line.

use clap::ValueEnum;
use std::path::PathBuf;
use thiserror::Error;

use crate::calculator::{ConfigError, GradingStrategy, MaxPoints};
use crate::grid::{Grid, RoundingPolicy};
use crate::scale::{Scale, ScaleError, ScaleId};

pub const DEFAULT_LOG_FILE_PATH: &str = "logs/grade_scale.log";
const DEFAULT_MAX_POINTS: f64 = 20.0;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{key} has an invalid value '{value}'")]
pub struct EnvError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub max_points: f64,
    pub grid: Grid,
    pub scale: ScaleId,
    /// Custom scale CSV; takes precedence over `scale`.
    pub scale_file: Option<PathBuf>,
    pub rounding: RoundingPolicy,
    pub log_file_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            grid: Grid::default(),
            scale: ScaleId::default(),
            scale_file: None,
            rounding: RoundingPolicy::default(),
            log_file_path: DEFAULT_LOG_FILE_PATH.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EnvError> {
        let defaults = Self::default();

        let max_points = match lookup("GRADE_MAX_POINTS") {
            Some(value) => value
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or(EnvError {
                    key: "GRADE_MAX_POINTS",
                    value,
                })?,
            None => defaults.max_points,
        };

        Ok(Self {
            max_points,
            grid: parse_enum(&lookup, "GRADE_GRID")?.unwrap_or(defaults.grid),
            scale: parse_enum(&lookup, "GRADE_SCALE")?.unwrap_or(defaults.scale),
            scale_file: lookup("GRADE_SCALE_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            rounding: parse_enum(&lookup, "GRADE_ROUNDING")?.unwrap_or(defaults.rounding),
            log_file_path: lookup("LOG_FILE_PATH").unwrap_or(defaults.log_file_path),
        })
    }

    pub fn strategy(&self) -> Result<GradingStrategy, ScaleError> {
        let scale = match &self.scale_file {
            Some(path) => Scale::from_csv_path(path)?,
            None => Scale::builtin(self.scale),
        };

        Ok(GradingStrategy {
            scale,
            grid: self.grid,
            rounding: self.rounding,
        })
    }

    pub fn max_points(&self) -> Result<MaxPoints, ConfigError> {
        MaxPoints::new(self.max_points, self.grid)
    }
}

fn parse_enum<T: ValueEnum>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, EnvError> {
    match lookup(key) {
        Some(value) => T::from_str(value.trim(), true)
            .map(Some)
            .map_err(|_| EnvError { key, value }),
        None => Ok(None),
    }
}
