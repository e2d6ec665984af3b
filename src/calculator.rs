//! Stateless grading core.
//!
//! A [`GradingStrategy`] (scale, grid, rounding policy) plus a validated maximum
//! yields a [`GradeCalculator`]. Callers keep their own session state and ask
//! the calculator for a fresh [`Evaluation`] on every input change.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::expression::{ExpressionError, parse_expression};
use crate::grid::{Grid, RoundingPolicy};
use crate::resolver::ResolutionKind;
use crate::scale::Scale;
use crate::thresholds::ThresholdTable;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("maximum points must be a positive number, got {0}")]
    NonPositiveMaxPoints(f64),
    #[error("maximum points {value} is not a multiple of the {grid:?} grid step")]
    OffGridMaxPoints { value: f64, grid: Grid },
}

/// A positive, grid-aligned maximum point value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaxPoints(f64);

impl MaxPoints {
    pub fn new(value: f64, grid: Grid) -> Result<Self, ConfigError> {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::NonPositiveMaxPoints(value));
        }
        if !grid.is_aligned(value) {
            return Err(ConfigError::OffGridMaxPoints { value, grid });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// The parameters that distinguish one grading variant from another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingStrategy {
    pub scale: Scale,
    pub grid: Grid,
    pub rounding: RoundingPolicy,
}

/// Earned points as entered: a manual value and an optional sum expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarnedInput {
    pub manual: f64,
    pub expression: Option<String>,
}

impl EarnedInput {
    pub fn manual(points: f64) -> Self {
        Self {
            manual: points,
            expression: None,
        }
    }

    pub fn expression(expression: impl Into<String>, fallback: f64) -> Self {
        Self {
            manual: fallback,
            expression: Some(expression.into()),
        }
    }
}

/// Recoverable conditions noticed while evaluating an input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The expression did not parse; the manual value was used instead.
    InvalidExpression { expression: String, reason: String },
    ClampedToMax { raw: f64, max_points: f64 },
    ClampedToZero { raw: f64 },
    /// The earned value was not a finite number; zero was used instead.
    NotFinite { raw: f64 },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::InvalidExpression { expression, reason } => {
                write!(f, "invalid expression '{expression}': {reason}; using manual points")
            }
            Warning::ClampedToMax { raw, max_points } => {
                write!(f, "{raw} exceeds the maximum, clamped to {max_points}")
            }
            Warning::ClampedToZero { raw } => write!(f, "{raw} is negative, clamped to 0"),
            Warning::NotFinite { raw } => write!(f, "{raw} is not a finite number, using 0"),
        }
    }
}

/// Result of grading one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Points before clamping and snapping.
    pub raw: f64,
    /// Points after clamping and snapping to the grid.
    pub points: f64,
    pub max_points: f64,
    pub percent: f64,
    pub grade: String,
    pub resolution: ResolutionKind,
    pub failing: bool,
    pub warnings: Vec<Warning>,
}

impl Evaluation {
    pub fn percent_display(&self) -> String {
        format!("{:.2}%", self.percent)
    }
}

#[derive(Debug, Clone)]
pub struct GradeCalculator {
    strategy: GradingStrategy,
    max_points: MaxPoints,
    table: ThresholdTable,
}

impl GradeCalculator {
    pub fn new(strategy: GradingStrategy, max_points: MaxPoints) -> Self {
        let table = ThresholdTable::build(max_points.get(), strategy.scale.bands(), strategy.grid);
        debug!(
            max_points = max_points.get(),
            thresholds = table.thresholds.len(),
            "Calculator ready"
        );
        Self {
            strategy,
            max_points,
            table,
        }
    }

    /// Same strategy, new maximum; the table is rebuilt from scratch.
    pub fn with_max_points(self, max_points: MaxPoints) -> Self {
        Self::new(self.strategy, max_points)
    }

    pub fn strategy(&self) -> &GradingStrategy {
        &self.strategy
    }

    pub fn max_points(&self) -> MaxPoints {
        self.max_points
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    #[tracing::instrument(skip(self), fields(max_points = self.max_points.get()))]
    pub fn evaluate(&self, input: &EarnedInput) -> Evaluation {
        let mut warnings = Vec::new();

        let raw = match input.expression.as_deref() {
            Some(expression) => match parse_expression(expression) {
                Ok(sum) => sum,
                Err(err) => {
                    warn!(expression, error = %err, "Falling back to manual points");
                    warnings.push(invalid_expression(expression, &err));
                    input.manual
                }
            },
            None => input.manual,
        };

        let max_points = self.max_points.get();
        let clamped = if !raw.is_finite() {
            warn!(raw, "Points are not a finite number, using zero");
            warnings.push(Warning::NotFinite { raw });
            0.0
        } else if raw > max_points {
            warn!(raw, max_points, "Points clamped to maximum");
            warnings.push(Warning::ClampedToMax { raw, max_points });
            max_points
        } else if raw < 0.0 {
            warn!(raw, "Points clamped to zero");
            warnings.push(Warning::ClampedToZero { raw });
            0.0
        } else {
            raw
        };

        let points = self.strategy.rounding.snap(self.strategy.grid, clamped);
        let resolution = self.table.resolve(points);
        let grade = resolution.grade();

        debug!(raw, points, grade, kind = ?resolution.kind(), "Evaluated");

        Evaluation {
            raw,
            points,
            max_points,
            percent: points / max_points * 100.0,
            grade: grade.to_string(),
            resolution: resolution.kind(),
            failing: self.strategy.scale.is_failing(grade),
            warnings,
        }
    }
}

fn invalid_expression(expression: &str, err: &ExpressionError) -> Warning {
    Warning::InvalidExpression {
        expression: expression.to_string(),
        reason: err.to_string(),
    }
}
