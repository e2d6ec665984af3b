//! Percentage grading scales.
//!
//! A scale is the source of truth for grading: an ordered list of bands, each
//! mapping an inclusive integer percentage range to one grade label.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// School scale with `+`/`-` modifiers.
///
/// | Grade | Percent  |
/// |-------|----------|
/// | 1     | 0 - 25   |
/// | 1+    | 26 - 27  |
/// | 2-    | 28 - 29  |
/// | 2     | 30 - 45  |
/// | 2+    | 46 - 47  |
/// | 3-    | 48 - 49  |
/// | 3     | 50 - 65  |
/// | 3+    | 66 - 67  |
/// | 4-    | 68 - 69  |
/// | 4     | 70 - 80  |
/// | 4+    | 81 - 82  |
/// | 5-    | 83 - 84  |
/// | 5     | 85 - 91  |
/// | 5+    | 92 - 93  |
/// | 6-    | 94       |
/// | 6     | 95 - 100 |
static DETAILED: &[(&str, u8, u8)] = &[
    ("1", 0, 25),
    ("1+", 26, 27),
    ("2-", 28, 29),
    ("2", 30, 45),
    ("2+", 46, 47),
    ("3-", 48, 49),
    ("3", 50, 65),
    ("3+", 66, 67),
    ("4-", 68, 69),
    ("4", 70, 80),
    ("4+", 81, 82),
    ("5-", 83, 84),
    ("5", 85, 91),
    ("5+", 92, 93),
    ("6-", 94, 94),
    ("6", 95, 100),
];

/// The detailed scale with modifiers folded into their base grade.
static BASIC: &[(&str, u8, u8)] = &[
    ("1", 0, 27),
    ("2", 28, 47),
    ("3", 48, 67),
    ("4", 68, 82),
    ("5", 83, 93),
    ("6", 94, 100),
];

/// Lowest passing percentage of the built-in scales.
const BUILTIN_PASSING_PERCENT: u8 = 28;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaleError {
    #[error("scale has no bands")]
    Empty,
    #[error("band '{grade}' ends above 100% ({percent_max}%)")]
    AboveHundred { grade: String, percent_max: u8 },
    #[error("band '{grade}' starts after it ends ({percent_min}% > {percent_max}%)")]
    Inverted {
        grade: String,
        percent_min: u8,
        percent_max: u8,
    },
    #[error("band '{grade}' overlaps or precedes band '{previous}'")]
    Unordered { grade: String, previous: String },
    #[error("no band covers {from}% to {to}%")]
    Uncovered { from: u8, to: u8 },
    #[error("grade '{0}' appears more than once")]
    DuplicateGrade(String),
    #[error("failed to read scale file: {0}")]
    Csv(String),
}

/// One grade's percentage interval, both ends inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleBand {
    pub grade: String,
    pub percent_min: u8,
    pub percent_max: u8,
}

impl ScaleBand {
    pub fn new(grade: impl Into<String>, percent_min: u8, percent_max: u8) -> Self {
        Self {
            grade: grade.into(),
            percent_min,
            percent_max,
        }
    }
}

/// Built-in scales selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScaleId {
    #[default]
    Detailed,
    Basic,
}

/// A validated scale: bands sorted ascending and mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scale {
    bands: Vec<ScaleBand>,
    passing_percent: u8,
}

impl Scale {
    /// Validates `bands`, which must cover 0% to 100% without gaps or overlaps.
    /// Grades in bands ending below the second band's start fail.
    pub fn new(bands: Vec<ScaleBand>) -> Result<Self, ScaleError> {
        let passing_percent = bands.get(1).map(|b| b.percent_min).unwrap_or(0);
        Self::with_passing_percent(bands, passing_percent)
    }

    pub fn with_passing_percent(
        bands: Vec<ScaleBand>,
        passing_percent: u8,
    ) -> Result<Self, ScaleError> {
        if bands.is_empty() {
            return Err(ScaleError::Empty);
        }

        let mut previous: Option<&ScaleBand> = None;
        for band in &bands {
            if band.percent_max > 100 {
                return Err(ScaleError::AboveHundred {
                    grade: band.grade.clone(),
                    percent_max: band.percent_max,
                });
            }
            if band.percent_min > band.percent_max {
                return Err(ScaleError::Inverted {
                    grade: band.grade.clone(),
                    percent_min: band.percent_min,
                    percent_max: band.percent_max,
                });
            }
            if let Some(prev) = previous {
                if band.percent_min <= prev.percent_max {
                    return Err(ScaleError::Unordered {
                        grade: band.grade.clone(),
                        previous: prev.grade.clone(),
                    });
                }
                if band.percent_min > prev.percent_max + 1 {
                    return Err(ScaleError::Uncovered {
                        from: prev.percent_max + 1,
                        to: band.percent_min - 1,
                    });
                }
            }
            previous = Some(band);
        }

        if let Some(first) = bands.first().filter(|b| b.percent_min > 0) {
            return Err(ScaleError::Uncovered {
                from: 0,
                to: first.percent_min - 1,
            });
        }
        if let Some(last) = bands.last().filter(|b| b.percent_max < 100) {
            return Err(ScaleError::Uncovered {
                from: last.percent_max + 1,
                to: 100,
            });
        }

        for (i, band) in bands.iter().enumerate() {
            if bands[..i].iter().any(|b| b.grade == band.grade) {
                return Err(ScaleError::DuplicateGrade(band.grade.clone()));
            }
        }

        Ok(Self {
            bands,
            passing_percent,
        })
    }

    pub fn builtin(id: ScaleId) -> Self {
        let table = match id {
            ScaleId::Detailed => DETAILED,
            ScaleId::Basic => BASIC,
        };

        Self {
            bands: table
                .iter()
                .map(|&(grade, min, max)| ScaleBand::new(grade, min, max))
                .collect(),
            passing_percent: BUILTIN_PASSING_PERCENT,
        }
    }

    /// Loads a scale from a CSV file with a `grade,percent_min,percent_max` header.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, ScaleError> {
        let mut reader =
            csv::Reader::from_path(path.as_ref()).map_err(|e| ScaleError::Csv(e.to_string()))?;

        let bands = reader
            .deserialize::<ScaleBand>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ScaleError::Csv(e.to_string()))?;

        Self::new(bands)
    }

    pub fn bands(&self) -> &[ScaleBand] {
        &self.bands
    }

    pub fn passing_percent(&self) -> u8 {
        self.passing_percent
    }

    /// Position of `grade` in ascending scale order.
    pub fn rank(&self, grade: &str) -> Option<usize> {
        self.bands.iter().position(|b| b.grade == grade)
    }

    /// Whether `grade` belongs to a band entirely below the passing percentage.
    pub fn is_failing(&self, grade: &str) -> bool {
        self.bands
            .iter()
            .find(|b| b.grade == grade)
            .is_some_and(|b| b.percent_max < self.passing_percent)
    }
}
