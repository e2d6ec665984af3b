//! Threshold construction: projecting a percentage scale onto a point range.
//!
//! Starts round up and ends round down, so every point inside a threshold maps
//! back into its source band. Bands that collapse at the chosen grid are dropped,
//! and adjacent thresholds never share a point value.

use serde::Serialize;
use tracing::{debug, warn};

use crate::grid::Grid;
use crate::resolver::{Resolution, resolve};
use crate::scale::ScaleBand;

/// A band realized as an inclusive point interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Threshold {
    pub grade: String,
    pub start: f64,
    pub end: f64,
    pub percent_min: u8,
    pub percent_max: u8,
}

/// Why a band has no threshold in the final table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The band holds no grid value at this maximum.
    Collapsed,
    /// Every grid value in the band was already claimed by a lower threshold.
    Overlapped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedBand {
    pub grade: String,
    pub reason: DropReason,
}

/// Grid values claimed by no threshold, lying between two adjacent thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gap {
    pub from: f64,
    pub to: f64,
    /// Grade awarded for points inside the gap.
    pub resolves_to: String,
}

/// Builds the threshold table for `max_points` on `grid`.
pub fn build_thresholds(max_points: f64, bands: &[ScaleBand], grid: Grid) -> Vec<Threshold> {
    build(max_points, bands, grid).0
}

#[tracing::instrument(level = "debug", skip(bands), fields(band_count = bands.len()))]
fn build(max_points: f64, bands: &[ScaleBand], grid: Grid) -> (Vec<Threshold>, Vec<DroppedBand>) {
    let mut dropped = Vec::new();

    if !(max_points.is_finite() && max_points > 0.0) {
        warn!(max_points, "Refusing to build thresholds for a non-positive maximum");
        return (Vec::new(), dropped);
    }

    let mut thresholds: Vec<Threshold> = Vec::with_capacity(bands.len());

    for band in bands {
        let start = grid.round_up(max_points * f64::from(band.percent_min) / 100.0);
        let end = grid.round_down(max_points * f64::from(band.percent_max) / 100.0);

        if start > end {
            debug!(grade = %band.grade, start, end, "Band collapsed at this granularity");
            dropped.push(DroppedBand {
                grade: band.grade.clone(),
                reason: DropReason::Collapsed,
            });
            continue;
        }

        thresholds.push(Threshold {
            grade: band.grade.clone(),
            start,
            end,
            percent_min: band.percent_min,
            percent_max: band.percent_max,
        });
    }

    thresholds.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut resolved: Vec<Threshold> = Vec::with_capacity(thresholds.len());
    let mut last_end: Option<f64> = None;

    for mut threshold in thresholds {
        if let Some(last_end) = last_end {
            if threshold.start <= last_end {
                let pushed = grid.round_up(last_end + grid.step());
                debug!(
                    grade = %threshold.grade,
                    from = threshold.start,
                    to = pushed,
                    "Pushing overlapping threshold forward"
                );
                threshold.start = pushed;
            }
        }

        if threshold.start > threshold.end {
            debug!(grade = %threshold.grade, "Threshold fully overlapped, dropping");
            dropped.push(DroppedBand {
                grade: threshold.grade,
                reason: DropReason::Overlapped,
            });
            continue;
        }

        last_end = Some(threshold.end);
        resolved.push(threshold);
    }

    debug!(
        kept = resolved.len(),
        dropped = dropped.len(),
        "Thresholds built"
    );

    (resolved, dropped)
}

/// A threshold table together with the inputs it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdTable {
    pub max_points: f64,
    pub grid: Grid,
    pub thresholds: Vec<Threshold>,
    pub dropped: Vec<DroppedBand>,
}

impl ThresholdTable {
    pub fn build(max_points: f64, bands: &[ScaleBand], grid: Grid) -> Self {
        let (thresholds, dropped) = build(max_points, bands, grid);
        Self {
            max_points,
            grid,
            thresholds,
            dropped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// First start and last end, if any threshold survived.
    pub fn span(&self) -> Option<(f64, f64)> {
        let first = self.thresholds.first()?;
        let last = self.thresholds.last()?;
        Some((first.start, last.end))
    }

    pub fn gaps(&self) -> Vec<Gap> {
        let step = self.grid.step();
        self.thresholds
            .windows(2)
            .filter(|pair| pair[1].start > pair[0].end + step)
            .map(|pair| Gap {
                from: pair[0].end + step,
                to: pair[1].start - step,
                resolves_to: pair[1].grade.clone(),
            })
            .collect()
    }

    pub fn resolve(&self, points: f64) -> Resolution<'_> {
        resolve(points, &self.thresholds)
    }

    pub fn grade_for(&self, points: f64) -> &str {
        self.resolve(points).grade()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            gaps: self.gaps(),
            span: self.span(),
            dropped: self.dropped.clone(),
        }
    }
}

/// Non-error conditions worth showing next to the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub gaps: Vec<Gap>,
    pub span: Option<(f64, f64)>,
    pub dropped: Vec<DroppedBand>,
}
