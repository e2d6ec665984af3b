//! Point quantization.
//!
//! Every point value that reaches the threshold builder or the grade resolver
//! lives on a [`Grid`]: whole points or half points.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Values closer than this (in grid units) to a grid point are treated as on it.
const EPSILON: f64 = 1e-9;

/// Quantization step for point values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Grid {
    /// Whole points only.
    #[default]
    Whole,
    /// Half-point precision.
    Half,
}

impl Grid {
    pub fn step(self) -> f64 {
        match self {
            Grid::Whole => 1.0,
            Grid::Half => 0.5,
        }
    }

    /// Smallest grid value that is `>= v`.
    pub fn round_up(self, v: f64) -> f64 {
        let step = self.step();
        (v / step - EPSILON).ceil() * step
    }

    /// Largest grid value that is `<= v`.
    pub fn round_down(self, v: f64) -> f64 {
        let step = self.step();
        (v / step + EPSILON).floor() * step
    }

    /// Closest grid value, halfway cases rounded away from zero.
    pub fn round_nearest(self, v: f64) -> f64 {
        let step = self.step();
        (v / step).round() * step
    }

    pub fn is_aligned(self, v: f64) -> bool {
        let units = v / self.step();
        (units - units.round()).abs() < EPSILON
    }

    /// All grid values from `from` to `to`, both inclusive once snapped inward.
    pub fn values(self, from: f64, to: f64) -> impl Iterator<Item = f64> {
        let step = self.step();
        let first = (from / step - EPSILON).ceil() as i64;
        let last = (to / step + EPSILON).floor() as i64;
        (first..=last).map(move |unit| unit as f64 * step)
    }

    /// Formats a grid value the way the calculator displays points: integers
    /// without a fraction, half points with a decimal comma.
    pub fn format(self, v: f64) -> String {
        if (v - v.round()).abs() < EPSILON {
            format!("{}", v.round() as i64)
        } else {
            format!("{:.1}", v).replace('.', ",")
        }
    }
}

/// How earned points are snapped onto the grid before grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Round up to the next grid value (benefit of the doubt).
    #[default]
    Up,
    /// Round to the closest grid value.
    Nearest,
    /// Round down to the previous grid value.
    Down,
}

impl RoundingPolicy {
    pub fn snap(self, grid: Grid, v: f64) -> f64 {
        match self {
            RoundingPolicy::Up => grid.round_up(v),
            RoundingPolicy::Nearest => grid.round_nearest(v),
            RoundingPolicy::Down => grid.round_down(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_whole() {
        assert_eq!(Grid::Whole.round_up(4.1), 5.0);
        assert_eq!(Grid::Whole.round_up(5.0), 5.0);
        assert_eq!(Grid::Whole.round_up(0.0), 0.0);
    }

    #[test]
    fn test_round_up_half() {
        assert_eq!(Grid::Half.round_up(6.1), 6.5);
        assert_eq!(Grid::Half.round_up(6.5), 6.5);
        assert_eq!(Grid::Half.round_up(6.75), 7.0);
    }

    #[test]
    fn test_round_down_half() {
        assert_eq!(Grid::Half.round_down(6.75), 6.5);
        assert_eq!(Grid::Half.round_down(7.0), 7.0);
        assert_eq!(Grid::Whole.round_down(9.99), 9.0);
    }

    #[test]
    fn test_round_up_ignores_float_noise() {
        let sum = 0.1 + 0.2 + 0.7;
        assert_eq!(Grid::Whole.round_up(sum), 1.0);
        assert_eq!(Grid::Half.round_up(0.1 + 0.2 + 0.2), 0.5);
    }

    #[test]
    fn test_round_up_is_idempotent() {
        for grid in [Grid::Whole, Grid::Half] {
            for raw in [0.0, 0.3, 1.49, 2.5, 6.75, 19.01, 33.3] {
                let once = grid.round_up(raw);
                assert_eq!(grid.round_up(once), once);
                assert_eq!(grid.round_down(once), once);
                assert!(grid.is_aligned(once));
            }
        }
    }

    #[test]
    fn test_round_nearest() {
        assert_eq!(Grid::Whole.round_nearest(2.5), 3.0);
        assert_eq!(Grid::Whole.round_nearest(2.4), 2.0);
        assert_eq!(Grid::Half.round_nearest(2.3), 2.5);
        assert_eq!(Grid::Half.round_nearest(2.2), 2.0);
    }

    #[test]
    fn test_values_inclusive() {
        let values: Vec<f64> = Grid::Half.values(0.0, 2.0).collect();
        assert_eq!(values, vec![0.0, 0.5, 1.0, 1.5, 2.0]);

        let values: Vec<f64> = Grid::Whole.values(0.5, 3.5).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_format() {
        assert_eq!(Grid::Half.format(6.5), "6,5");
        assert_eq!(Grid::Half.format(7.0), "7");
        assert_eq!(Grid::Whole.format(20.0), "20");
    }

    #[test]
    fn test_rounding_policy_snap() {
        assert_eq!(RoundingPolicy::Up.snap(Grid::Whole, 3.2), 4.0);
        assert_eq!(RoundingPolicy::Nearest.snap(Grid::Whole, 3.2), 3.0);
        assert_eq!(RoundingPolicy::Down.snap(Grid::Half, 3.9), 3.5);
    }
}
