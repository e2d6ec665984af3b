//! Grade lookup over a threshold table.
//!
//! Points are expected to be snapped to the grid already. Out-of-range values
//! clamp to the nearest grade and values in a gap get the higher neighbour.

use serde::Serialize;

use crate::thresholds::Threshold;

/// Grade reported when no threshold survived construction.
pub const NOT_APPLICABLE: &str = "N/A";

/// How a grade was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    NotApplicable,
    Direct(&'a str),
    BelowRange(&'a str),
    AboveRange(&'a str),
    Gap(&'a str),
    Fallback(&'a str),
}

impl<'a> Resolution<'a> {
    pub fn grade(&self) -> &'a str {
        match *self {
            Resolution::NotApplicable => NOT_APPLICABLE,
            Resolution::Direct(grade)
            | Resolution::BelowRange(grade)
            | Resolution::AboveRange(grade)
            | Resolution::Gap(grade)
            | Resolution::Fallback(grade) => grade,
        }
    }

    pub fn kind(&self) -> ResolutionKind {
        match self {
            Resolution::NotApplicable => ResolutionKind::NotApplicable,
            Resolution::Direct(_) => ResolutionKind::Direct,
            Resolution::BelowRange(_) => ResolutionKind::BelowRange,
            Resolution::AboveRange(_) => ResolutionKind::AboveRange,
            Resolution::Gap(_) => ResolutionKind::Gap,
            Resolution::Fallback(_) => ResolutionKind::Fallback,
        }
    }
}

/// [`Resolution`] without the borrowed grade, for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    NotApplicable,
    Direct,
    BelowRange,
    AboveRange,
    Gap,
    Fallback,
}

/// Resolves `points` against `thresholds`, which must be sorted by start.
pub fn resolve(points: f64, thresholds: &[Threshold]) -> Resolution<'_> {
    let (Some(first), Some(last)) = (thresholds.first(), thresholds.last()) else {
        return Resolution::NotApplicable;
    };

    if let Some(hit) = thresholds
        .iter()
        .find(|t| t.start <= points && points <= t.end)
    {
        return Resolution::Direct(&hit.grade);
    }

    if points < first.start {
        return Resolution::BelowRange(&first.grade);
    }

    if points > last.end {
        return Resolution::AboveRange(&last.grade);
    }

    if let Some(next) = thresholds.iter().find(|t| points < t.start) {
        return Resolution::Gap(&next.grade);
    }

    Resolution::Fallback(&last.grade)
}

/// Grade label for `points`, or [`NOT_APPLICABLE`] for an empty table.
pub fn grade_for_points(points: f64, thresholds: &[Threshold]) -> &str {
    resolve(points, thresholds).grade()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::scale::{Scale, ScaleBand, ScaleId};
    use crate::thresholds::build_thresholds;

    fn threshold(grade: &str, start: f64, end: f64) -> Threshold {
        Threshold {
            grade: grade.to_string(),
            start,
            end,
            percent_min: 0,
            percent_max: 0,
        }
    }

    fn gapped_table() -> Vec<Threshold> {
        vec![
            threshold("1", 2.0, 4.0),
            threshold("2", 7.0, 9.0),
            threshold("3", 10.0, 12.0),
        ]
    }

    #[test]
    fn test_empty_table_is_not_applicable() {
        assert_eq!(resolve(3.0, &[]), Resolution::NotApplicable);
        assert_eq!(grade_for_points(3.0, &[]), "N/A");
    }

    #[test]
    fn test_direct_hit_on_boundaries() {
        let table = gapped_table();
        assert_eq!(resolve(2.0, &table), Resolution::Direct("1"));
        assert_eq!(resolve(4.0, &table), Resolution::Direct("1"));
        assert_eq!(resolve(7.0, &table), Resolution::Direct("2"));
        assert_eq!(resolve(12.0, &table), Resolution::Direct("3"));
    }

    #[test]
    fn test_below_range_clamps_to_lowest() {
        let table = gapped_table();
        assert_eq!(resolve(0.0, &table), Resolution::BelowRange("1"));
        assert_eq!(resolve(-3.0, &table), Resolution::BelowRange("1"));
    }

    #[test]
    fn test_above_range_clamps_to_highest() {
        let table = gapped_table();
        assert_eq!(resolve(12.5, &table), Resolution::AboveRange("3"));
        assert_eq!(resolve(100.0, &table), Resolution::AboveRange("3"));
    }

    #[test]
    fn test_gap_resolves_to_higher_grade() {
        let table = gapped_table();
        assert_eq!(resolve(5.0, &table), Resolution::Gap("2"));
        assert_eq!(resolve(6.5, &table), Resolution::Gap("2"));
        assert_eq!(resolve(9.5, &table), Resolution::Gap("3"));
        assert_eq!(resolve(5.0, &table).kind(), ResolutionKind::Gap);
    }

    #[test]
    fn test_two_band_scenario() {
        let bands = vec![ScaleBand::new("1", 0, 25), ScaleBand::new("2", 30, 45)];
        let thresholds = build_thresholds(20.0, &bands, Grid::Whole);
        assert_eq!(grade_for_points(5.0, &thresholds), "1");
        assert_eq!(grade_for_points(6.0, &thresholds), "2");
        assert_eq!(grade_for_points(20.0, &thresholds), "2");
    }

    #[test]
    fn test_basic_scale_half_points() {
        let scale = Scale::builtin(ScaleId::Basic);
        let thresholds = build_thresholds(25.0, scale.bands(), Grid::Half);
        assert_eq!(grade_for_points(6.5, &thresholds), "1");
        assert_eq!(grade_for_points(7.0, &thresholds), "2");
    }

    #[test]
    fn test_grade_is_monotonic_in_points() {
        for id in [ScaleId::Detailed, ScaleId::Basic] {
            let scale = Scale::builtin(id);
            for grid in [Grid::Whole, Grid::Half] {
                for max in grid.values(grid.step(), 60.0) {
                    let thresholds = build_thresholds(max, scale.bands(), grid);
                    let mut previous = 0;
                    for points in grid.values(-2.0, max + 2.0) {
                        let grade = grade_for_points(points, &thresholds);
                        let rank = scale.rank(grade).unwrap();
                        assert!(
                            rank >= previous,
                            "{id:?} {grid:?} max={max} points={points}: {grade}"
                        );
                        previous = rank;
                    }
                }
            }
        }
    }
}
