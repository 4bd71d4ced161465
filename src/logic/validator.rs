use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ValidationError;
use crate::models::{
    grid::{Grid, GridSource},
    object::Cell,
    wire::{CurrentMapResponse, GoalMapResponse},
    Coordinate,
};

/// Mismatches kept in a report (and logged) before the rest are only counted.
pub const MAX_REPORTED_MISMATCHES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    /// Goal has an object, current cell is empty.
    MissingObject,
    /// Current cell has an object the goal does not want.
    UnexpectedObject,
    KindMismatch,
    AttributeMismatch,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MismatchReason::MissingObject => "missing object",
            MismatchReason::UnexpectedObject => "unexpected object",
            MismatchReason::KindMismatch => "wrong kind",
            MismatchReason::AttributeMismatch => "wrong attribute",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub coordinate: Coordinate,
    pub expected: Cell,
    pub actual: Cell,
    pub reason: MismatchReason,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {}: expected {}, found {} ({})",
            self.coordinate, self.expected, self.actual, self.reason
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub rows: usize,
    pub columns: usize,
}

impl From<&Grid> for Dimensions {
    fn from(grid: &Grid) -> Self {
        Self {
            rows: grid.rows,
            columns: grid.columns,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub matches: bool,
    pub current: Dimensions,
    pub goal: Dimensions,
    /// Set when the grids differ in size; no cell was compared.
    pub dimension_mismatch: bool,
    /// Total mismatching cells, including those not kept in `mismatches`.
    pub mismatch_count: usize,
    pub mismatches: Vec<Mismatch>,
    pub checked_at: DateTime<Utc>,
}

/// Compares one normalized cell pair. `None` means the cells match.
///
/// Attributes are compared ignoring ASCII case, and only when both sides have one.
pub fn compare_cells(actual: &Cell, expected: &Cell) -> Option<MismatchReason> {
    match (actual.kind(), expected.kind()) {
        (None, None) => None,
        (None, Some(_)) => Some(MismatchReason::MissingObject),
        (Some(_), None) => Some(MismatchReason::UnexpectedObject),
        (Some(a), Some(e)) if a != e => Some(MismatchReason::KindMismatch),
        _ => match (actual.attribute(), expected.attribute()) {
            (Some(a), Some(e)) if !a.eq_ignore_ascii_case(e) => {
                Some(MismatchReason::AttributeMismatch)
            }
            _ => None,
        },
    }
}

/// Compares two grids cell by cell in row-major order.
///
/// The whole grid is always scanned; only the first [`MAX_REPORTED_MISMATCHES`]
/// are kept and logged, the rest are counted.
pub fn compare_grids(current: &Grid, goal: &Grid) -> ValidationReport {
    let mut report = ValidationReport {
        matches: false,
        current: current.into(),
        goal: goal.into(),
        dimension_mismatch: false,
        mismatch_count: 0,
        mismatches: Vec::new(),
        checked_at: Utc::now(),
    };

    if current.dimensions() != goal.dimensions() {
        log::warn!(
            "grid dimensions differ: current {}x{}, goal {}x{}",
            current.rows,
            current.columns,
            goal.rows,
            goal.columns
        );
        report.dimension_mismatch = true;
        return report;
    }

    for ((coordinate, actual), (_, expected)) in current.iter().zip(goal.iter()) {
        let Some(reason) = compare_cells(actual, expected) else {
            continue;
        };
        report.mismatch_count += 1;
        if report.mismatches.len() < MAX_REPORTED_MISMATCHES {
            let mismatch = Mismatch {
                coordinate,
                expected: expected.clone(),
                actual: actual.clone(),
                reason,
            };
            log::warn!("mismatch {mismatch}");
            report.mismatches.push(mismatch);
        }
    }

    let hidden = report.mismatch_count - report.mismatches.len();
    if hidden > 0 {
        log::warn!("{hidden} more mismatching cell(s) not shown");
    }
    report.matches = report.mismatch_count == 0;
    if report.matches {
        log::info!("current grid matches the goal");
    }
    report
}

/// Validates a fetched current grid against a fetched goal grid.
///
/// Absent or ragged grids are an error, not a failed comparison.
pub fn validate(
    current: Option<&CurrentMapResponse>,
    goal: Option<&GoalMapResponse>,
) -> Result<ValidationReport, ValidationError> {
    let current = current.ok_or(ValidationError::MissingGrid(GridSource::Current))?;
    let goal = goal.ok_or(ValidationError::MissingGrid(GridSource::Goal))?;
    let current = Grid::from_current(current)?;
    let goal = Grid::from_goal(goal)?;
    Ok(compare_grids(&current, &goal))
}
