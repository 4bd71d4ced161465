use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;
use crate::models::{
    object::{Cell, ObjectKind},
    wire::{CurrentMapResponse, GoalMapResponse},
    Coordinate, Matrix,
};

/// Which of the two remote grids a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSource {
    Current,
    Goal,
}

impl fmt::Display for GridSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridSource::Current => f.write_str("current"),
            GridSource::Goal => f.write_str("goal"),
        }
    }
}

/// A rectangular grid of normalized cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub rows: usize,
    pub columns: usize,
    pub cells: Matrix<Cell>,
}

impl Grid {
    pub fn from_current(response: &CurrentMapResponse) -> Result<Self, ValidationError> {
        let content = response
            .content()
            .ok_or(ValidationError::MissingGrid(GridSource::Current))?;
        let cells = content
            .iter()
            .map(|row| row.iter().map(|c| Cell::from_current(c.as_ref())).collect())
            .collect();
        Self::from_cells(GridSource::Current, cells)
    }

    pub fn from_goal(response: &GoalMapResponse) -> Result<Self, ValidationError> {
        let goal = response
            .goal
            .as_ref()
            .ok_or(ValidationError::MissingGrid(GridSource::Goal))?;
        let cells = goal
            .iter()
            .map(|row| row.iter().map(|l| Cell::from_goal_label(l.as_deref())).collect())
            .collect();
        Self::from_cells(GridSource::Goal, cells)
    }

    /// Rejects ragged input: every row must be as long as the first one.
    pub fn from_cells(grid: GridSource, cells: Matrix<Cell>) -> Result<Self, ValidationError> {
        let rows = cells.len();
        let columns = cells.first().map_or(0, Vec::len);
        if let Some((row, found)) = cells
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != columns)
        {
            return Err(ValidationError::NonRectangular {
                grid,
                row,
                expected: columns,
                found,
            });
        }
        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn get(&self, at: Coordinate) -> Option<&Cell> {
        self.cells.get(at.row).and_then(|row| row.get(at.column))
    }

    /// All cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &Cell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (Coordinate::new(r, c), cell))
        })
    }

    /// Up/down/left/right neighbours that fall inside the grid.
    pub fn get_neighbors(&self, at: Coordinate) -> Vec<&Cell> {
        let mut neighbors = Vec::new();
        let directions: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        for (dr, dc) in directions {
            let nr = at.row as i64 + dr;
            let nc = at.column as i64 + dc;
            if nr >= 0 && nr < self.rows as i64 && nc >= 0 && nc < self.columns as i64 {
                neighbors.push(&self.cells[nr as usize][nc as usize]);
            }
        }
        neighbors
    }

    pub fn has_adjacent(&self, at: Coordinate, kind: ObjectKind) -> bool {
        self.get_neighbors(at)
            .iter()
            .any(|cell| cell.kind() == Some(kind))
    }

    pub fn populated_count(&self) -> usize {
        self.iter().filter(|(_, cell)| !cell.is_empty()).count()
    }
}
