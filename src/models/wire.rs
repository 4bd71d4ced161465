use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::models::{
    object::{AstralObject, PlacementRequest},
    Coordinate, Matrix,
};

/// A populated cell of the current grid, e.g. `{"type": 1, "color": "blue"}`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentCell {
    #[serde(rename = "type")]
    pub kind: i64,
    pub color: Option<String>,
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentMap {
    /// `null` entries are empty cells.
    pub content: Option<Matrix<Option<CurrentCell>>>,
}

/// Body of `GET /map/{candidateId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentMapResponse {
    pub map: Option<CurrentMap>,
}

impl CurrentMapResponse {
    pub fn from_content(content: Matrix<Option<CurrentCell>>) -> Self {
        Self {
            map: Some(CurrentMap {
                content: Some(content),
            }),
        }
    }

    pub fn content(&self) -> Option<&Matrix<Option<CurrentCell>>> {
        self.map.as_ref().and_then(|m| m.content.as_ref())
    }
}

/// Body of `GET /map/{candidateId}/goal`.
/// Labels are `"SPACE"`, `"POLYANET"` or `"<ATTR>_SOLOON"` / `"<ATTR>_COMETH"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalMapResponse {
    pub goal: Option<Matrix<Option<String>>>,
}

impl GoalMapResponse {
    pub fn from_labels(labels: &[&[&str]]) -> Self {
        let goal = labels
            .iter()
            .map(|row| row.iter().map(|label| Some(label.to_string())).collect())
            .collect();
        Self { goal: Some(goal) }
    }
}

/// JSON body shared by every POST and DELETE on the object endpoints.
/// Attributes are lower-cased and omitted when absent.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBody {
    pub row: usize,
    pub column: usize,
    pub color: Option<String>,
    pub direction: Option<String>,
    pub candidate_id: String,
}

impl ObjectBody {
    pub fn placement(request: &PlacementRequest, candidate_id: &str) -> Self {
        let (color, direction) = match &request.object {
            AstralObject::Polyanet => (None, None),
            AstralObject::Soloon { color } => (Some(color.to_lowercase()), None),
            AstralObject::Cometh { direction } => (None, Some(direction.to_lowercase())),
        };
        Self {
            row: request.coordinate.row,
            column: request.coordinate.column,
            color,
            direction,
            candidate_id: candidate_id.to_string(),
        }
    }

    pub fn removal(coordinate: Coordinate, candidate_id: &str) -> Self {
        Self {
            row: coordinate.row,
            column: coordinate.column,
            color: None,
            direction: None,
            candidate_id: candidate_id.to_string(),
        }
    }
}
