use std::fmt;

use serde::Serialize;

use crate::models::{wire::CurrentCell, Coordinate};

/// Goal-grid label used by the service for an empty cell.
pub const SPACE_LABEL: &str = "SPACE";

/// The three object kinds the megaverse knows about.
///
/// Polyanets carry no attribute, soloons carry a color and comeths a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    Polyanet,
    Soloon,
    Cometh,
}

impl ObjectKind {
    /// Maps the numeric `type` code used by the current-grid encoding.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ObjectKind::Polyanet),
            1 => Some(ObjectKind::Soloon),
            2 => Some(ObjectKind::Cometh),
            _ => None,
        }
    }

    /// Parses the kind part of a goal label (`POLYANET`, `SOLOON`, `COMETH`).
    pub fn from_label(label: &str) -> Option<Self> {
        [ObjectKind::Polyanet, ObjectKind::Soloon, ObjectKind::Cometh]
            .into_iter()
            .find(|kind| label.eq_ignore_ascii_case(kind.label()))
    }

    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Polyanet => "POLYANET",
            ObjectKind::Soloon => "SOLOON",
            ObjectKind::Cometh => "COMETH",
        }
    }

    /// Path of the REST collection handling this kind.
    pub fn endpoint(self) -> &'static str {
        match self {
            ObjectKind::Polyanet => "/polyanets",
            ObjectKind::Soloon => "/soloons",
            ObjectKind::Cometh => "/comeths",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Polyanet => "polyanet",
            ObjectKind::Soloon => "soloon",
            ObjectKind::Cometh => "cometh",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A grid cell normalized from either wire encoding.
///
/// The attribute is the soloon color or the comet direction as the service
/// reported it; comparisons ignore its case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "attribute", rename_all = "lowercase")]
pub enum Cell {
    Empty,
    Polyanet,
    Soloon(Option<String>),
    Cometh(Option<String>),
}

impl Cell {
    /// Normalizes a cell of the numeric-coded current grid.
    /// `null` and unknown type codes are empty.
    pub fn from_current(cell: Option<&CurrentCell>) -> Self {
        let Some(cell) = cell else {
            return Cell::Empty;
        };
        match ObjectKind::from_code(cell.kind) {
            Some(ObjectKind::Polyanet) => Cell::Polyanet,
            Some(ObjectKind::Soloon) => Cell::Soloon(cell.color.clone()),
            Some(ObjectKind::Cometh) => Cell::Cometh(cell.direction.clone()),
            None => {
                log::debug!("unknown current cell type {}, treating as empty", cell.kind);
                Cell::Empty
            }
        }
    }

    /// Normalizes a label of the string-coded goal grid.
    ///
    /// - `null`, `"SPACE"` and unrecognized labels are empty
    /// - `"POLYANET"` is a polyanet
    /// - `"<ATTR>_SOLOON"` / `"<ATTR>_COMETH"` carry `<ATTR>` as attribute
    pub fn from_goal_label(label: Option<&str>) -> Self {
        let Some(label) = label.map(str::trim) else {
            return Cell::Empty;
        };
        if label.is_empty() || label.eq_ignore_ascii_case(SPACE_LABEL) {
            return Cell::Empty;
        }
        if ObjectKind::from_label(label) == Some(ObjectKind::Polyanet) {
            return Cell::Polyanet;
        }
        if let Some((attribute, kind)) = label.rsplit_once('_') {
            if !attribute.is_empty() {
                match ObjectKind::from_label(kind) {
                    Some(ObjectKind::Soloon) => return Cell::Soloon(Some(attribute.to_string())),
                    Some(ObjectKind::Cometh) => return Cell::Cometh(Some(attribute.to_string())),
                    _ => {}
                }
            }
        }
        log::debug!("unrecognized goal label {label:?}, treating as empty");
        Cell::Empty
    }

    pub fn kind(&self) -> Option<ObjectKind> {
        match self {
            Cell::Empty => None,
            Cell::Polyanet => Some(ObjectKind::Polyanet),
            Cell::Soloon(_) => Some(ObjectKind::Soloon),
            Cell::Cometh(_) => Some(ObjectKind::Cometh),
        }
    }

    pub fn attribute(&self) -> Option<&str> {
        match self {
            Cell::Soloon(attr) | Cell::Cometh(attr) => attr.as_deref(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind(), self.attribute()) {
            (None, _) => f.write_str("empty"),
            (Some(kind), None) => write!(f, "{kind}"),
            (Some(kind), Some(attr)) => write!(f, "{} {kind}", attr.to_ascii_lowercase()),
        }
    }
}

/// An object that can be placed on the grid, with its required attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AstralObject {
    Polyanet,
    Soloon { color: String },
    Cometh { direction: String },
}

impl AstralObject {
    /// Returns `None` for empty cells and for decorations missing their attribute.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Empty => None,
            Cell::Polyanet => Some(AstralObject::Polyanet),
            Cell::Soloon(color) => color
                .as_ref()
                .map(|color| AstralObject::Soloon { color: color.clone() }),
            Cell::Cometh(direction) => direction.as_ref().map(|direction| AstralObject::Cometh {
                direction: direction.clone(),
            }),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            AstralObject::Polyanet => ObjectKind::Polyanet,
            AstralObject::Soloon { .. } => ObjectKind::Soloon,
            AstralObject::Cometh { .. } => ObjectKind::Cometh,
        }
    }
}

/// One placement call to issue. Built from a goal grid, consumed once by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementRequest {
    pub coordinate: Coordinate,
    pub object: AstralObject,
}

impl PlacementRequest {
    pub fn new(coordinate: Coordinate, object: AstralObject) -> Self {
        Self { coordinate, object }
    }

    /// Human-readable operation name, used in logs and errors.
    pub fn describe(&self) -> String {
        format!("place {} at {}", self.object.kind(), self.coordinate)
    }
}
