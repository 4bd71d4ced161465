use std::sync::Arc;

use serde::Serialize;

use crate::api::MegaverseApi;
use crate::error::ApiError;
use crate::models::{
    grid::Grid,
    object::{AstralObject, Cell, ObjectKind, PlacementRequest},
    Coordinate,
};

/// Why a goal cell was left out of a placement plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Soloons must touch a polyanet (up/down/left/right) in the goal grid.
    NoAdjacentPolyanet,
    MissingAttribute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCell {
    pub coordinate: Coordinate,
    pub kind: ObjectKind,
    pub reason: SkipReason,
}

/// Placements in issue order plus the goal cells that will not be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementPlan {
    pub requests: Vec<PlacementRequest>,
    pub skipped: Vec<SkippedCell>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlacementSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Settled result of one placement in concurrent mode.
#[derive(Debug)]
pub struct PlacementOutcome {
    pub request: PlacementRequest,
    pub result: Result<(), ApiError>,
}

impl PlacementOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Orders the goal grid into three row-major passes: polyanets, then soloons
/// next to a polyanet, then comeths.
pub fn plan_dependency_order(goal: &Grid) -> PlacementPlan {
    let mut plan = PlacementPlan::default();
    for kind in [ObjectKind::Polyanet, ObjectKind::Soloon, ObjectKind::Cometh] {
        for (coordinate, cell) in goal.iter().filter(|(_, c)| c.kind() == Some(kind)) {
            if kind == ObjectKind::Soloon && !goal.has_adjacent(coordinate, ObjectKind::Polyanet) {
                log::warn!("skipping soloon at {coordinate}: no adjacent polyanet");
                plan.skipped.push(SkippedCell {
                    coordinate,
                    kind,
                    reason: SkipReason::NoAdjacentPolyanet,
                });
                continue;
            }
            push_request(&mut plan, coordinate, cell);
        }
    }
    plan
}

/// Every populated cell in row-major order, with no ordering between kinds.
pub fn placements_for(goal: &Grid) -> PlacementPlan {
    let mut plan = PlacementPlan::default();
    for (coordinate, cell) in goal.iter().filter(|(_, c)| !c.is_empty()) {
        push_request(&mut plan, coordinate, cell);
    }
    plan
}

fn push_request(plan: &mut PlacementPlan, coordinate: Coordinate, cell: &Cell) {
    match AstralObject::from_cell(cell) {
        Some(object) => plan.requests.push(PlacementRequest::new(coordinate, object)),
        None => {
            // from_cell only refuses decorations without an attribute here
            if let Some(kind) = cell.kind() {
                log::warn!("skipping {kind} at {coordinate}: no attribute");
                plan.skipped.push(SkippedCell {
                    coordinate,
                    kind,
                    reason: SkipReason::MissingAttribute,
                });
            }
        }
    }
}

/// Sends the requests of `plan` one at a time, in plan order.
///
/// A failed placement is logged and counted; the remaining requests are still sent.
pub async fn place_sequentially<A>(api: &A, plan: &PlacementPlan) -> PlacementSummary
where
    A: MegaverseApi + ?Sized,
{
    let mut summary = PlacementSummary {
        skipped: plan.skipped.len(),
        ..PlacementSummary::default()
    };
    log::info!(
        "placing {} object(s) in order, {} skipped",
        plan.requests.len(),
        summary.skipped
    );
    for request in &plan.requests {
        match api.place(request).await {
            Ok(()) => {
                log::info!("placed {} at {}", request.object.kind(), request.coordinate);
                summary.succeeded += 1;
            }
            Err(e) => {
                log::error!("{e}");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Issues every placement at once and waits for all of them to settle.
///
/// Outcomes come back in request order; the calls themselves race.
pub async fn place_concurrently<A>(
    api: Arc<A>,
    requests: Vec<PlacementRequest>,
) -> Vec<PlacementOutcome>
where
    A: MegaverseApi + ?Sized + 'static,
{
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let api = Arc::clone(&api);
            let task = tokio::spawn({
                let request = request.clone();
                async move { api.place(&request).await }
            });
            (request, task)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (request, task) in handles {
        let result = match task.await {
            Ok(result) => result,
            Err(join_error) => Err(ApiError::Task {
                operation: request.describe(),
                message: join_error.to_string(),
            }),
        };
        match &result {
            Ok(()) => log::info!("placed {} at {}", request.object.kind(), request.coordinate),
            Err(e) => log::error!("{e}"),
        }
        outcomes.push(PlacementOutcome { request, result });
    }
    outcomes
}

/// Removes every populated cell of the current grid, one call at a time.
pub async fn clear_grid<A>(api: &A, current: &Grid) -> PlacementSummary
where
    A: MegaverseApi + ?Sized,
{
    let mut summary = PlacementSummary::default();
    for (coordinate, cell) in current.iter() {
        let Some(kind) = cell.kind() else {
            continue;
        };
        match api.remove(kind, coordinate).await {
            Ok(()) => {
                log::info!("removed {kind} at {coordinate}");
                summary.succeeded += 1;
            }
            Err(e) => {
                log::error!("{e}");
                summary.failed += 1;
            }
        }
    }
    summary
}
