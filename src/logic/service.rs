use std::sync::Arc;

use serde::Serialize;

use crate::api::MegaverseApi;
use crate::error::ServiceError;
use crate::logic::{
    orchestrator::{
        clear_grid, place_concurrently, place_sequentially, plan_dependency_order,
        placements_for, PlacementSummary, SkippedCell,
    },
    validator::{self, ValidationReport},
};
use crate::models::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Polyanets, then adjacent soloons, then comeths, one call at a time.
    #[default]
    DependencyOrder,
    /// Every populated goal cell at once, no ordering and no adjacency check.
    Concurrent,
}

/// Wires the remote API to the orchestrator and the validator.
pub struct MegaverseService<A: ?Sized> {
    api: Arc<A>,
}

impl<A> MegaverseService<A>
where
    A: MegaverseApi + ?Sized + 'static,
{
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn goal_grid(&self) -> Result<Grid, ServiceError> {
        let goal = self.api.goal_map().await?;
        Ok(Grid::from_goal(&goal)?)
    }

    pub async fn current_grid(&self) -> Result<Grid, ServiceError> {
        let current = self.api.current_map().await?;
        Ok(Grid::from_current(&current)?)
    }

    /// Fetches the goal grid and places it. Individual placement failures are
    /// logged and counted, never returned.
    pub async fn build_from_goal(&self, mode: BuildMode) -> Result<BuildReport, ServiceError> {
        let goal = self.goal_grid().await?;
        log::info!(
            "goal grid is {}x{} with {} object(s)",
            goal.rows,
            goal.columns,
            goal.populated_count()
        );
        let mut failures = Vec::new();
        let (summary, skipped) = match mode {
            BuildMode::DependencyOrder => {
                let plan = plan_dependency_order(&goal);
                let summary = place_sequentially(self.api.as_ref(), &plan).await;
                (summary, plan.skipped)
            }
            BuildMode::Concurrent => {
                let plan = placements_for(&goal);
                let outcomes = place_concurrently(Arc::clone(&self.api), plan.requests).await;
                failures.extend(
                    outcomes
                        .iter()
                        .filter_map(|o| o.result.as_ref().err().map(ToString::to_string)),
                );
                let summary = PlacementSummary {
                    succeeded: outcomes.len() - failures.len(),
                    failed: failures.len(),
                    skipped: plan.skipped.len(),
                };
                (summary, plan.skipped)
            }
        };
        log::info!(
            "build finished: {} placed, {} failed, {} skipped",
            summary.succeeded,
            summary.failed,
            summary.skipped
        );
        Ok(BuildReport::new(mode, summary, skipped, failures))
    }

    /// Fetches both grids and compares them.
    pub async fn validate(&self) -> Result<ValidationReport, ServiceError> {
        let current = self.api.current_map().await?;
        let goal = self.api.goal_map().await?;
        Ok(validator::validate(Some(&current), Some(&goal))?)
    }

    /// Removes every object currently on the grid.
    pub async fn clear(&self) -> Result<PlacementSummary, ServiceError> {
        let current = self.current_grid().await?;
        let summary = clear_grid(self.api.as_ref(), &current).await;
        log::info!(
            "clear finished: {} removed, {} failed",
            summary.succeeded,
            summary.failed
        );
        Ok(summary)
    }
}

/// Aggregated build result, as printed by the command line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub mode: &'static str,
    pub summary: PlacementSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedCell>,
    /// Per-placement errors; only collected in concurrent mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

impl BuildReport {
    pub fn new(
        mode: BuildMode,
        summary: PlacementSummary,
        skipped: Vec<SkippedCell>,
        failures: Vec<String>,
    ) -> Self {
        let mode = match mode {
            BuildMode::DependencyOrder => "dependency-order",
            BuildMode::Concurrent => "concurrent",
        };
        Self {
            mode,
            summary,
            skipped,
            failures,
        }
    }
}
