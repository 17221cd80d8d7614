use rayon::prelude::*;
use serde::Serialize;

use super::engine::run_projection;
use super::types::{ProjectionParameters, ProjectionResult};

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub parameters: ProjectionParameters,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: ProjectionResult,
}

/// Projects every scenario independently; outcomes keep the input order.
pub fn project_scenarios(scenarios: &[Scenario]) -> Vec<ScenarioOutcome> {
    scenarios
        .par_iter()
        .map(|scenario| ScenarioOutcome {
            name: scenario.name.clone(),
            result: run_projection(&scenario.parameters),
        })
        .collect()
}

/// Outcome with the highest final wealth; the earliest wins a tie.
pub fn best_by_wealth(outcomes: &[ScenarioOutcome]) -> Option<&ScenarioOutcome> {
    outcomes.iter().reduce(|best, candidate| {
        if candidate.result.total_wealth > best.result.total_wealth {
            candidate
        } else {
            best
        }
    })
}
