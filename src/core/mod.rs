mod engine;
mod scenario;
mod schedule;
mod tax;
mod types;

pub use engine::run_projection;
pub use scenario::{Scenario, ScenarioOutcome, best_by_wealth, project_scenarios};
pub use types::{
    ChartPoint, Frequency, InvestmentType, ProjectionParameters, ProjectionResult, TaxRule,
};
