use thiserror::Error;

/// Rejections raised while turning raw caller input into `ProjectionParameters`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParameterError {
    #[error("--frequency must be one of 1, 4, 12 or 26 periods per year, got {0}")]
    UnsupportedFrequency(u32),
    #[error("{flag} must be a finite number")]
    NonFinite { flag: &'static str },
    #[error("{flag} must be {requirement}")]
    OutOfRange {
        flag: &'static str,
        requirement: &'static str,
    },
    #[error("scenario name must not be empty")]
    EmptyScenarioName,
    #[error("between 1 and {max} scenarios are required, got {actual}")]
    ScenarioCount { max: usize, actual: usize },
    #[error("{0}")]
    Arguments(String),
    #[error("failed to render projection as JSON: {0}")]
    Render(String),
}
