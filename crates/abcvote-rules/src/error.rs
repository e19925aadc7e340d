use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Scoring function {0} does not exist")]
    UnsupportedScoreFunction(String),
    #[error("Infeasible instance: {0}")]
    InfeasibleInstance(String),
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
    #[error("Invalid ballot: {0}")]
    InvalidBallot(String),
}
