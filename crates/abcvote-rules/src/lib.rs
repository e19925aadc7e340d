pub mod committees;
pub mod error;
pub mod ilp;
pub mod monroe;
pub mod profile;
pub mod rational;
pub mod score;
pub mod thiele;

#[cfg(test)]
mod testing;

pub use committees::{Committee, enough_approved_candidates, sort_committees};
pub use error::RuleError;
pub use ilp::{DEFAULT_POOL_SOLUTIONS, IlpConfig, IlpOutcome, IlpRules};
pub use monroe::{MonroeModel, compute_monroe_ilp, monroe_model};
pub use profile::{Ballot, Profile};
pub use score::{ScoreFunction, additional_thiele_scores, thiele_score, thiele_score_by_name};
pub use thiele::{ThieleModel, compute_thiele_methods_ilp, thiele_model};
