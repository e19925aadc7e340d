use abcvote_solver::{BranchAndBound, IlpBackend, IlpProblem, SolveStatus, SolverParams, VarId};
use log::warn;

use crate::committees::{Committee, sort_committees};

/// Cap on the number of optimal committees enumerated in non-resolute mode
pub const DEFAULT_POOL_SOLUTIONS: usize = 100;

/// Membership values at or above this count as elected
const MEMBERSHIP_THRESHOLD: f64 = 0.99;

/// Solver configuration shared by all ILP rules
#[derive(Debug, Clone, PartialEq)]
pub struct IlpConfig {
    /// Maximum number of optimal committees collected when not resolute
    pub pool_solutions: usize,
    /// Branch-and-bound node budget
    pub node_limit: Option<usize>,
    /// Let the solver log its progress
    pub output: bool,
}

impl Default for IlpConfig {
    fn default() -> Self {
        Self {
            pool_solutions: DEFAULT_POOL_SOLUTIONS,
            node_limit: None,
            output: false,
        }
    }
}

impl IlpConfig {
    pub fn with_pool_solutions(mut self, pool_solutions: usize) -> Self {
        self.pool_solutions = pool_solutions;
        self
    }

    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn with_output(mut self, output: bool) -> Self {
        self.output = output;
        self
    }

    /// One optimal solution when resolute, otherwise every optimal solution up to the pool cap
    pub fn solver_params(&self, resolute: bool) -> SolverParams {
        let params = if resolute {
            SolverParams::single()
        } else {
            SolverParams::exhaustive(self.pool_solutions).with_pool_gap(0.0)
        };
        params.with_output(self.output).with_node_limit(self.node_limit)
    }
}

/// Winning committees together with the solver's verdict.
///
/// When `status` is not optimal the committees are a best effort and may be incomplete or
/// sub-optimal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IlpOutcome {
    pub committees: Vec<Committee>,
    pub status: SolveStatus,
}

impl IlpOutcome {
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }
}

/// Runs committee rules against an ILP backend
#[derive(Debug, Clone)]
pub struct IlpRules<B = BranchAndBound> {
    backend: B,
    config: IlpConfig,
}

impl IlpRules<BranchAndBound> {
    pub fn new() -> Self {
        Self::with_backend(BranchAndBound::new())
    }
}

impl Default for IlpRules<BranchAndBound> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: IlpBackend> IlpRules<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            config: IlpConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IlpConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &IlpConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Solve `problem` and read one committee off every pooled solution
    pub(crate) fn solve_committees(
        &self,
        problem: &IlpProblem,
        in_committee: &[VarId],
        resolute: bool,
        rule: &str,
    ) -> IlpOutcome {
        let params = self.config.solver_params(resolute);
        let solution = self.backend.solve(problem, &params);

        if !solution.status.is_optimal() {
            warn!(
                "Warning ({}): solutions may be incomplete or not optimal (solver status {}: {})",
                rule,
                solution.status.code(),
                solution.status
            );
        }

        let wanted = if resolute { 1 } else { solution.solution_count() };
        let committees = solution
            .pool
            .iter()
            .take(wanted)
            .map(|sol| {
                in_committee
                    .iter()
                    .enumerate()
                    .filter(|(_, var)| {
                        sol.values
                            .get(var.index())
                            .is_some_and(|&value| value >= MEMBERSHIP_THRESHOLD)
                    })
                    .map(|(cand, _)| cand)
                    .collect()
            })
            .collect();

        IlpOutcome {
            committees: sort_committees(committees),
            status: solution.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abcvote_solver::PoolSearchMode;

    #[test]
    fn test_solver_params() {
        let config = IlpConfig::default();

        let resolute = config.solver_params(true);
        assert_eq!(resolute.pool_search, PoolSearchMode::Single);
        assert!(!resolute.output);

        let all = config.solver_params(false);
        assert_eq!(all.pool_search, PoolSearchMode::Exhaustive);
        assert_eq!(all.pool_solutions, 100);
        assert_eq!(all.pool_gap, 0.0);
        assert!(!all.output);

        let limited = config.with_node_limit(50).with_pool_solutions(5).solver_params(false);
        assert_eq!(limited.node_limit, Some(50));
        assert_eq!(limited.pool_solutions, 5);
    }
}
