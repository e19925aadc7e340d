use std::collections::HashSet;

use log::info;

use crate::backend::IlpBackend;
use crate::params::{PoolSearchMode, SolverParams};
use crate::problem::{IlpProblem, VarKind};
use crate::simplex::{Bounds, LpSolver};
use crate::solution::{IlpSolution, LpSolution, LpStatus, PoolSolution, SolveStatus};

/// Depth-first branch and bound over LP relaxations
#[derive(Debug, Clone)]
pub struct BranchAndBound {
    lp: LpSolver,
    /// Distance from the nearest integer still accepted as integral
    integrality_tolerance: f64,
    /// Relative tolerance for objective comparisons
    tolerance: f64,
    /// Engine-wide node budget, combined with the per-solve one
    node_limit: Option<usize>,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            lp: LpSolver::default(),
            integrality_tolerance: 1e-6,
            tolerance: 1e-6,
            node_limit: None,
        }
    }
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lp_solver(mut self, lp: LpSolver) -> Self {
        self.lp = lp;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = Some(limit);
        self
    }
}

impl IlpBackend for BranchAndBound {
    fn solve(&self, problem: &IlpProblem, params: &SolverParams) -> IlpSolution {
        let node_limit = match (self.node_limit, params.node_limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let mut search = Search {
            problem,
            lp: &self.lp,
            integrality_tolerance: self.integrality_tolerance,
            tolerance: self.tolerance,
            node_limit,
            nodes: 0,
            interrupted: None,
            output: params.output,
        };
        let root: Vec<Bounds> = problem.variables.iter().map(Bounds::of).collect();

        let incumbent = match search.best(root.clone()) {
            Ok(incumbent) => incumbent,
            Err(status) => return IlpSolution::empty(status),
        };
        let Some(incumbent) = incumbent else {
            return IlpSolution::empty(search.interrupted.unwrap_or(SolveStatus::Infeasible));
        };

        let pool = match params.pool_search {
            PoolSearchMode::Exhaustive if search.interrupted.is_none() => {
                search.enumerate(root, incumbent, params)
            }
            _ => vec![incumbent],
        };

        let status = search.interrupted.unwrap_or(SolveStatus::Optimal);
        if params.output {
            info!(
                "branch and bound finished: status {}, {} nodes, {} pooled solutions",
                status,
                search.nodes,
                pool.len()
            );
        }
        IlpSolution { status, pool }
    }
}

struct Search<'a> {
    problem: &'a IlpProblem,
    lp: &'a LpSolver,
    integrality_tolerance: f64,
    tolerance: f64,
    node_limit: Option<usize>,
    nodes: usize,
    interrupted: Option<SolveStatus>,
    output: bool,
}

impl Search<'_> {
    /// Find one optimal solution. `Err` only when the root relaxation is unbounded.
    fn best(&mut self, root: Vec<Bounds>) -> Result<Option<PoolSolution>, SolveStatus> {
        let mut incumbent: Option<(f64, PoolSolution)> = None;
        let mut stack = vec![root];

        while let Some(bounds) = stack.pop() {
            let Some(relaxation) = self.relax(&bounds) else {
                break;
            };
            match relaxation.status {
                LpStatus::Optimal => {}
                LpStatus::Unbounded if self.nodes == 1 => return Err(SolveStatus::Unbounded),
                _ => continue,
            }

            let bound = self.score(relaxation.objective_value);
            if let Some((best, _)) = &incumbent {
                if bound <= best + self.gap_tolerance(*best) {
                    continue;
                }
            }

            match self.fractional_variable(&relaxation.values) {
                Some((var, value)) => stack.extend(split(&bounds, var, value)),
                None => {
                    let solution = self.snapshot(relaxation.values);
                    if self.output {
                        info!("new incumbent {} after {} nodes", solution.objective_value, self.nodes);
                    }
                    incumbent = Some((bound, solution));
                }
            }
        }

        Ok(incumbent.map(|(_, solution)| solution))
    }

    /// Collect distinct solutions within the pool gap of `incumbent`, best first
    fn enumerate(&mut self, root: Vec<Bounds>, incumbent: PoolSolution, params: &SolverParams) -> Vec<PoolSolution> {
        let optimum = self.score(incumbent.objective_value);
        let threshold = optimum - params.pool_gap * optimum.abs() - self.gap_tolerance(optimum);
        let cap = params.pool_solutions.max(1);

        let mut seen = HashSet::new();
        let mut pool = Vec::new();
        let mut stack = vec![root];

        while let Some(bounds) = stack.pop() {
            if pool.len() >= cap {
                break;
            }
            let Some(relaxation) = self.relax(&bounds) else {
                break;
            };
            if relaxation.status != LpStatus::Optimal || self.score(relaxation.objective_value) < threshold {
                continue;
            }

            if let Some((var, value)) = self.fractional_variable(&relaxation.values) {
                stack.extend(split(&bounds, var, value));
                continue;
            }

            let solution = self.snapshot(relaxation.values);
            if seen.insert(self.pool_key(&solution.values)) {
                pool.push(solution);
            }
            // Other solutions may hide behind the same relaxation
            if let Some(var) = self.free_binary(&bounds) {
                stack.extend(fix(&bounds, var));
            }
        }

        if pool.is_empty() {
            pool.push(incumbent);
        }
        pool.sort_by(|a, b| self.score(b.objective_value).total_cmp(&self.score(a.objective_value)));
        pool
    }

    /// Solve the relaxation at a node, `None` once the node budget is spent
    fn relax(&mut self, bounds: &[Bounds]) -> Option<LpSolution> {
        if self.node_limit.is_some_and(|limit| self.nodes >= limit) {
            self.interrupted = Some(SolveStatus::NodeLimit);
            return None;
        }
        self.nodes += 1;
        let relaxation = self.lp.solve_with_bounds(self.problem, bounds);
        if relaxation.status == LpStatus::IterationLimit {
            self.interrupted.get_or_insert(SolveStatus::IterationLimit);
        }
        Some(relaxation)
    }

    /// Objective in maximization sense
    fn score(&self, objective_value: f64) -> f64 {
        if self.problem.objective.minimize {
            -objective_value
        } else {
            objective_value
        }
    }

    fn gap_tolerance(&self, value: f64) -> f64 {
        self.tolerance * (1.0 + value.abs())
    }

    fn fractional_variable(&self, values: &[f64]) -> Option<(usize, f64)> {
        self.problem
            .variables
            .iter()
            .zip(values)
            .enumerate()
            .find(|(_, (variable, value))| {
                variable.kind.is_integral() && (*value - value.round()).abs() > self.integrality_tolerance
            })
            .map(|(j, (_, &value))| (j, value))
    }

    fn free_binary(&self, bounds: &[Bounds]) -> Option<usize> {
        self.problem
            .variables
            .iter()
            .zip(bounds)
            .position(|(variable, b)| variable.kind == VarKind::Binary && !b.is_fixed())
    }

    /// Solutions differing only in continuous or general-integer variables share a key
    fn pool_key(&self, values: &[f64]) -> Vec<bool> {
        self.problem
            .variables
            .iter()
            .zip(values)
            .filter(|(variable, _)| variable.kind == VarKind::Binary)
            .map(|(_, &value)| value > 0.5)
            .collect()
    }

    fn snapshot(&self, mut values: Vec<f64>) -> PoolSolution {
        for (variable, value) in self.problem.variables.iter().zip(values.iter_mut()) {
            if variable.kind.is_integral() {
                *value = value.round();
            }
        }
        let objective_value = self.problem.objective_value(&values);
        PoolSolution { values, objective_value }
    }
}

/// Children `var <= floor(value)` and `var >= ceil(value)`, the latter popped first
fn split(bounds: &[Bounds], var: usize, value: f64) -> [Vec<Bounds>; 2] {
    let mut down = bounds.to_vec();
    down[var].upper = value.floor();
    let mut up = bounds.to_vec();
    up[var].lower = value.ceil();
    [down, up]
}

/// Children with a binary fixed to 0 and to 1
fn fix(bounds: &[Bounds], var: usize) -> [Vec<Bounds>; 2] {
    let mut zero = bounds.to_vec();
    zero[var] = Bounds { lower: 0.0, upper: 0.0 };
    let mut one = bounds.to_vec();
    one[var] = Bounds { lower: 1.0, upper: 1.0 };
    [zero, one]
}
