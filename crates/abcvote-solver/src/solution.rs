use std::fmt;

use crate::problem::VarId;

/// The result of solving an LP relaxation
#[derive(Debug, Clone)]
pub struct LpSolution {
    /// Solution status
    pub status: LpStatus,
    /// Optimal values for each variable
    pub values: Vec<f64>,
    /// Optimal objective value (in the problem's own sense)
    pub objective_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot budget ran out before optimality was proved
    IterationLimit,
}

impl LpSolution {
    pub fn infeasible() -> Self {
        Self::empty(LpStatus::Infeasible, f64::NAN)
    }

    pub fn unbounded() -> Self {
        Self::empty(LpStatus::Unbounded, f64::INFINITY)
    }

    pub fn iteration_limit() -> Self {
        Self::empty(LpStatus::IterationLimit, f64::NAN)
    }

    fn empty(status: LpStatus, objective_value: f64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value,
        }
    }
}

/// Terminal status of an integer solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SolveStatus {
    /// Optimality was proved; the pool holds only optimal solutions
    Optimal,
    /// No integral solution exists
    Infeasible,
    /// The relaxation is unbounded
    Unbounded,
    /// An LP relaxation exhausted its pivot budget
    IterationLimit,
    /// The branch-and-bound node budget was exhausted
    NodeLimit,
}

impl SolveStatus {
    /// Numeric status code, stable across releases
    pub fn code(self) -> u8 {
        match self {
            SolveStatus::Optimal => 2,
            SolveStatus::Infeasible => 3,
            SolveStatus::Unbounded => 5,
            SolveStatus::IterationLimit => 7,
            SolveStatus::NodeLimit => 8,
        }
    }

    pub fn is_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::IterationLimit => "iteration limit",
            SolveStatus::NodeLimit => "node limit",
        };
        write!(f, "{}", name)
    }
}

/// One entry of the solution pool
#[derive(Debug, Clone)]
pub struct PoolSolution {
    /// Values for each variable, integral variables rounded
    pub values: Vec<f64>,
    pub objective_value: f64,
}

/// The result of solving an ILP problem
#[derive(Debug, Clone)]
pub struct IlpSolution {
    pub status: SolveStatus,
    /// Solutions found, best objective first
    pub pool: Vec<PoolSolution>,
}

impl IlpSolution {
    pub fn empty(status: SolveStatus) -> Self {
        Self {
            status,
            pool: Vec::new(),
        }
    }

    pub fn solution_count(&self) -> usize {
        self.pool.len()
    }

    /// Value of `var` in the `solution`-th pool entry
    pub fn value(&self, solution: usize, var: VarId) -> Option<f64> {
        self.pool.get(solution)?.values.get(var.index()).copied()
    }

    pub fn best(&self) -> Option<&PoolSolution> {
        self.pool.first()
    }
}
