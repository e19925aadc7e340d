mod backend;
mod branch;
mod params;
mod problem;
mod simplex;
mod solution;

pub use backend::IlpBackend;
pub use branch::BranchAndBound;
pub use params::{PoolSearchMode, SolverParams};
pub use problem::{Constraint, ConstraintOp, IlpProblem, Objective, VarId, VarKind, Variable};
pub use simplex::{Bounds, LpSolver};
pub use solution::{IlpSolution, LpSolution, LpStatus, PoolSolution, SolveStatus};
