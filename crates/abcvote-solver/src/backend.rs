use crate::params::SolverParams;
use crate::problem::IlpProblem;
use crate::solution::IlpSolution;

/// An exact ILP engine.
///
/// Implementations never fail outright: infeasibility, unboundedness and exhausted budgets are
/// reported through [`IlpSolution::status`], together with whatever solutions were pooled.
pub trait IlpBackend {
    fn solve(&self, problem: &IlpProblem, params: &SolverParams) -> IlpSolution;
}

impl<B: IlpBackend + ?Sized> IlpBackend for &B {
    fn solve(&self, problem: &IlpProblem, params: &SolverParams) -> IlpSolution {
        (**self).solve(problem, params)
    }
}

impl<B: IlpBackend + ?Sized> IlpBackend for Box<B> {
    fn solve(&self, problem: &IlpProblem, params: &SolverParams) -> IlpSolution {
        (**self).solve(problem, params)
    }
}
