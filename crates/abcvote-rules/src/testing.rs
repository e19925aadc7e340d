//! Backends that observe or sabotage solver calls.

use std::cell::{Cell, RefCell};

use abcvote_solver::{
    BranchAndBound, IlpBackend, IlpProblem, IlpSolution, PoolSolution, SolveStatus, SolverParams,
};

/// Delegates to [`BranchAndBound`] and records every call
#[derive(Default)]
pub(crate) struct RecordingBackend {
    inner: BranchAndBound,
    calls: Cell<usize>,
    last_params: RefCell<Option<SolverParams>>,
}

impl RecordingBackend {
    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }

    pub(crate) fn last_params(&self) -> Option<SolverParams> {
        self.last_params.borrow().clone()
    }
}

impl IlpBackend for RecordingBackend {
    fn solve(&self, problem: &IlpProblem, params: &SolverParams) -> IlpSolution {
        self.calls.set(self.calls.get() + 1);
        *self.last_params.borrow_mut() = Some(params.clone());
        self.inner.solve(problem, params)
    }
}

/// Gives up with a fixed status and a canned pool
pub(crate) struct StalledBackend {
    pub(crate) status: SolveStatus,
    pub(crate) pool: Vec<Vec<f64>>,
}

impl IlpBackend for StalledBackend {
    fn solve(&self, problem: &IlpProblem, _params: &SolverParams) -> IlpSolution {
        let pool = self
            .pool
            .iter()
            .map(|values| {
                let mut values = values.clone();
                values.resize(problem.num_variables(), 0.0);
                PoolSolution {
                    objective_value: problem.objective_value(&values),
                    values,
                }
            })
            .collect();
        IlpSolution {
            status: self.status,
            pool,
        }
    }
}
