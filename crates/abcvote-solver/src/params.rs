/// How many solutions the search collects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSearchMode {
    /// Stop at one optimal solution
    Single,
    /// Enumerate solutions within `pool_gap` of the optimum, up to `pool_solutions`
    Exhaustive,
}

/// Per-solve parameters
#[derive(Debug, Clone)]
pub struct SolverParams {
    /// Log search progress
    pub output: bool,
    pub pool_search: PoolSearchMode,
    /// Maximum number of pooled solutions
    pub pool_solutions: usize,
    /// Relative gap to the optimum admitted into the pool (0 = optimal only)
    pub pool_gap: f64,
    /// Maximum number of branch-and-bound nodes
    pub node_limit: Option<usize>,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            output: false,
            pool_search: PoolSearchMode::Single,
            pool_solutions: 1,
            pool_gap: 0.0,
            node_limit: None,
        }
    }
}

impl SolverParams {
    pub fn single() -> Self {
        Self::default()
    }

    pub fn exhaustive(pool_solutions: usize) -> Self {
        Self {
            pool_search: PoolSearchMode::Exhaustive,
            pool_solutions,
            ..Self::default()
        }
    }

    pub fn with_output(mut self, output: bool) -> Self {
        self.output = output;
        self
    }

    pub fn with_pool_gap(mut self, gap: f64) -> Self {
        self.pool_gap = gap;
        self
    }

    pub fn with_node_limit(mut self, limit: Option<usize>) -> Self {
        self.node_limit = limit;
        self
    }
}
