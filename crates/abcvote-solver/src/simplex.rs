use crate::problem::{ConstraintOp, IlpProblem, Objective, Variable};
use crate::solution::{LpSolution, LpStatus};

/// Residual artificial value still accepted as feasible after phase 1
const FEASIBILITY_TOLERANCE: f64 = 1e-7;

/// Variable bounds at a branch-and-bound node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn of(variable: &Variable) -> Self {
        Self {
            lower: variable.lower,
            upper: variable.upper,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.upper - self.lower < 0.5
    }
}

/// Simplex solver for the LP relaxation of a problem
#[derive(Debug, Clone)]
pub struct LpSolver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for LpSolver {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: 1e-9,
        }
    }
}

impl LpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the relaxation of `problem` under its own variable bounds
    pub fn solve(&self, problem: &IlpProblem) -> LpSolution {
        let bounds: Vec<Bounds> = problem.variables.iter().map(Bounds::of).collect();
        self.solve_with_bounds(problem, &bounds)
    }

    /// Solve the relaxation using the two-phase simplex method, with integrality dropped
    /// and the variable bounds replaced by `bounds`
    pub fn solve_with_bounds(&self, problem: &IlpProblem, bounds: &[Bounds]) -> LpSolution {
        let Some(rows) = self.standard_rows(problem, bounds) else {
            return LpSolution::infeasible();
        };
        let mut tableau = Tableau::build(&rows, problem.num_variables(), &problem.objective);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::IterationLimit => return LpSolution::iteration_limit(),
                SimplexResult::Infeasible | SimplexResult::Unbounded => return LpSolution::infeasible(),
            }
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return LpSolution::unbounded(),
            SimplexResult::IterationLimit => return LpSolution::iteration_limit(),
            SimplexResult::Infeasible => return LpSolution::infeasible(),
        }

        self.extract_solution(&tableau, problem)
    }

    /// Constraint rows plus one row per finite bound, all with non-negative right-hand sides.
    /// `None` when some lower bound exceeds its upper bound.
    fn standard_rows(&self, problem: &IlpProblem, bounds: &[Bounds]) -> Option<Vec<Row>> {
        let mut rows = Vec::with_capacity(problem.num_constraints() + 2 * bounds.len());

        for c in &problem.constraints {
            let coefficients = c.coefficients.iter().map(|&(var, coef)| (var.index(), coef)).collect();
            rows.push(Row::normalized(coefficients, c.op, c.rhs));
        }

        for (j, b) in bounds.iter().enumerate() {
            if b.lower > b.upper + self.tolerance {
                return None;
            }
            if (b.upper - b.lower).abs() <= self.tolerance {
                rows.push(Row::normalized(vec![(j, 1.0)], ConstraintOp::Eq, b.lower));
                continue;
            }
            if b.lower > self.tolerance {
                rows.push(Row::normalized(vec![(j, 1.0)], ConstraintOp::Ge, b.lower));
            }
            if b.upper.is_finite() {
                rows.push(Row::normalized(vec![(j, 1.0)], ConstraintOp::Le, b.upper));
            }
        }

        Some(rows)
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        // Auxiliary objective: maximize -sum(artificials)
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.n_vars + tableau.n_slack;

        let original = std::mem::replace(&mut tableau.data[n_constraints], vec![0.0; n_cols]);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }

        // Make objective row consistent with basic artificial variables
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1) {
            SimplexResult::Optimal => {}
            SimplexResult::IterationLimit => return SimplexResult::IterationLimit,
            SimplexResult::Unbounded | SimplexResult::Infeasible => return SimplexResult::Infeasible,
        }

        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > FEASIBILITY_TOLERANCE {
                return SimplexResult::Infeasible;
            }
        }

        // Artificials left in the basis sit at zero; pivot them out wherever the row allows it.
        // Rows with no structural entry are redundant and never chosen again.
        for i in 0..n_constraints {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(j) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                tableau.data[i][rhs_col] = 0.0;
                self.pivot(tableau, i, j);
            }
        }

        // Restore original objective and adjust for basic variables
        tableau.data[n_constraints] = original;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns never re-enter
        let exclude_from = tableau.n_vars + tableau.n_slack;
        self.iterate(tableau, exclude_from)
    }

    fn iterate(&self, tableau: &mut Tableau, exclude_from: usize) -> SimplexResult {
        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, exclude_from) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }
        SimplexResult::IterationLimit
    }

    /// Bland's rule: the lowest-index column with a positive reduced cost
    fn find_pivot_column(&self, tableau: &Tableau, exclude_from: usize) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        (0..exclude_from).find(|&j| tableau.data[obj_row][j] > self.tolerance)
    }

    /// Minimum ratio test, ties broken by the lowest basic variable index
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut best: Option<(usize, f64)> = None;
        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col] / val;
            best = match best {
                None => Some((i, ratio)),
                Some((row, min)) => {
                    let tie = (ratio - min).abs() <= self.tolerance;
                    if (!tie && ratio < min) || (tie && tableau.basic_vars[i] < tableau.basic_vars[row]) {
                        Some((i, ratio))
                    } else {
                        Some((row, min))
                    }
                }
            };
        }

        best.map(|(row, _)| row)
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }
        tableau.data[row][col] = 1.0;

        let pivot_row = tableau.data[row].clone();
        for i in 0..n_rows {
            if i == row {
                continue;
            }
            let factor = tableau.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n_cols {
                tableau.data[i][j] -= factor * pivot_row[j];
            }
            tableau.data[i][col] = 0.0;
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &IlpProblem) -> LpSolution {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.data[0].len() - 1;

        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] = tableau.data[i][rhs_col].max(0.0);
            }
        }

        let objective_value = problem.objective_value(&values);

        LpSolution {
            status: LpStatus::Optimal,
            values,
            objective_value,
        }
    }
}

struct Row {
    coefficients: Vec<(usize, f64)>,
    op: ConstraintOp,
    rhs: f64,
}

impl Row {
    fn normalized(coefficients: Vec<(usize, f64)>, op: ConstraintOp, rhs: f64) -> Self {
        if rhs < 0.0 {
            Self {
                coefficients: coefficients.into_iter().map(|(j, coef)| (j, -coef)).collect(),
                op: op.flipped(),
                rhs: -rhs,
            }
        } else {
            Self { coefficients, op, rhs }
        }
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn build(rows: &[Row], n_vars: usize, objective: &Objective) -> Self {
        let n_slack = rows.iter().filter(|r| r.op != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|r| r.op != ConstraintOp::Le).count();

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let mut data = vec![vec![0.0; total_cols]; rows.len() + 1]; // +1 for objective
        let mut basic_vars = vec![0; rows.len()];

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, row) in rows.iter().enumerate() {
            for &(j, coef) in &row.coefficients {
                data[i][j] += coef;
            }
            data[i][total_cols - 1] = row.rhs;

            match row.op {
                ConstraintOp::Le => {
                    data[i][slack_idx] = 1.0;
                    basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Simplex maximizes, so minimization objectives are negated
        let obj_row = rows.len();
        for &(var, coef) in &objective.coefficients {
            data[obj_row][var.index()] += if objective.minimize { -coef } else { coef };
        }

        Self {
            data,
            basic_vars,
            n_vars,
            n_slack,
            n_artificial,
        }
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::IlpProblem;

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = IlpProblem::new();
        let x = problem.add_continuous("x", 0.0, 3.0);
        let y = problem.add_continuous("y", 0.0, 3.0);
        problem.set_objective(vec![(x, 3.0), (y, 2.0)], false);
        problem.add_constraint("sum", vec![(x, 1.0), (y, 1.0)], ConstraintOp::Le, 4.0);

        let solution = LpSolver::new().solve(&problem);

        assert_eq!(solution.status, LpStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = IlpProblem::new();
        let x = problem.add_continuous("x", 0.0, f64::INFINITY);
        let y = problem.add_continuous("y", 0.0, f64::INFINITY);
        problem.set_objective(vec![(x, 2.0), (y, 3.0)], true);
        problem.add_constraint("sum", vec![(x, 1.0), (y, 1.0)], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![(x, 1.0)], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![(y, 1.0)], ConstraintOp::Le, 3.0);

        let solution = LpSolver::new().solve(&problem);

        assert_eq!(solution.status, LpStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        let mut problem = IlpProblem::new();
        let x = problem.add_continuous("x", 0.0, f64::INFINITY);
        problem.set_objective(vec![(x, 1.0)], true);
        problem.add_constraint("lower", vec![(x, 1.0)], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![(x, 1.0)], ConstraintOp::Le, 3.0);

        let solution = LpSolver::new().solve(&problem);

        assert_eq!(solution.status, LpStatus::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let mut problem = IlpProblem::new();
        let x = problem.add_continuous("x", 0.0, f64::INFINITY);
        let y = problem.add_continuous("y", 0.0, f64::INFINITY);
        problem.set_objective(vec![(x, 1.0)], false);
        problem.add_constraint("diff", vec![(x, 1.0), (y, -1.0)], ConstraintOp::Le, 2.0);

        let solution = LpSolver::new().solve(&problem);

        assert_eq!(solution.status, LpStatus::Unbounded);
    }

    #[test]
    fn test_negative_rhs_and_degenerate_equality() {
        // Maximize x + y
        //   x + y - z = 0
        //   z - 2w >= -1    (z <= 1 + 2w)
        //   w <= 1
        // Optimal: obj = 3
        let mut problem = IlpProblem::new();
        let x = problem.add_continuous("x", 0.0, 1.0);
        let y = problem.add_continuous("y", 0.0, 2.0);
        let z = problem.add_continuous("z", 0.0, f64::INFINITY);
        let w = problem.add_continuous("w", 0.0, 1.0);
        problem.set_objective(vec![(x, 1.0), (y, 1.0)], false);
        problem.add_constraint("link", vec![(x, 1.0), (y, 1.0), (z, -1.0)], ConstraintOp::Eq, 0.0);
        problem.add_constraint("cap", vec![(z, -1.0), (w, 2.0)], ConstraintOp::Ge, -1.0);

        let solution = LpSolver::new().solve(&problem);

        assert_eq!(solution.status, LpStatus::Optimal);
        assert!((solution.objective_value - 3.0).abs() < 1e-6, "obj = {}", solution.objective_value);
        for c in &problem.constraints {
            assert!(c.is_satisfied(&solution.values, 1e-6), "{} violated", c.name);
        }
    }

    #[test]
    fn test_node_bounds_override_problem_bounds() {
        let mut problem = IlpProblem::new();
        let x = problem.add_continuous("x", 0.0, 10.0);
        problem.set_objective(vec![(x, 1.0)], false);

        let solver = LpSolver::new();
        let solution = solver.solve_with_bounds(&problem, &[Bounds { lower: 2.0, upper: 4.0 }]);
        assert_eq!(solution.status, LpStatus::Optimal);
        assert!((solution.values[0] - 4.0).abs() < 1e-6);

        let crossed = solver.solve_with_bounds(&problem, &[Bounds { lower: 5.0, upper: 4.0 }]);
        assert_eq!(crossed.status, LpStatus::Infeasible);
    }
}
