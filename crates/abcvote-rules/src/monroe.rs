use abcvote_solver::{ConstraintOp, IlpBackend, IlpProblem, VarId};
use log::debug;

use crate::committees::enough_approved_candidates;
use crate::error::RuleError;
use crate::ilp::{IlpOutcome, IlpRules};
use crate::profile::Profile;

/// ILP whose optimal solutions are Monroe committees with their voter partitions
#[derive(Debug, Clone)]
pub struct MonroeModel {
    pub problem: IlpProblem,
    /// Membership variable per candidate
    pub in_committee: Vec<VarId>,
    /// `partition[c][v]`: weight of ballot `v` represented by candidate `c`
    pub partition: Vec<Vec<VarId>>,
    /// Approval weight represented by the committee (the objective)
    pub satisfaction: VarId,
}

/// Build the Monroe model. Every elected candidate represents between `floor(V/k)` and
/// `ceil(V/k)` voters, where `V` is the total voter weight and `k = committeesize > 0`.
pub fn monroe_model(profile: &Profile, committeesize: usize) -> MonroeModel {
    debug_assert!(committeesize > 0);
    let num_voters = profile.total_weight();
    let k = committeesize.max(1) as u64;
    let min_group = (num_voters / k) as f64;
    let max_group = num_voters.div_ceil(k) as f64;
    // Big-M that switches the group bounds off for unelected candidates
    let big_m = num_voters as f64;

    let mut problem = IlpProblem::new();

    let satisfaction = problem.add_integer("satisfaction", 0.0, f64::INFINITY);

    let in_committee: Vec<VarId> = (0..profile.num_cand())
        .map(|cand| problem.add_binary(format!("in_comm[{}]", cand)))
        .collect();
    problem.add_constraint(
        "committeesize",
        in_committee.iter().map(|&var| (var, 1.0)).collect(),
        ConstraintOp::Eq,
        committeesize as f64,
    );

    let partition: Vec<Vec<VarId>> = (0..profile.num_cand())
        .map(|cand| {
            (0..profile.len())
                .map(|v| problem.add_integer(format!("partition[{},{}]", cand, v), 0.0, f64::INFINITY))
                .collect()
        })
        .collect();

    // Every voter belongs to some group
    for (v, ballot) in profile.ballots().iter().enumerate() {
        problem.add_constraint(
            format!("voter_assigned[{}]", v),
            partition.iter().map(|groups| (groups[v], 1.0)).collect(),
            ConstraintOp::Eq,
            f64::from(ballot.weight()),
        );
    }

    for (cand, (&member, groups)) in in_committee.iter().zip(&partition).enumerate() {
        let group_with = |membership: f64| -> Vec<(VarId, f64)> {
            groups
                .iter()
                .map(|&var| (var, 1.0))
                .chain(std::iter::once((member, membership)))
                .collect()
        };
        // |group| >= floor(V/k) - V * (1 - in_comm)
        problem.add_constraint(
            format!("min_group[{}]", cand),
            group_with(-big_m),
            ConstraintOp::Ge,
            min_group - big_m,
        );
        // |group| <= ceil(V/k) + V * (1 - in_comm)
        problem.add_constraint(
            format!("max_group[{}]", cand),
            group_with(big_m),
            ConstraintOp::Le,
            max_group + big_m,
        );
        // |group| <= V * in_comm
        problem.add_constraint(
            format!("unelected_empty[{}]", cand),
            group_with(-big_m),
            ConstraintOp::Le,
            0.0,
        );
    }

    // satisfaction <= approval weight represented by the groups
    let mut represented = vec![(satisfaction, 1.0)];
    for (cand, groups) in partition.iter().enumerate() {
        for (ballot, &var) in profile.ballots().iter().zip(groups) {
            if ballot.approves(cand) {
                represented.push((var, -1.0));
            }
        }
    }
    problem.add_constraint("satisfaction", represented, ConstraintOp::Le, 0.0);

    problem.set_objective(vec![(satisfaction, 1.0)], false);

    debug!(
        "monroe model: {} variables, {} constraints",
        problem.num_variables(),
        problem.num_constraints()
    );

    MonroeModel {
        problem,
        in_committee,
        partition,
        satisfaction,
    }
}

impl<B: IlpBackend> IlpRules<B> {
    /// Monroe committees of size `committeesize`; only defined for unit weights.
    /// `resolute` asks for a single committee instead of all optimal ones.
    pub fn monroe(&self, profile: &Profile, committeesize: usize, resolute: bool) -> Result<IlpOutcome, RuleError> {
        enough_approved_candidates(profile, committeesize)?;
        if !profile.has_unit_weights() {
            return Err(RuleError::UnsupportedInput(
                "Monroe is only defined for unit weights (weight=1)".to_string(),
            ));
        }

        let model = monroe_model(profile, committeesize);
        Ok(self.solve_committees(&model.problem, &model.in_committee, resolute, "Monroe"))
    }
}

/// [`IlpRules::monroe`] with the default backend and configuration
pub fn compute_monroe_ilp(profile: &Profile, committeesize: usize, resolute: bool) -> Result<IlpOutcome, RuleError> {
    IlpRules::new().monroe(profile, committeesize, resolute)
}
