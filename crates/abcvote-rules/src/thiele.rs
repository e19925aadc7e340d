use abcvote_solver::{ConstraintOp, IlpBackend, IlpProblem, VarId};
use log::{debug, warn};
use num_rational::BigRational;

use crate::committees::{Committee, enough_approved_candidates};
use crate::error::RuleError;
use crate::ilp::{IlpOutcome, IlpRules};
use crate::profile::Profile;
use crate::score::{ScoreFunction, thiele_score};

/// ILP whose optimal solutions are the committees maximizing a Thiele score
#[derive(Debug, Clone)]
pub struct ThieleModel {
    pub problem: IlpProblem,
    /// Membership variable per candidate
    pub in_committee: Vec<VarId>,
    /// `utility[v][l - 1]`: ballot `v` has at least `l` approved committee members
    pub utility: Vec<Vec<VarId>>,
}

/// Build the Thiele model for committees of size `committeesize`
pub fn thiele_model(profile: &Profile, committeesize: usize, scorefct: &ScoreFunction) -> ThieleModel {
    let mut problem = IlpProblem::new();

    let in_committee: Vec<VarId> = (0..profile.num_cand())
        .map(|cand| problem.add_binary(format!("in_comm[{}]", cand)))
        .collect();

    // Continuous in [0, 1]; the consistency constraint below makes them integral at an optimum
    let utility: Vec<Vec<VarId>> = (0..profile.len())
        .map(|v| {
            (1..=committeesize)
                .map(|l| problem.add_continuous(format!("utility[{},{}]", v, l), 0.0, 1.0))
                .collect()
        })
        .collect();

    problem.add_constraint(
        "committeesize",
        in_committee.iter().map(|&var| (var, 1.0)).collect(),
        ConstraintOp::Eq,
        committeesize as f64,
    );

    // Levels reached by a ballot = its approved committee members
    for (v, (ballot, levels)) in profile.ballots().iter().zip(&utility).enumerate() {
        let mut coefficients: Vec<(VarId, f64)> = levels.iter().map(|&var| (var, 1.0)).collect();
        coefficients.extend(ballot.approved().iter().map(|&cand| (in_committee[cand], -1.0)));
        problem.add_constraint(format!("utility_consistency[{}]", v), coefficients, ConstraintOp::Eq, 0.0);
    }

    if !scorefct.is_non_increasing(committeesize) {
        warn!(
            "Warning ({}): score function is increasing, optimal committees may not maximize the Thiele score",
            scorefct
        );
    }
    let level_scores: Vec<f64> = (1..=committeesize).map(|l| scorefct.score_f64(l)).collect();
    let objective = profile
        .ballots()
        .iter()
        .zip(&utility)
        .flat_map(|(ballot, levels)| {
            let weight = f64::from(ballot.weight());
            levels
                .iter()
                .zip(&level_scores)
                .map(move |(&var, &score)| (var, score * weight))
        })
        .collect();
    problem.set_objective(objective, false);

    debug!(
        "thiele model ({}): {} variables, {} constraints",
        scorefct,
        problem.num_variables(),
        problem.num_constraints()
    );

    ThieleModel {
        problem,
        in_committee,
        utility,
    }
}

impl<B: IlpBackend> IlpRules<B> {
    /// Committees of size `committeesize` maximizing the Thiele score named by `scorefct_id`.
    /// `resolute` asks for a single committee instead of all optimal ones.
    pub fn thiele(
        &self,
        profile: &Profile,
        committeesize: usize,
        scorefct_id: &str,
        resolute: bool,
    ) -> Result<IlpOutcome, RuleError> {
        enough_approved_candidates(profile, committeesize)?;
        let scorefct = ScoreFunction::parse(scorefct_id, committeesize)?;

        let model = thiele_model(profile, committeesize, &scorefct);
        let mut outcome = self.solve_committees(&model.problem, &model.in_committee, resolute, scorefct_id);
        if !resolute {
            outcome.committees = exact_optima(profile, outcome.committees, &scorefct);
        }
        Ok(outcome)
    }
}

/// Keep the committees whose exact Thiele score is maximal; the solver pool compares floats
/// and may contain near-ties
fn exact_optima(profile: &Profile, committees: Vec<Committee>, scorefct: &ScoreFunction) -> Vec<Committee> {
    let scored: Vec<(BigRational, Committee)> = committees
        .into_iter()
        .map(|committee| (thiele_score(profile, &committee, scorefct), committee))
        .collect();
    let Some(best) = scored.iter().map(|(score, _)| score).max().cloned() else {
        return Vec::new();
    };
    let before = scored.len();
    let optima: Vec<Committee> = scored
        .into_iter()
        .filter(|(score, _)| *score == best)
        .map(|(_, committee)| committee)
        .collect();
    if optima.len() < before {
        debug!("discarded {} near-optimal committees", before - optima.len());
    }
    optima
}

/// [`IlpRules::thiele`] with the default backend and configuration
pub fn compute_thiele_methods_ilp(
    profile: &Profile,
    committeesize: usize,
    scorefct_id: &str,
    resolute: bool,
) -> Result<IlpOutcome, RuleError> {
    IlpRules::new().thiele(profile, committeesize, scorefct_id, resolute)
}
