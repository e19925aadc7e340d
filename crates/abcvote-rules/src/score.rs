//! Score functions of Thiele methods.
//!
//! A score function maps the number of approved committee members of a voter (counted from 1)
//! to the utility of that member. All values are exact rationals, so tied committees compare
//! equal without floating point noise.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::error::RuleError;
use crate::profile::Profile;
use crate::rational::{parse_rational, rational_root, to_f64};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreFunction {
    /// Approval Voting: every approved member counts 1
    Av,
    /// Chamberlin–Courant: only the first approved member counts
    Cc,
    /// Proportional Approval Voting: the i-th approved member counts 1/i
    Pav,
    /// The i-th approved member counts 1/base^i
    Geom { base: BigRational },
    /// The first `committeesize - ell` approved members count 1.
    /// `ell = committeesize - 1` is Chamberlin–Courant, `ell = 0` is Approval Voting.
    GeneralizedCc { ell: BigRational, committeesize: usize },
    /// The i-th approved member counts i^(1/ell) - (i-1)^(1/ell).
    /// `ell = 1` is Approval Voting; large `ell` approaches Chamberlin–Courant.
    LpAv { ell: BigRational },
}

impl ScoreFunction {
    /// Resolve an identifier such as `pav`, `geom2`, `generalizedcc1` or `lp-av3/2`
    pub fn parse(id: &str, committeesize: usize) -> Result<Self, RuleError> {
        let unsupported = || RuleError::UnsupportedScoreFunction(id.to_string());

        match id {
            "av" => return Ok(ScoreFunction::Av),
            "cc" => return Ok(ScoreFunction::Cc),
            "pav" => return Ok(ScoreFunction::Pav),
            _ => {}
        }

        if let Some(param) = id.strip_prefix("geom") {
            let base = parse_rational(param)
                .filter(|base| base.is_positive())
                .ok_or_else(unsupported)?;
            return Ok(ScoreFunction::Geom { base });
        }
        if let Some(param) = id.strip_prefix("generalizedcc") {
            let ell = parse_rational(param)
                .filter(|ell| !ell.is_negative())
                .ok_or_else(unsupported)?;
            return Ok(ScoreFunction::GeneralizedCc { ell, committeesize });
        }
        if let Some(param) = id.strip_prefix("lp-av") {
            let ell = parse_rational(param)
                .filter(|ell| ell.is_positive())
                .ok_or_else(unsupported)?;
            return Ok(ScoreFunction::LpAv { ell });
        }

        Err(unsupported())
    }

    /// Utility of the `i`-th approved committee member; 0 for `i = 0`
    pub fn score(&self, i: usize) -> BigRational {
        if i == 0 {
            return BigRational::zero();
        }
        match self {
            ScoreFunction::Av => BigRational::one(),
            ScoreFunction::Cc => {
                if i == 1 {
                    BigRational::one()
                } else {
                    BigRational::zero()
                }
            }
            ScoreFunction::Pav => BigRational::new(BigInt::one(), BigInt::from(i)),
            ScoreFunction::Geom { base } => base.pow(i as i32).recip(),
            ScoreFunction::GeneralizedCc { ell, committeesize } => {
                let cutoff = BigRational::from_integer(BigInt::from(*committeesize)) - ell;
                if BigRational::from_integer(BigInt::from(i)) > cutoff {
                    BigRational::zero()
                } else {
                    BigRational::one()
                }
            }
            ScoreFunction::LpAv { ell } => {
                if i == 1 {
                    BigRational::one()
                } else {
                    rational_root(i as u64, ell) - rational_root(i as u64 - 1, ell)
                }
            }
        }
    }

    /// `score(i)` as a float, for solver objectives
    pub fn score_f64(&self, i: usize) -> f64 {
        to_f64(&self.score(i))
    }

    /// Whether `f(1) >= f(2) >= ... >= f(committeesize)`
    pub fn is_non_increasing(&self, committeesize: usize) -> bool {
        let scores: Vec<BigRational> = (1..=committeesize).map(|i| self.score(i)).collect();
        scores.windows(2).all(|pair| pair[0] >= pair[1])
    }

    /// Total utility of a voter with `count` approved committee members
    pub fn cumulative(&self, count: usize) -> BigRational {
        (1..=count).fold(BigRational::zero(), |acc, i| acc + self.score(i))
    }
}

impl fmt::Display for ScoreFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreFunction::Av => write!(f, "av"),
            ScoreFunction::Cc => write!(f, "cc"),
            ScoreFunction::Pav => write!(f, "pav"),
            ScoreFunction::Geom { base } => write!(f, "geom{}", base),
            ScoreFunction::GeneralizedCc { ell, .. } => write!(f, "generalizedcc{}", ell),
            ScoreFunction::LpAv { ell } => write!(f, "lp-av{}", ell),
        }
    }
}

/// Thiele score of `committee`: every ballot contributes `weight * f(1) + ... + weight * f(n)`
/// where `n` is its number of approved committee members
pub fn thiele_score(profile: &Profile, committee: &[usize], scorefct: &ScoreFunction) -> BigRational {
    profile.ballots().iter().fold(BigRational::zero(), |acc, ballot| {
        let count = ballot.approved_in(committee);
        acc + scorefct.cumulative(count) * BigInt::from(ballot.weight())
    })
}

/// [`thiele_score`] with the score function resolved from `scorefct_id`, taking the committee's
/// own size as committee size
pub fn thiele_score_by_name(
    profile: &Profile,
    committee: &[usize],
    scorefct_id: &str,
) -> Result<BigRational, RuleError> {
    let scorefct = ScoreFunction::parse(scorefct_id, committee.len())?;
    Ok(thiele_score(profile, committee, &scorefct))
}

/// Marginal gain of adding each candidate to `committee`, indexed by candidate id.
/// Members of `committee` are ineligible and map to `None`.
pub fn additional_thiele_scores(
    profile: &Profile,
    committee: &[usize],
    scorefct: &ScoreFunction,
) -> Vec<Option<BigRational>> {
    let mut marginal = vec![Some(BigRational::zero()); profile.num_cand()];
    for ballot in profile.ballots() {
        let gain = scorefct.score(ballot.approved_in(committee) + 1) * BigInt::from(ballot.weight());
        for &cand in ballot.approved() {
            if let Some(Some(total)) = marginal.get_mut(cand) {
                *total += &gain;
            }
        }
    }
    for &cand in committee {
        if let Some(slot) = marginal.get_mut(cand) {
            *slot = None;
        }
    }
    marginal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Ballot;
    use proptest::prelude::*;

    fn ratio(numer: i64, denom: i64) -> BigRational {
        BigRational::new(BigInt::from(numer), BigInt::from(denom))
    }

    fn sample_profile() -> Profile {
        let mut profile = Profile::new(4);
        profile
            .add_ballots([
                Ballot::with_weight([0, 1, 2], 2),
                Ballot::new([0]),
                Ballot::new([1, 3]),
            ])
            .unwrap();
        profile
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(ScoreFunction::parse("av", 3).unwrap(), ScoreFunction::Av);
        assert_eq!(ScoreFunction::parse("cc", 3).unwrap(), ScoreFunction::Cc);
        assert_eq!(ScoreFunction::parse("pav", 3).unwrap(), ScoreFunction::Pav);
        assert_eq!(
            ScoreFunction::parse("geom3/2", 3).unwrap(),
            ScoreFunction::Geom { base: ratio(3, 2) }
        );
        assert_eq!(
            ScoreFunction::parse("generalizedcc1", 4).unwrap(),
            ScoreFunction::GeneralizedCc { ell: ratio(1, 1), committeesize: 4 }
        );
        assert_eq!(
            ScoreFunction::parse("lp-av2.5", 3).unwrap(),
            ScoreFunction::LpAv { ell: ratio(5, 2) }
        );
    }

    #[test]
    fn test_unknown_identifier_is_named_in_error() {
        for id in ["bogus", "geom", "geom0", "geomx", "lp-av0", "generalizedcc-1", "PAV"] {
            let err = ScoreFunction::parse(id, 3).unwrap_err();
            assert_eq!(err, RuleError::UnsupportedScoreFunction(id.to_string()));
            assert!(err.to_string().contains(id));
        }
    }

    #[test]
    fn test_display_round_trips_identifier() {
        for id in ["av", "cc", "pav", "geom2", "geom3/2", "generalizedcc1", "lp-av5/2"] {
            let scorefct = ScoreFunction::parse(id, 3).unwrap();
            assert_eq!(scorefct.to_string(), id);
        }
    }

    #[test]
    fn test_score_values() {
        assert_eq!(ScoreFunction::Av.score(3), ratio(1, 1));
        assert_eq!(ScoreFunction::Cc.score(1), ratio(1, 1));
        assert_eq!(ScoreFunction::Cc.score(2), ratio(0, 1));
        assert_eq!(ScoreFunction::Pav.score(4), ratio(1, 4));

        let geom = ScoreFunction::parse("geom2", 3).unwrap();
        assert_eq!(geom.score(1), ratio(1, 2));
        assert_eq!(geom.score(3), ratio(1, 8));

        let gcc = ScoreFunction::parse("generalizedcc1", 4).unwrap();
        let values: Vec<BigRational> = (0..=4).map(|i| gcc.score(i)).collect();
        assert_eq!(values, vec![ratio(0, 1), ratio(1, 1), ratio(1, 1), ratio(1, 1), ratio(0, 1)]);

        // Differences telescope to sqrt(4)
        let lp_av = ScoreFunction::parse("lp-av2", 4).unwrap();
        assert_eq!(lp_av.score(0), ratio(0, 1));
        assert_eq!(lp_av.score(1), ratio(1, 1));
        assert_eq!(lp_av.cumulative(4), ratio(2, 1));
        assert!((lp_av.score_f64(2) - (2f64.sqrt() - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_lp_av_with_ell_one_is_av() {
        let lp_av = ScoreFunction::parse("lp-av1", 5).unwrap();
        for i in 0..=5 {
            assert_eq!(lp_av.score(i), ScoreFunction::Av.score(i));
        }
    }

    #[test]
    fn test_monotonicity() {
        for rule in ["av", "cc", "pav", "geom2", "generalizedcc1", "lp-av2"] {
            let scorefct = ScoreFunction::parse(rule, 4).unwrap();
            assert!(scorefct.is_non_increasing(4), "rule {}", rule);
        }
        let rising = ScoreFunction::parse("geom1/2", 4).unwrap();
        assert!(!rising.is_non_increasing(4));
        // A single level is trivially monotone
        assert!(rising.is_non_increasing(1));
    }

    #[test]
    fn test_thiele_score_matches_manual_sum() {
        let profile = sample_profile();
        let committee = [0, 1, 3];

        let mut manual = BigRational::zero();
        for ballot in profile.ballots() {
            let elected: Vec<usize> = committee.iter().copied().filter(|c| ballot.approves(*c)).collect();
            for rank in 1..=elected.len() {
                manual += ScoreFunction::Pav.score(rank) * BigInt::from(ballot.weight());
            }
        }

        let score = thiele_score(&profile, &committee, &ScoreFunction::Pav);
        assert_eq!(score, manual);
        assert_eq!(score, ratio(11, 2));
        assert_eq!(thiele_score_by_name(&profile, &committee, "pav").unwrap(), ratio(11, 2));
        assert_eq!(thiele_score(&profile, &committee, &ScoreFunction::Av), ratio(7, 1));
        assert_eq!(thiele_score(&profile, &committee, &ScoreFunction::Cc), ratio(4, 1));
    }

    #[test]
    fn test_thiele_score_by_name_unknown() {
        let profile = sample_profile();
        assert_eq!(
            thiele_score_by_name(&profile, &[0, 1], "bogus"),
            Err(RuleError::UnsupportedScoreFunction("bogus".to_string()))
        );
    }

    #[test]
    fn test_additional_thiele_scores() {
        let profile = sample_profile();
        let marginal = additional_thiele_scores(&profile, &[0], &ScoreFunction::Pav);

        assert_eq!(marginal.len(), 4);
        assert_eq!(marginal[0], None);
        assert_eq!(marginal[1], Some(ratio(2, 1)));
        assert_eq!(marginal[2], Some(ratio(1, 1)));
        assert_eq!(marginal[3], Some(ratio(1, 1)));
    }

    #[test]
    fn test_additional_scores_match_score_difference() {
        let profile = sample_profile();
        let committee = [1];
        let marginal = additional_thiele_scores(&profile, &committee, &ScoreFunction::Pav);
        let base = thiele_score(&profile, &committee, &ScoreFunction::Pav);

        for cand in [0, 2, 3] {
            let extended = thiele_score(&profile, &[1, cand], &ScoreFunction::Pav);
            assert_eq!(marginal[cand], Some(extended - &base), "candidate {}", cand);
        }
    }

    proptest! {
        #[test]
        fn prop_every_family_is_zero_at_zero(
            committeesize in 1usize..10,
            base in 1u32..6,
            ell in 1u32..6,
        ) {
            let ids = [
                "av".to_string(),
                "cc".to_string(),
                "pav".to_string(),
                format!("geom{}", base),
                format!("generalizedcc{}", ell - 1),
                format!("lp-av{}", ell),
            ];
            for id in &ids {
                let scorefct = ScoreFunction::parse(id, committeesize).unwrap();
                prop_assert_eq!(scorefct.score(0), BigRational::zero());
                for i in 0..=committeesize {
                    prop_assert!(!scorefct.score(i).is_negative(), "{} at {}", id, i);
                }
            }
        }

        #[test]
        fn prop_pav_is_harmonic(i in 1usize..1000) {
            prop_assert_eq!(ScoreFunction::Pav.score(i), ratio(1, i as i64));
        }

        #[test]
        fn prop_generalizedcc_boundaries(
            (committeesize, i) in (1usize..15).prop_flat_map(|k| (Just(k), 0..=k)),
        ) {
            let as_cc = ScoreFunction::parse(&format!("generalizedcc{}", committeesize - 1), committeesize).unwrap();
            let as_av = ScoreFunction::parse("generalizedcc0", committeesize).unwrap();
            prop_assert_eq!(as_cc.score(i), ScoreFunction::Cc.score(i));
            prop_assert_eq!(as_av.score(i), ScoreFunction::Av.score(i));
        }
    }
}
