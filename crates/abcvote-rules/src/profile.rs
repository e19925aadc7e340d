use std::collections::BTreeSet;

use crate::error::RuleError;

/// An approval ballot cast by `weight` identical voters
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ballot {
    approved: BTreeSet<usize>,
    weight: u32,
}

impl Ballot {
    pub fn new(approved: impl IntoIterator<Item = usize>) -> Self {
        Self::with_weight(approved, 1)
    }

    pub fn with_weight(approved: impl IntoIterator<Item = usize>, weight: u32) -> Self {
        Self {
            approved: approved.into_iter().collect(),
            weight,
        }
    }

    pub fn approved(&self) -> &BTreeSet<usize> {
        &self.approved
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn approves(&self, cand: usize) -> bool {
        self.approved.contains(&cand)
    }

    /// Number of approved candidates that are in `committee`
    pub fn approved_in(&self, committee: &[usize]) -> usize {
        committee.iter().filter(|c| self.approved.contains(c)).count()
    }
}

/// Approval ballots over the candidates `0..num_cand`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Profile {
    num_cand: usize,
    ballots: Vec<Ballot>,
}

impl Profile {
    pub fn new(num_cand: usize) -> Self {
        Self {
            num_cand,
            ballots: Vec::new(),
        }
    }

    pub fn add_ballot(&mut self, ballot: Ballot) -> Result<(), RuleError> {
        if ballot.weight == 0 {
            return Err(RuleError::InvalidBallot("weight must be positive".to_string()));
        }
        if let Some(&cand) = ballot.approved.iter().find(|&&c| c >= self.num_cand) {
            return Err(RuleError::InvalidBallot(format!(
                "candidate {} is out of range (num_cand = {})",
                cand, self.num_cand
            )));
        }
        self.ballots.push(ballot);
        Ok(())
    }

    pub fn add_ballots(&mut self, ballots: impl IntoIterator<Item = Ballot>) -> Result<(), RuleError> {
        for ballot in ballots {
            self.add_ballot(ballot)?;
        }
        Ok(())
    }

    pub fn num_cand(&self) -> usize {
        self.num_cand
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    pub fn has_unit_weights(&self) -> bool {
        self.ballots.iter().all(|b| b.weight == 1)
    }

    /// Number of voters, counting weights
    pub fn total_weight(&self) -> u64 {
        self.ballots.iter().map(|b| u64::from(b.weight)).sum()
    }

    /// Candidates approved by at least one ballot
    pub fn approved_candidates(&self) -> BTreeSet<usize> {
        self.ballots.iter().flat_map(|b| b.approved.iter().copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_queries() {
        let mut profile = Profile::new(4);
        profile
            .add_ballots([Ballot::new([0, 1]), Ballot::with_weight([1, 3], 3)])
            .unwrap();

        assert_eq!(profile.len(), 2);
        assert!(!profile.has_unit_weights());
        assert_eq!(profile.total_weight(), 4);
        assert_eq!(profile.approved_candidates().into_iter().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert!(profile.ballots()[1].approves(3));
        assert_eq!(profile.ballots()[1].approved_in(&[0, 1, 3]), 2);
    }

    #[test]
    fn test_rejects_invalid_ballots() {
        let mut profile = Profile::new(3);
        assert!(matches!(
            profile.add_ballot(Ballot::new([0, 3])),
            Err(RuleError::InvalidBallot(_))
        ));
        assert!(matches!(
            profile.add_ballot(Ballot::with_weight([0], 0)),
            Err(RuleError::InvalidBallot(_))
        ));
        assert!(profile.is_empty());
    }

    #[test]
    fn test_duplicate_approvals_collapse() {
        let ballot = Ballot::new([2, 2, 1]);
        assert_eq!(ballot.approved().len(), 2);
    }
}
