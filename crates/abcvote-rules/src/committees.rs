use crate::error::RuleError;
use crate::profile::Profile;

/// Candidate ids in ascending order
pub type Committee = Vec<usize>;

/// Fail unless a committee of `committeesize` approved candidates can be formed
pub fn enough_approved_candidates(profile: &Profile, committeesize: usize) -> Result<(), RuleError> {
    if committeesize == 0 {
        return Err(RuleError::InfeasibleInstance(
            "committeesize must be positive".to_string(),
        ));
    }
    if committeesize > profile.num_cand() {
        return Err(RuleError::InfeasibleInstance(format!(
            "committeesize = {} is larger than the number of candidates ({})",
            committeesize,
            profile.num_cand()
        )));
    }
    let approved = profile.approved_candidates().len();
    if approved < committeesize {
        return Err(RuleError::InfeasibleInstance(format!(
            "committeesize = {} is larger than the number of approved candidates ({})",
            committeesize, approved
        )));
    }
    Ok(())
}

/// Sort each committee, sort the list and drop duplicates
pub fn sort_committees(committees: Vec<Committee>) -> Vec<Committee> {
    let mut committees: Vec<Committee> = committees
        .into_iter()
        .map(|mut committee| {
            committee.sort_unstable();
            committee.dedup();
            committee
        })
        .collect();
    committees.sort();
    committees.dedup();
    committees
}
