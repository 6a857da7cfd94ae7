//! Candidate shortlist: the entities eligible for guessing and gain scoring.

use super::EngineParams;
use twenty_core::belief::BeliefState;

/// Builds the shortlist from the current belief, best first.
///
/// Keeps at least `shortlist_min` entities plus every entity within
/// `shortlist_margin` of the leader. Collapses to the leader alone once it
/// holds `collapse_mass` of the total belief.
pub(crate) fn build(belief: &BeliefState, params: &EngineParams) -> Vec<usize> {
    let ranked = belief.ranked();
    let Some(&leader) = ranked.first() else {
        return Vec::new();
    };

    let best = belief.prob(leader);
    let total = belief.total();
    if total > 0.0 && best / total >= params.collapse_mass {
        return vec![leader];
    }

    let floor = best * (1.0 - params.shortlist_margin);
    ranked
        .into_iter()
        .enumerate()
        .take_while(|&(rank, entity)| rank < params.shortlist_min || belief.prob(entity) >= floor)
        .map(|(_, entity)| entity)
        .collect()
}
