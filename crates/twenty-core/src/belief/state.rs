use std::cmp::Ordering;

/// Probability per entity, indexed like [`KnowledgeBase::entities`].
///
/// After construction and after every successful update the values sum to
/// 1.0 (an empty state sums to 0).
///
/// [`KnowledgeBase::entities`]: crate::model::knowledge::KnowledgeBase::entities
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefState {
    probs: Vec<f64>,
}

impl BeliefState {
    /// Uniform prior of `1/n` per entity.
    pub fn uniform(entities: usize) -> Self {
        let p = if entities == 0 {
            0.0
        } else {
            1.0 / entities as f64
        };
        Self {
            probs: vec![p; entities],
        }
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn prob(&self, entity: usize) -> f64 {
        self.probs[entity]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }

    pub fn total(&self) -> f64 {
        self.probs.iter().sum()
    }

    /// Multiplies every entry by `likelihood(entity)` and renormalises.
    ///
    /// All-or-nothing: when the unnormalised mass is not a positive finite
    /// number the state is left untouched and `false` is returned.
    pub fn reweight<F>(&mut self, mut likelihood: F) -> bool
    where
        F: FnMut(usize) -> f64,
    {
        let weighted: Vec<f64> = self
            .probs
            .iter()
            .enumerate()
            .map(|(idx, prior)| prior * likelihood(idx))
            .collect();
        let mass: f64 = weighted.iter().sum();
        if !mass.is_finite() || mass <= 0.0 {
            return false;
        }
        for (slot, value) in self.probs.iter_mut().zip(weighted) {
            *slot = value / mass;
        }
        true
    }

    /// Entity indices by descending probability; ties keep catalog order.
    pub fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.probs.len()).collect();
        order.sort_by(|&a, &b| {
            self.probs[b]
                .partial_cmp(&self.probs[a])
                .unwrap_or(Ordering::Equal)
        });
        order
    }

    /// Most probable entity, first in catalog order on ties.
    pub fn leader(&self) -> Option<(usize, f64)> {
        self.ranked().first().map(|&idx| (idx, self.probs[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::BeliefState;

    #[test]
    fn uniform_prior_sums_to_one() {
        let belief = BeliefState::uniform(7);
        assert!((belief.total() - 1.0).abs() < 1e-9);
        assert!((belief.prob(3) - 1.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn empty_state_is_valid() {
        let belief = BeliefState::uniform(0);
        assert!(belief.is_empty());
        assert_eq!(belief.total(), 0.0);
        assert_eq!(belief.leader(), None);
        assert!(belief.ranked().is_empty());
    }

    #[test]
    fn reweight_renormalises() {
        let mut belief = BeliefState::uniform(3);
        assert!(belief.reweight(|idx| if idx == 0 { 0.85 } else { 0.1 }));
        assert!((belief.total() - 1.0).abs() < 1e-9);
        assert!(belief.prob(0) > belief.prob(1));
        assert!((belief.prob(1) - belief.prob(2)).abs() < 1e-12);
    }

    #[test]
    fn degenerate_reweight_keeps_prior() {
        let mut belief = BeliefState::uniform(4);
        let before = belief.clone();
        assert!(!belief.reweight(|_| 0.0));
        assert_eq!(belief, before);
        assert!(!belief.reweight(|_| f64::NAN));
        assert_eq!(belief, before);
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let mut belief = BeliefState::uniform(4);
        belief.reweight(|idx| if idx == 2 { 2.0 } else { 1.0 });
        assert_eq!(belief.ranked(), vec![2, 0, 1, 3]);
        assert_eq!(belief.leader().map(|(idx, _)| idx), Some(2));
    }
}
