//! Expected information gain of asking an attribute, restricted to the
//! shortlist.

use std::collections::BTreeSet;
use twenty_core::belief::BeliefState;
use twenty_core::model::knowledge::KnowledgeBase;
use twenty_core::model::truth::Truth;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoredAttribute {
    pub attribute: usize,
    pub gain: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Group {
    members: usize,
    mass: f64,
}

impl Group {
    fn entropy(self) -> f64 {
        if self.members == 0 {
            0.0
        } else {
            (self.members as f64).log2()
        }
    }
}

/// Gain in bits, or `None` when the attribute does not split the shortlist
/// into both a yes and a no group.
pub(crate) fn information_gain(
    kb: &KnowledgeBase,
    belief: &BeliefState,
    shortlist: &[usize],
    attribute: usize,
) -> Option<f64> {
    let mut yes = Group::default();
    let mut no = Group::default();
    let mut unknown = Group::default();

    for &entity in shortlist {
        let group = match kb.truth(entity, attribute) {
            Truth::True => &mut yes,
            Truth::False => &mut no,
            Truth::Unknown => &mut unknown,
        };
        group.members += 1;
        group.mass += belief.prob(entity);
    }

    if yes.members == 0 || no.members == 0 {
        return None;
    }

    let groups = [yes, no, unknown];
    let total_mass: f64 = groups.iter().map(|g| g.mass).sum();
    let weight = |group: &Group| {
        if total_mass > 0.0 {
            group.mass / total_mass
        } else {
            group.members as f64 / shortlist.len() as f64
        }
    };

    let prior = (shortlist.len() as f64).log2();
    let expected: f64 = groups.iter().map(|g| weight(g) * g.entropy()).sum();
    Some(prior - expected)
}

/// Highest-gain attribute not yet asked. Candidates are the attributes
/// recorded on at least one shortlisted entity, scanned in catalog order;
/// only a strictly higher gain replaces the current best.
pub(crate) fn best_attribute(
    kb: &KnowledgeBase,
    belief: &BeliefState,
    shortlist: &[usize],
    asked: &BTreeSet<usize>,
) -> Option<ScoredAttribute> {
    let candidates: BTreeSet<usize> = shortlist
        .iter()
        .flat_map(|&entity| kb.known_attributes(entity))
        .filter(|attribute| !asked.contains(attribute))
        .collect();

    let mut best: Option<ScoredAttribute> = None;
    for attribute in candidates {
        let Some(gain) = information_gain(kb, belief, shortlist, attribute) else {
            continue;
        };
        if best.is_none_or(|current| gain > current.gain) {
            best = Some(ScoredAttribute { attribute, gain });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::from_json_str(
            r#"{
                "a": { "half": true,  "one": true,  "same": true, "sparse": true },
                "b": { "half": true,  "one": false, "same": true },
                "c": { "half": false, "one": false, "same": true },
                "d": { "half": false, "one": false, "same": true, "sparse": false }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn even_split_gains_one_bit() {
        let kb = kb();
        let belief = BeliefState::uniform(kb.len());
        let shortlist = [0, 1, 2, 3];
        let half = kb.attribute_index("half").unwrap();
        let gain = information_gain(&kb, &belief, &shortlist, half).unwrap();
        assert!((gain - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_splitting_attribute_is_skipped() {
        let kb = kb();
        let belief = BeliefState::uniform(kb.len());
        let same = kb.attribute_index("same").unwrap();
        assert_eq!(information_gain(&kb, &belief, &[0, 1, 2, 3], same), None);

        let one = kb.attribute_index("one").unwrap();
        assert_eq!(information_gain(&kb, &belief, &[1, 2], one), None);
    }

    #[test]
    fn unknown_group_counts_towards_expected_entropy() {
        let kb = kb();
        let belief = BeliefState::uniform(kb.len());
        let sparse = kb.attribute_index("sparse").unwrap();
        // yes {a}, no {d}, unknown {b, c}: 2 - 0.5 * log2(2)
        let gain = information_gain(&kb, &belief, &[0, 1, 2, 3], sparse).unwrap();
        assert!((gain - 1.5).abs() < 1e-12);
    }

    #[test]
    fn groups_are_weighted_by_belief_mass() {
        let kb = kb();
        let mut belief = BeliefState::uniform(kb.len());
        assert!(belief.reweight(|idx| if idx == 0 { 7.0 } else { 1.0 }));
        let one = kb.attribute_index("one").unwrap();
        // yes {a} holds 0.7 of the mass, no {b, c, d} holds 0.3.
        let gain = information_gain(&kb, &belief, &[0, 1, 2, 3], one).unwrap();
        let expected = 2.0 - 0.3 * 3f64.log2();
        assert!((gain - expected).abs() < 1e-9);
    }

    #[test]
    fn best_attribute_prefers_highest_gain_then_catalog_order() {
        let kb = kb();
        let belief = BeliefState::uniform(kb.len());
        let shortlist = [0, 1, 2, 3];

        let best = best_attribute(&kb, &belief, &shortlist, &BTreeSet::new()).unwrap();
        assert_eq!(kb.attribute_name(best.attribute), "sparse");

        let asked: BTreeSet<usize> = [kb.attribute_index("sparse").unwrap()].into();
        let best = best_attribute(&kb, &belief, &shortlist, &asked).unwrap();
        assert_eq!(kb.attribute_name(best.attribute), "half");
    }

    #[test]
    fn nothing_left_to_ask() {
        let kb = kb();
        let belief = BeliefState::uniform(kb.len());
        let asked: BTreeSet<usize> = (0..kb.attribute_count()).collect();
        assert_eq!(best_attribute(&kb, &belief, &[0, 1, 2, 3], &asked), None);
    }
}
