//! Target selection frequencies and ordering

mod common;

use common::{AR40, C12, O16};
use mc_job_driver_core_rs::probability::InteractionProbabilities;
use mc_job_driver_core_rs::{MaterialId, RngManager, Selection, TargetSelector};
use proptest::prelude::*;
use std::collections::HashMap;

const FE56: MaterialId = MaterialId::ion(26, 56);

fn target_of(selection: Selection) -> Option<MaterialId> {
    match selection {
        Selection::Target { material, .. } => Some(material),
        Selection::NoInteraction => None,
    }
}

#[test]
fn test_selection_frequencies_match_probabilities() {
    let probs = InteractionProbabilities::from_entries(vec![(C12, 0.02), (O16, 0.03), (AR40, 0.05)]);
    let selector = TargetSelector::new();
    let mut rng = RngManager::new(8675309);

    let n = 100_000;
    let mut counts: HashMap<MaterialId, u64> = HashMap::new();
    for _ in 0..n {
        let material = target_of(selector.select(&probs, &mut rng)).unwrap();
        *counts.entry(material).or_default() += 1;
    }

    let chi2: f64 = [(C12, 0.2), (O16, 0.3), (AR40, 0.5)]
        .iter()
        .map(|&(m, share)| {
            let expected = share * n as f64;
            let observed = *counts.get(&m).unwrap_or(&0) as f64;
            (observed - expected).powi(2) / expected
        })
        .sum();

    // 99.9% quantile of chi-squared with 2 degrees of freedom
    assert!(chi2 < 13.82, "chi2 = {} (counts {:?})", chi2, counts);
}

#[test]
fn test_selected_probability_is_reported() {
    let probs = InteractionProbabilities::from_entries(vec![(C12, 0.1), (O16, 0.4)]);
    let selection = TargetSelector::new().select_with_uniform(&probs, 0.9);

    assert_eq!(
        selection,
        Selection::Target {
            material: O16,
            probability: 0.4
        }
    );
}

#[test]
fn test_same_seed_same_targets() {
    let probs = InteractionProbabilities::from_entries(vec![(C12, 0.2), (O16, 0.7), (AR40, 0.1)]);
    let selector = TargetSelector::new();
    let mut rng1 = RngManager::new(42);
    let mut rng2 = RngManager::new(42);

    for _ in 0..1000 {
        assert_eq!(selector.select(&probs, &mut rng1), selector.select(&probs, &mut rng2));
    }
}

#[test]
fn test_one_uniform_per_draw() {
    let probs = InteractionProbabilities::from_entries(vec![(C12, 0.2), (O16, 0.7)]);
    let mut rng = RngManager::new(42);
    let mut reference = RngManager::new(42);

    TargetSelector::new().select(&probs, &mut rng);
    reference.next_f64();

    assert_eq!(rng.get_state(), reference.get_state());
}

#[test]
fn test_single_positive_material_always_selected() {
    let probs = InteractionProbabilities::from_entries(vec![(C12, 0.0), (O16, 0.0), (AR40, 1e-9)]);
    let selector = TargetSelector::new();
    let mut rng = RngManager::new(3);

    for _ in 0..1000 {
        assert_eq!(target_of(selector.select(&probs, &mut rng)), Some(AR40));
    }
}

proptest! {
    #[test]
    fn prop_zero_probability_materials_do_not_change_selection(
        weights in prop::collection::vec(0.001f64..1.0, 1..3),
        zero_slot in 0usize..4,
        u in 0.0f64..1.0,
    ) {
        let positives = [C12, O16, AR40];
        let base: Vec<(MaterialId, f64)> = weights.iter().enumerate().map(|(i, w)| (positives[i], *w)).collect();

        let mut padded = base.clone();
        padded.insert(zero_slot.min(padded.len()), (FE56, 0.0));

        let selector = TargetSelector::new();
        let a = selector.select_with_uniform(&InteractionProbabilities::from_entries(base), u);
        let b = selector.select_with_uniform(&InteractionProbabilities::from_entries(padded), u);

        prop_assert_eq!(a, b);
        prop_assert_ne!(target_of(b), Some(FE56));
    }
}
