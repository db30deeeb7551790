//! Hold-out evaluation metrics reported by the trainer.

use crate::activity::{ActivityId, N_ACTIVITIES};

// ---

/// Fraction of predictions equal to the true label. Empty input scores 0.
pub fn accuracy(truth: &[ActivityId], predicted: &[ActivityId]) -> f64 {
    // ---
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}

/// Per-class F1 averaged with weights equal to each class's support in
/// `truth`. Classes with no true or predicted samples contribute 0.
pub fn weighted_f1(truth: &[ActivityId], predicted: &[ActivityId]) -> f64 {
    // ---
    if truth.is_empty() {
        return 0.0;
    }

    let mut tp = [0usize; N_ACTIVITIES];
    let mut fp = [0usize; N_ACTIVITIES];
    let mut fn_ = [0usize; N_ACTIVITIES];
    let mut support = [0usize; N_ACTIVITIES];

    for (t, p) in truth.iter().zip(predicted) {
        let (t, p) = (*t as usize, *p as usize);
        support[t] += 1;
        if t == p {
            tp[t] += 1;
        } else {
            fn_[t] += 1;
            fp[p] += 1;
        }
    }

    let mut total = 0.0;
    for class in 0..N_ACTIVITIES {
        let denom = 2 * tp[class] + fp[class] + fn_[class];
        if denom > 0 {
            let f1 = 2.0 * tp[class] as f64 / denom as f64;
            total += f1 * support[class] as f64;
        }
    }
    total / truth.len() as f64
}
