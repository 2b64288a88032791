//! Lexical support scoring.

use std::collections::HashSet;

/// Lowercased alphanumeric tokens. Single-character fragments carry no
/// signal and are dropped.
pub(crate) fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Containment of the claim's tokens in the reference's tokens:
/// `|claim ∩ reference| / |claim|`. Asymmetric on purpose, a short claim
/// fully covered by a long reference scores 1.0.
pub(crate) fn containment(claim: &HashSet<String>, reference: &HashSet<String>) -> f64 {
    if claim.is_empty() {
        return 0.0;
    }
    let shared = claim.intersection(reference).count();
    shared as f64 / claim.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_lowercased_and_filtered() {
        let tokens = tokenize("The DB runs on port 5432, I think");
        assert!(tokens.contains("the"));
        assert!(tokens.contains("db"));
        assert!(tokens.contains("5432"));
        assert!(!tokens.contains("i"), "single-char tokens must be dropped");
    }

    #[test]
    fn full_containment_scores_one() {
        let claim = tokenize("postgres uses port 5432");
        let reference = tokenize("by default postgres uses tcp port 5432 for connections");
        assert_eq!(containment(&claim, &reference), 1.0);
    }

    #[test]
    fn disjoint_sets_score_zero() {
        let claim = tokenize("redis cluster mode");
        let reference = tokenize("the weather is sunny");
        assert_eq!(containment(&claim, &reference), 0.0);
    }

    #[test]
    fn partial_overlap_is_fractional() {
        let claim = tokenize("alpha beta gamma delta");
        let reference = tokenize("alpha beta something else");
        let score = containment(&claim, &reference);
        assert!((score - 0.5).abs() < 1e-9, "got {score}");
    }
}
