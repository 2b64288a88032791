use proptest::prelude::*;

use prism_core::config::{RevisionStyle, SuppressorConfig};
use prism_core::models::KnowledgeReference;
use prism_suppress::{SuppressionContext, SuppressionEngine};

fn knowledge_base() -> Vec<KnowledgeReference> {
    vec![
        KnowledgeReference {
            id: "kb1".into(),
            content: "the retrieval service fuses ranked lists from several backends".into(),
            source: "test".into(),
            embedding: None,
        },
        KnowledgeReference {
            id: "kb2".into(),
            content: "configuration is parsed from toml and validated before use".into(),
            source: "test".into(),
            embedding: None,
        },
    ]
}

fn ctx(kb: &[KnowledgeReference]) -> SuppressionContext<'_> {
    SuppressionContext {
        conversation_history: &[],
        knowledge_base: kb,
        user_query: "",
    }
}

// ── Score bounds ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn overall_confidence_stays_in_unit_range(text in ".{0,200}") {
        let kb = knowledge_base();
        let engine = SuppressionEngine::new(SuppressorConfig::default()).unwrap();
        let result = engine.suppress(&text, &ctx(&kb));
        prop_assert!(
            (0.0..=1.0).contains(&result.overall_confidence),
            "confidence {} out of range",
            result.overall_confidence
        );
        for d in &result.detections {
            prop_assert!((0.0..=1.0).contains(&d.confidence));
        }
    }

    #[test]
    fn detection_spans_index_the_original(text in "[a-zA-Z .!?\\n]{0,200}") {
        let kb = knowledge_base();
        let engine = SuppressionEngine::new(SuppressorConfig::default()).unwrap();
        let result = engine.suppress(&text, &ctx(&kb));
        for d in &result.detections {
            prop_assert_eq!(
                &text[d.span.0..d.span.1],
                d.claim_text.as_str(),
                "span does not address its claim"
            );
        }
    }
}

// ── Revision discipline ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn no_rewrite_unless_auto_revise_is_on(text in ".{0,200}") {
        let kb = knowledge_base();
        let engine = SuppressionEngine::new(SuppressorConfig::default()).unwrap();
        let result = engine.suppress(&text, &ctx(&kb));
        prop_assert!(!result.was_modified);
        prop_assert_eq!(result.revised_text, text);
    }

    #[test]
    fn hedge_marks_exactly_the_detections(text in "[a-z .]{0,200}") {
        let kb = knowledge_base();
        let engine = SuppressionEngine::new(SuppressorConfig {
            auto_revise: true,
            revision_style: RevisionStyle::Hedge,
            min_overall_confidence: 1.0,
            ..SuppressorConfig::default()
        })
        .unwrap();
        let result = engine.suppress(&text, &ctx(&kb));
        let markers = result.revised_text.matches("(unverified)").count();
        prop_assert_eq!(
            markers,
            result.detections.len(),
            "marker count diverges from detections in {:?}",
            result.revised_text
        );
    }
}
