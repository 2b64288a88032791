use proptest::prelude::*;

use prism_core::config::PurifyConfig;
use prism_purify::{secret_presets, PurifyEngine};

fn full_config() -> PurifyConfig {
    PurifyConfig {
        strip_markup_to_plain_text: true,
        collapse_whitespace: true,
        deduplicate_lines: true,
        max_length: Some(120),
        redact_patterns: secret_presets(),
        ..PurifyConfig::default()
    }
}

fn unbounded_config() -> PurifyConfig {
    PurifyConfig {
        max_length: None,
        ..full_config()
    }
}

// ── Length limit is a hard bound ──────────────────────────────────────────

proptest! {
    #[test]
    fn purified_text_never_exceeds_the_limit(text in ".{0,400}") {
        let engine = PurifyEngine::new(full_config()).unwrap();
        let result = engine.purify(&text);
        prop_assert!(
            result.purified_length <= 120,
            "length {} over limit for {:?}",
            result.purified_length,
            text
        );
        prop_assert_eq!(result.text.chars().count(), result.purified_length);
    }
}

// ── The modification log replays onto the original ────────────────────────

proptest! {
    #[test]
    fn replay_reproduces_the_output(text in ".{0,300}") {
        let engine = PurifyEngine::new(full_config()).unwrap();
        let result = engine.purify(&text);
        let replayed = result.replay(&text);
        prop_assert_eq!(
            replayed.as_deref(),
            Some(result.text.as_str()),
            "log does not replay for {:?}",
            text
        );
    }
}

// ── Purification is idempotent ────────────────────────────────────────────

proptest! {
    #[test]
    fn second_pass_records_no_modifications(
        text in "[a-zA-Z0-9@ ./:<>\\n\\t-]{0,300}"
    ) {
        let engine = PurifyEngine::new(full_config()).unwrap();
        let first = engine.purify(&text);
        let second = engine.purify(&first.text);
        prop_assert!(
            second.is_clean(),
            "second pass changed {:?}: {:?}",
            first.text,
            second.modifications
        );
        prop_assert_eq!(&second.text, &first.text);
    }

    #[test]
    fn idempotent_on_arbitrary_text(text in ".{0,200}") {
        let engine = PurifyEngine::new(unbounded_config()).unwrap();
        let first = engine.purify(&text);
        let second = engine.purify(&first.text);
        prop_assert_eq!(
            &first.text,
            &second.text,
            "not idempotent on {:?}",
            text
        );
    }
}

// ── Redaction leaves no raw matches behind ────────────────────────────────

proptest! {
    #[test]
    fn raw_email_never_survives(user in "[a-z]{3,8}", domain in "[a-z]{3,8}") {
        let email = format!("{user}@{domain}.com");
        let input = format!("contact: {email} please");
        let engine = PurifyEngine::new(full_config()).unwrap();
        let result = engine.purify(&input);
        prop_assert!(
            !result.text.contains(&email),
            "raw address in output: {}",
            result.text
        );
    }

    #[test]
    fn raw_aws_key_never_survives(suffix in "[0-9A-Z]{16}") {
        let key = format!("AKIA{suffix}");
        let input = format!("aws key = {key}");
        let engine = PurifyEngine::new(full_config()).unwrap();
        let result = engine.purify(&input);
        prop_assert!(
            !result.text.contains(&key),
            "raw key in output: {}",
            result.text
        );
    }
}

// ── Markup strip leaves no tags ───────────────────────────────────────────

proptest! {
    #[test]
    fn stripped_output_has_no_angle_brackets(
        soup in "(<[a-z]{1,5}>|[a-z ]{1,10}){0,20}"
    ) {
        let engine = PurifyEngine::new(full_config()).unwrap();
        let result = engine.purify(&soup);
        prop_assert!(
            !result.text.contains('<'),
            "tag leaked through: {:?} -> {:?}",
            soup,
            result.text
        );
    }
}
