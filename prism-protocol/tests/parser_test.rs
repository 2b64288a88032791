use prism_protocol::{ParserConfig, ProtocolParser};

fn parser() -> ProtocolParser {
    ProtocolParser::new(ParserConfig::default()).unwrap()
}

// ── Single well-formed block ──────────────────────────────────────────────

#[test]
fn single_block_parses_name_command_and_params() {
    let p = parser();
    let text = "<<<[TOOL_REQUEST]>>>\ntool_name: Foo\ncommand: Bar\nq: hello\n<<<[END_TOOL_REQUEST]>>>";
    let invocations = p.parse(text);

    assert_eq!(invocations.len(), 1);
    let inv = &invocations[0];
    assert_eq!(inv.tool_name, "Foo");
    assert_eq!(inv.command, "Bar");
    assert_eq!(inv.params, vec![("q".to_string(), "hello".to_string())]);
}

#[test]
fn source_span_covers_sentinels() {
    let p = parser();
    let text = "before\n<<<[TOOL_REQUEST]>>>\ntool_name: Foo\n<<<[END_TOOL_REQUEST]>>>\nafter";
    let invocations = p.parse(text);

    assert_eq!(invocations.len(), 1);
    let (start, end) = invocations[0].source_span;
    assert_eq!(&text[start..end], "<<<[TOOL_REQUEST]>>>\ntool_name: Foo\n<<<[END_TOOL_REQUEST]>>>");
}

#[test]
fn bracketed_values_preserve_inner_content() {
    let p = parser();
    let text = "<<<[TOOL_REQUEST]>>>\ntool_name:「始」memory「末」\ncommand:「始」search: advanced「末」\nq:「始」rust editions「末」\n<<<[END_TOOL_REQUEST]>>>";
    let invocations = p.parse(text);

    assert_eq!(invocations.len(), 1);
    let inv = &invocations[0];
    assert_eq!(inv.tool_name, "memory");
    // Bracketed form protects values that themselves contain a colon.
    assert_eq!(inv.command, "search: advanced");
    assert_eq!(inv.param("q"), Some("rust editions"));
}

#[test]
fn repeated_param_key_is_last_write_wins_in_place() {
    let p = parser();
    let text = "<<<[TOOL_REQUEST]>>>\ntool_name: t\na: 1\nb: 2\na: 3\n<<<[END_TOOL_REQUEST]>>>";
    let invocations = p.parse(text);

    assert_eq!(
        invocations[0].params,
        vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
    );
}

// ── Malformed input never errors ──────────────────────────────────────────

#[test]
fn block_without_tool_name_is_dropped() {
    let p = parser();
    let text = "<<<[TOOL_REQUEST]>>>\ncommand: Bar\nq: hello\n<<<[END_TOOL_REQUEST]>>>";
    assert!(p.parse(text).is_empty());
}

#[test]
fn unterminated_block_is_dropped() {
    let p = parser();
    let text = "<<<[TOOL_REQUEST]>>>\ntool_name: Foo\nstill streaming";
    assert!(p.parse(text).is_empty());
}

#[test]
fn truncated_block_does_not_swallow_the_next_one() {
    let p = parser();
    let text = "<<<[TOOL_REQUEST]>>>\ntool_name: Lost\n<<<[TOOL_REQUEST]>>>\ntool_name: Kept\n<<<[END_TOOL_REQUEST]>>>";
    let invocations = p.parse(text);

    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].tool_name, "Kept");
}

#[test]
fn plain_text_yields_nothing() {
    let p = parser();
    assert!(p.parse("no blocks here, just prose with: colons").is_empty());
    assert!(p.parse("").is_empty());
}

#[test]
fn prose_lines_inside_a_block_are_ignored() {
    let p = parser();
    let text = "<<<[TOOL_REQUEST]>>>\nsome explanation first\ntool_name: Foo\n\n  \n<<<[END_TOOL_REQUEST]>>>";
    let invocations = p.parse(text);
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].params.is_empty());
}

// ── Multiple blocks ───────────────────────────────────────────────────────

#[test]
fn multiple_blocks_keep_document_order() {
    let p = parser();
    let text = "\
intro
<<<[TOOL_REQUEST]>>>
tool_name: first
<<<[END_TOOL_REQUEST]>>>
middle
<<<[TOOL_REQUEST]>>>
tool_name: second
command: go
<<<[END_TOOL_REQUEST]>>>
outro";
    let invocations = p.parse(text);

    assert_eq!(invocations.len(), 2);
    assert_eq!(invocations[0].tool_name, "first");
    assert_eq!(invocations[1].tool_name, "second");
    assert!(invocations[0].source_span.1 <= invocations[1].source_span.0);
}

// ── strip_blocks ──────────────────────────────────────────────────────────

#[test]
fn strip_blocks_removes_well_formed_blocks_only() {
    let p = parser();
    let text = "keep this\n<<<[TOOL_REQUEST]>>>\ntool_name: Foo\n<<<[END_TOOL_REQUEST]>>>\nand this";
    assert_eq!(p.strip_blocks(text), "keep this\nand this");
}

#[test]
fn strip_blocks_leaves_streaming_block_in_place() {
    let p = parser();
    let text = "shown\n<<<[TOOL_REQUEST]>>>\ntool_name: partial";
    assert_eq!(p.strip_blocks(text), text);
}

// ── contains_open_block ───────────────────────────────────────────────────

#[test]
fn open_block_is_reported_until_it_closes() {
    let p = parser();
    let open = "answer so far\n<<<[TOOL_REQUEST]>>>\ntool_name: Foo";
    assert!(p.contains_open_block(open));

    let closed = format!("{open}\n<<<[END_TOOL_REQUEST]>>>");
    assert!(!p.contains_open_block(&closed));
    assert!(!p.contains_open_block("no blocks at all"));
}

// ── Custom sentinels ──────────────────────────────────────────────────────

#[test]
fn custom_sentinels_with_regex_metacharacters_work() {
    let config = ParserConfig {
        start_sentinel: "[[TOOL(".to_string(),
        end_sentinel: ")TOOL]]".to_string(),
        ..Default::default()
    };
    let p = ProtocolParser::new(config).unwrap();
    let text = "[[TOOL(\ntool_name: Foo\n)TOOL]]";
    let invocations = p.parse(text);

    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].tool_name, "Foo");
}

#[test]
fn invalid_config_is_rejected() {
    let empty = ParserConfig {
        start_sentinel: String::new(),
        ..Default::default()
    };
    assert!(ProtocolParser::new(empty).is_err());

    let same = ParserConfig {
        start_sentinel: "XXX".to_string(),
        end_sentinel: "XXX".to_string(),
        ..Default::default()
    };
    assert!(ProtocolParser::new(same).is_err());
}
