use proptest::prelude::*;

use prism_protocol::{ParserConfig, ProtocolParser};

const START: &str = "<<<[TOOL_REQUEST]>>>";
const END: &str = "<<<[END_TOOL_REQUEST]>>>";

#[derive(Debug, Clone)]
enum Piece {
    WellFormed { name: String, value: String },
    Truncated { name: String },
}

fn piece() -> impl Strategy<Value = Piece> {
    let name = "[A-Za-z][A-Za-z0-9_]{0,8}";
    prop_oneof![
        (name, "[a-z0-9 ]{0,12}")
            .prop_map(|(name, value)| Piece::WellFormed { name, value }),
        name.prop_map(|name| Piece::Truncated { name }),
    ]
}

/// Filler that cannot collide with the sentinels.
fn filler() -> impl Strategy<Value = String> {
    "[a-z,. \n]{0,20}"
}

fn render(pieces: &[Piece], fillers: &[String]) -> String {
    let mut text = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        text.push_str(fillers.get(i).map_or("", |f| f.as_str()));
        match piece {
            Piece::WellFormed { name, value } => {
                text.push_str(&format!(
                    "{START}\ntool_name: {name}\nq: {value}\n{END}\n"
                ));
            }
            Piece::Truncated { name } => {
                text.push_str(&format!("{START}\ntool_name: {name}\n"));
            }
        }
    }
    text.push_str(fillers.get(pieces.len()).map_or("", |f| f.as_str()));
    text
}

proptest! {
    // ── Well-formed blocks survive any truncated interleaving ─────────────

    #[test]
    fn parse_returns_exactly_the_well_formed_blocks(
        pieces in prop::collection::vec(piece(), 0..6),
        fillers in prop::collection::vec(filler(), 7),
    ) {
        let text = render(&pieces, &fillers);
        let parser = ProtocolParser::new(ParserConfig::default()).unwrap();
        let invocations = parser.parse(&text);

        let expected: Vec<&str> = pieces
            .iter()
            .filter_map(|p| match p {
                Piece::WellFormed { name, .. } => Some(name.as_str()),
                Piece::Truncated { .. } => None,
            })
            .collect();

        let parsed: Vec<&str> = invocations.iter().map(|i| i.tool_name.as_str()).collect();
        prop_assert_eq!(parsed, expected);
    }

    // ── Stripping removes everything parseable ────────────────────────────

    #[test]
    fn stripped_text_has_no_parseable_blocks(
        pieces in prop::collection::vec(piece(), 0..6),
        fillers in prop::collection::vec(filler(), 7),
    ) {
        let text = render(&pieces, &fillers);
        let parser = ProtocolParser::new(ParserConfig::default()).unwrap();
        let stripped = parser.strip_blocks(&text);
        prop_assert!(
            parser.parse(&stripped).is_empty(),
            "stripped text still parses: {stripped:?}"
        );
    }

    // ── Open-block detection tracks the trailing piece ────────────────────

    #[test]
    fn open_block_reported_iff_last_piece_is_truncated(
        pieces in prop::collection::vec(piece(), 1..6),
    ) {
        // No trailing filler so a truncated final piece stays last.
        let text = render(&pieces, &[]);
        let parser = ProtocolParser::new(ParserConfig::default()).unwrap();
        let last_truncated = matches!(pieces.last(), Some(Piece::Truncated { .. }));
        prop_assert_eq!(parser.contains_open_block(&text), last_truncated);
    }

    // ── Parsing never panics on arbitrary input ───────────────────────────

    #[test]
    fn parse_never_panics(text in ".{0,200}") {
        let parser = ProtocolParser::new(ParserConfig::default()).unwrap();
        let _ = parser.parse(&text);
        let _ = parser.strip_blocks(&text);
        let _ = parser.contains_open_block(&text);
    }
}
