use regex::Regex;
use tracing::debug;

use prism_core::errors::ConfigError;
use prism_core::models::ToolInvocation;

use crate::config::ParserConfig;

/// One well-formed block located in the source text.
struct Block {
    /// Whole block, sentinels included.
    span: (usize, usize),
    /// Field lines between the sentinels.
    body: (usize, usize),
}

/// Extracts tool invocations from raw model output.
///
/// Parsing never fails: malformed blocks yield fewer invocations, not
/// errors. Blocks do not nest, and an opened block with no end sentinel
/// before the next start (or end of input) is treated as still streaming
/// and dropped.
pub struct ProtocolParser {
    config: ParserConfig,
    /// `key:「始」value「末」` matcher, markers escaped. `None` only if the
    /// compiled pattern is rejected, in which case every field line falls
    /// back to the plain `key: value` form.
    bracketed_field: Option<Regex>,
}

impl ProtocolParser {
    pub fn new(config: ParserConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pattern = format!(
            r"^([^:]+?):\s*{}(.*?){}\s*$",
            regex::escape(&config.value_open),
            regex::escape(&config.value_close),
        );
        let bracketed_field = Regex::new(&pattern).ok();
        Ok(Self {
            config,
            bracketed_field,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Extract every well-formed invocation, in document order.
    pub fn parse(&self, text: &str) -> Vec<ToolInvocation> {
        let mut invocations = Vec::new();
        for block in self.scan_blocks(text) {
            let body = &text[block.body.0..block.body.1];
            match self.parse_block(body, block.span) {
                Some(invocation) => invocations.push(invocation),
                None => {
                    debug!(
                        span_start = block.span.0,
                        "dropping block without tool_name"
                    );
                }
            }
        }
        invocations
    }

    /// Return the text with every well-formed block removed, for user-facing
    /// display. Still-streaming blocks are left in place; callers typically
    /// poll [`contains_open_block`](Self::contains_open_block) and defer
    /// display until the block closes.
    pub fn strip_blocks(&self, text: &str) -> String {
        let blocks = self.scan_blocks(text);
        if blocks.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for block in &blocks {
            out.push_str(&text[cursor..block.span.0]);
            cursor = block.span.1;
            // Blocks sit on their own lines; eat one trailing newline so
            // removal does not leave a blank gap.
            if text[cursor..].starts_with('\n') {
                cursor += 1;
            }
        }
        out.push_str(&text[cursor..]);
        out
    }

    /// Whether the text ends inside an unterminated block. Streaming callers
    /// use this to hold off parsing while a block is still arriving.
    pub fn contains_open_block(&self, text: &str) -> bool {
        // An unterminated block exists iff the last start sentinel has no
        // end sentinel anywhere after it.
        match text.rfind(&self.config.start_sentinel) {
            None => false,
            Some(s) => {
                let after = s + self.config.start_sentinel.len();
                !text[after..].contains(&self.config.end_sentinel)
            }
        }
    }

    /// Locate every well-formed block. A start sentinel binds to the first
    /// end sentinel after it unless another start sentinel intervenes, in
    /// which case the opened block is dropped and scanning resumes at the
    /// intervening start.
    fn scan_blocks(&self, text: &str) -> Vec<Block> {
        let start = &self.config.start_sentinel;
        let end = &self.config.end_sentinel;
        let mut blocks = Vec::new();
        let mut cursor = 0;

        while let Some(rel) = text[cursor..].find(start.as_str()) {
            let s = cursor + rel;
            let body_start = s + start.len();
            let next_start = text[body_start..].find(start.as_str()).map(|r| body_start + r);
            let block_end = text[body_start..].find(end.as_str()).map(|r| body_start + r);

            match (block_end, next_start) {
                (Some(e), ns) if ns.map_or(true, |n| e < n) => {
                    blocks.push(Block {
                        span: (s, e + end.len()),
                        body: (body_start, e),
                    });
                    cursor = e + end.len();
                }
                (_, Some(n)) => {
                    debug!(span_start = s, "dropping truncated block");
                    cursor = n;
                }
                (_, None) => {
                    debug!(span_start = s, "dropping block open at end of input");
                    break;
                }
            }
        }
        blocks
    }

    /// Parse one block body into an invocation. Returns `None` when no
    /// usable `tool_name` was found.
    fn parse_block(&self, body: &str, span: (usize, usize)) -> Option<ToolInvocation> {
        let mut invocation = ToolInvocation {
            tool_name: String::new(),
            command: String::new(),
            params: Vec::new(),
            source_span: span,
        };

        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = self.match_field(line) else {
                continue;
            };
            match key.as_str() {
                "tool_name" => invocation.tool_name = value,
                "command" => invocation.command = value,
                _ => invocation.set_param(&key, value),
            }
        }

        if invocation.tool_name.is_empty() {
            None
        } else {
            Some(invocation)
        }
    }

    /// Match one field line: the bracketed form first, then plain
    /// `key: value`. Lines without a colon are skipped entirely.
    fn match_field(&self, line: &str) -> Option<(String, String)> {
        if let Some(re) = &self.bracketed_field {
            if let Some(caps) = re.captures(line) {
                let key = caps.get(1)?.as_str().trim();
                let value = caps.get(2)?.as_str();
                if !key.is_empty() {
                    return Some((key.to_string(), value.to_string()));
                }
            }
        }
        let (key, value) = line.split_once(':')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), value.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ProtocolParser {
        ProtocolParser::new(ParserConfig::default()).unwrap()
    }

    #[test]
    fn bracketed_form_wins_over_plain() {
        let p = parser();
        let (key, value) = p.match_field("q:「始」 spaced value 「末」").unwrap();
        assert_eq!(key, "q");
        // Bracketed values keep their inner whitespace.
        assert_eq!(value, " spaced value ");
    }

    #[test]
    fn plain_form_trims_value() {
        let p = parser();
        let (key, value) = p.match_field("q:   hello world  ").unwrap();
        assert_eq!(key, "q");
        assert_eq!(value, "hello world");
    }

    #[test]
    fn line_without_colon_is_skipped() {
        let p = parser();
        assert_eq!(p.match_field("just some prose"), None);
    }

    #[test]
    fn unbalanced_brackets_fall_back_to_plain() {
        let p = parser();
        let (key, value) = p.match_field("q:「始」unclosed").unwrap();
        assert_eq!(key, "q");
        assert_eq!(value, "「始」unclosed");
    }

    #[test]
    fn empty_key_is_rejected() {
        let p = parser();
        assert_eq!(p.match_field(": value"), None);
    }
}
