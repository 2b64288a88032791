use serde::{Deserialize, Serialize};

/// What a single purification step did to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    /// Markup stripped or converted to markdown.
    Markup,
    /// A pattern match replaced with its placeholder.
    Redact,
    /// A whitespace run collapsed.
    Whitespace,
    /// A duplicate line removed.
    Dedup,
    /// Text cut at the length limit.
    Truncate,
}

/// One recorded change. Positions are byte offsets into the text as it
/// stood after all earlier modifications, so replaying the list in order
/// against the original reproduces the purified text exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub kind: ModificationKind,
    /// The text that was replaced.
    pub original_snippet: String,
    /// What it became. Empty for pure removals.
    pub replacement: String,
    /// Byte offset of the change in the evolving text.
    pub position: usize,
}

/// Outcome of a purification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurifyResult {
    /// Character count of the input.
    pub original_length: usize,
    /// Character count of the output.
    pub purified_length: usize,
    /// The purified text.
    pub text: String,
    /// Ordered change log. Empty when no transform touched the text.
    pub modifications: Vec<Modification>,
}

impl PurifyResult {
    /// Whether the pass changed anything.
    pub fn is_clean(&self) -> bool {
        self.modifications.is_empty()
    }

    /// Replay the modification log against the original input.
    ///
    /// Each entry's position addresses the text as already altered by
    /// earlier entries. Returns `None` if the log does not line up with
    /// the given original, which indicates the log was produced from a
    /// different input.
    pub fn replay(&self, original: &str) -> Option<String> {
        let mut text = original.to_string();
        for m in &self.modifications {
            let end = m.position.checked_add(m.original_snippet.len())?;
            if end > text.len() || !text.is_char_boundary(m.position) {
                return None;
            }
            if &text[m.position..end] != m.original_snippet {
                return None;
            }
            text.replace_range(m.position..end, &m.replacement);
        }
        Some(text)
    }
}
