use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use prism_core::config::{PurifyConfig, PurifyConfigPatch};
use prism_core::constants::TRUNCATION_MARKER;
use prism_core::errors::ConfigError;
use prism_core::models::{Modification, ModificationKind, PurifyResult};

use crate::markup;
use crate::patterns::{self, CompiledPattern};

static RE_SPACE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[ \t]{2,}|\t").ok());
static RE_NEWLINE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\n{3,}").ok());

/// Context purifier.
///
/// Transforms run in a fixed order regardless of configuration order:
/// markup, redaction, whitespace, deduplication, truncation. Each transform
/// is stable on its own output and no later transform reintroduces an
/// earlier trigger, so purifying already-purified text changes nothing.
#[derive(Debug)]
pub struct PurifyEngine {
    config: PurifyConfig,
    compiled: Vec<CompiledPattern>,
}

impl PurifyEngine {
    /// Build an engine, compiling every redaction pattern up front. A config
    /// that fails validation or contains an uncompilable pattern is rejected
    /// as a whole.
    pub fn new(config: PurifyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let compiled = patterns::compile(&config.redact_patterns)?;
        Ok(Self { config, compiled })
    }

    pub fn config(&self) -> &PurifyConfig {
        &self.config
    }

    /// Apply a partial config update. The merged config is validated and its
    /// patterns compiled before anything is swapped in, so a rejected update
    /// leaves the engine exactly as it was.
    pub fn update_config(&mut self, patch: PurifyConfigPatch) -> Result<(), ConfigError> {
        let merged = self.config.merged(patch)?;
        let compiled = patterns::compile(&merged.redact_patterns)?;
        self.config = merged;
        self.compiled = compiled;
        Ok(())
    }

    /// Purify with the engine's held configuration.
    pub fn purify(&self, content: &str) -> PurifyResult {
        run_pipeline(content, &self.config, &self.compiled)
    }

    /// Purify with a caller-supplied configuration, leaving the held one
    /// untouched. Pattern compilation happens per call, so this is the slow
    /// path; persist the config via [`PurifyEngine::update_config`] when it
    /// will be reused.
    pub fn purify_with_config(
        &self,
        content: &str,
        config: &PurifyConfig,
    ) -> Result<PurifyResult, ConfigError> {
        config.validate()?;
        let compiled = patterns::compile(&config.redact_patterns)?;
        Ok(run_pipeline(content, config, &compiled))
    }
}

fn run_pipeline(content: &str, config: &PurifyConfig, compiled: &[CompiledPattern]) -> PurifyResult {
    let original_length = content.chars().count();
    let mut text = content.to_string();
    let mut modifications = Vec::new();

    if (config.convert_html_to_markdown || config.strip_markup_to_plain_text)
        && markup::contains_markup(&text)
    {
        let converted = if config.convert_html_to_markdown {
            markup::to_markdown(&text)
        } else {
            markup::to_plain_text(&text)
        };
        if converted != text {
            modifications.push(Modification {
                kind: ModificationKind::Markup,
                original_snippet: std::mem::replace(&mut text, converted.clone()),
                replacement: converted,
                position: 0,
            });
        }
    }

    for pattern in compiled {
        apply_redaction(&mut text, &mut modifications, pattern);
    }

    if config.collapse_whitespace {
        apply_whitespace(&mut text, &mut modifications);
    }

    if config.deduplicate_lines {
        apply_dedup(&mut text, &mut modifications);
    }

    if let Some(limit) = config.max_length {
        apply_truncation(&mut text, &mut modifications, limit);
    }

    let purified_length = text.chars().count();
    debug!(
        original_chars = original_length,
        purified_chars = purified_length,
        modifications = modifications.len(),
        "purify pass complete"
    );
    PurifyResult {
        original_length,
        purified_length,
        text,
        modifications,
    }
}

fn apply_redaction(text: &mut String, modifications: &mut Vec<Modification>, pattern: &CompiledPattern) {
    let mut search_from = 0;
    while search_from <= text.len() {
        let Some(m) = pattern.regex.find_at(text, search_from) else {
            break;
        };
        let (start, end) = (m.start(), m.end());
        let matched = m.as_str().to_string();
        // Leave placeholders from earlier rules alone so overlapping
        // patterns do not redact each other's output.
        if matched.starts_with('[') && matched.ends_with(']') {
            search_from = end;
            continue;
        }
        if matched == pattern.replacement {
            search_from = end;
            continue;
        }
        modifications.push(Modification {
            kind: ModificationKind::Redact,
            original_snippet: matched,
            replacement: pattern.replacement.clone(),
            position: start,
        });
        text.replace_range(start..end, &pattern.replacement);
        search_from = start + pattern.replacement.len();
    }
}

fn apply_whitespace(text: &mut String, modifications: &mut Vec<Modification>) {
    let (Some(re_space), Some(re_newline)) = (RE_SPACE_RUN.as_ref(), RE_NEWLINE_RUN.as_ref())
    else {
        return;
    };
    replace_runs(text, modifications, re_space, " ");
    replace_runs(text, modifications, re_newline, "\n\n");
}

fn replace_runs(
    text: &mut String,
    modifications: &mut Vec<Modification>,
    re: &Regex,
    replacement: &str,
) {
    let mut search_from = 0;
    while search_from <= text.len() {
        let Some(m) = re.find_at(text, search_from) else {
            break;
        };
        let (start, end) = (m.start(), m.end());
        let matched = m.as_str().to_string();
        modifications.push(Modification {
            kind: ModificationKind::Whitespace,
            original_snippet: matched,
            replacement: replacement.to_string(),
            position: start,
        });
        text.replace_range(start..end, replacement);
        search_from = start + replacement.len();
    }
}

/// Drop exact repeats of earlier non-blank lines. Blank lines are never
/// treated as duplicates.
fn apply_dedup(text: &mut String, modifications: &mut Vec<Modification>) {
    let snapshot = text.clone();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut removals: Vec<(usize, usize)> = Vec::new();
    let mut offset = 0;
    for piece in snapshot.split_inclusive('\n') {
        let start = offset;
        offset += piece.len();
        let content = piece.strip_suffix('\n').unwrap_or(piece);
        if content.trim().is_empty() {
            continue;
        }
        if !seen.insert(content) {
            if piece.ends_with('\n') {
                removals.push((start, start + piece.len()));
            } else if start > 0 {
                // Unterminated final line: consume the newline before it so
                // the text does not end with a dangling separator.
                removals.push((start - 1, start + piece.len()));
            } else {
                removals.push((start, start + piece.len()));
            }
        }
    }

    let mut shift = 0usize;
    for (start, end) in removals {
        let snippet = snapshot[start..end].to_string();
        let position = start - shift;
        text.replace_range(position..position + snippet.len(), "");
        modifications.push(Modification {
            kind: ModificationKind::Dedup,
            original_snippet: snippet,
            replacement: String::new(),
            position,
        });
        shift += end - start;
    }
}

/// Cut the text to `limit` characters, marker included. The cut prefers the
/// last whitespace boundary inside the budget so the marker never splits a
/// word.
fn apply_truncation(text: &mut String, modifications: &mut Vec<Modification>, limit: usize) {
    if text.chars().count() <= limit {
        return;
    }
    let marker_chars = TRUNCATION_MARKER.chars().count();
    if limit <= marker_chars {
        // No room for the marker, hard character cut.
        let cut = char_to_byte(text, limit);
        modifications.push(Modification {
            kind: ModificationKind::Truncate,
            original_snippet: text[cut..].to_string(),
            replacement: String::new(),
            position: cut,
        });
        text.truncate(cut);
        return;
    }

    let budget = limit - marker_chars;
    let hard = char_to_byte(text, budget);
    let cut = match text[..hard].rfind(char::is_whitespace) {
        Some(ws) => {
            // Back over the whole whitespace run so the marker does not
            // float after trailing spaces.
            let mut cut = ws;
            while let Some(c) = text[..cut].chars().next_back() {
                if !c.is_whitespace() {
                    break;
                }
                cut -= c.len_utf8();
            }
            if cut == 0 {
                hard
            } else {
                cut
            }
        }
        None => hard,
    };

    modifications.push(Modification {
        kind: ModificationKind::Truncate,
        original_snippet: text[cut..].to_string(),
        replacement: TRUNCATION_MARKER.to_string(),
        position: cut,
    });
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
}

fn char_to_byte(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}
