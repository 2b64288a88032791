//! Claim segmentation. Spans are byte offsets into the original text and
//! include the terminating punctuation, so revision can address claims
//! in place.

use prism_core::config::ClaimSplit;

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Claim<'a> {
    pub span: (usize, usize),
    pub text: &'a str,
}

/// Split text into claims on sentence terminators and newlines. `Clause`
/// mode additionally breaks on `;` and `,`. Runs of terminators (`...`,
/// `?!`) stay attached to the claim they end.
pub(crate) fn split_claims(text: &str, strategy: ClaimSplit) -> Vec<Claim<'_>> {
    let mut claims = Vec::new();
    let mut start = 0usize;
    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if c == '\n' {
            push_claim(&mut claims, text, start, i);
            start = i + 1;
        } else if is_terminator(c, strategy) {
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = iter.peek() {
                if !is_terminator(next, strategy) {
                    break;
                }
                end = j + next.len_utf8();
                iter.next();
            }
            push_claim(&mut claims, text, start, end);
            start = end;
        }
    }
    push_claim(&mut claims, text, start, text.len());
    claims
}

fn is_terminator(c: char, strategy: ClaimSplit) -> bool {
    matches!(c, '.' | '!' | '?') || (strategy == ClaimSplit::Clause && matches!(c, ';' | ','))
}

/// Record the claim with surrounding whitespace trimmed off the span.
/// Whitespace-only segments are dropped.
fn push_claim<'a>(claims: &mut Vec<Claim<'a>>, text: &'a str, start: usize, end: usize) {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let begin = start + lead;
    claims.push(Claim {
        span: (begin, begin + trimmed.len()),
        text: trimmed,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_split_on_terminators() {
        let claims = split_claims("First. Second! Third?", ClaimSplit::Sentence);
        let texts: Vec<&str> = claims.iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["First.", "Second!", "Third?"]);
    }

    #[test]
    fn spans_index_the_original_text() {
        let text = "One. Two.";
        for claim in split_claims(text, ClaimSplit::Sentence) {
            assert_eq!(&text[claim.span.0..claim.span.1], claim.text);
        }
    }

    #[test]
    fn terminator_runs_stay_with_their_claim() {
        let claims = split_claims("Wait... really?!", ClaimSplit::Sentence);
        let texts: Vec<&str> = claims.iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["Wait...", "really?!"]);
    }

    #[test]
    fn newlines_break_claims_without_punctuation() {
        let claims = split_claims("line one\nline two", ClaimSplit::Sentence);
        let texts: Vec<&str> = claims.iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["line one", "line two"]);
    }

    #[test]
    fn clause_mode_splits_finer() {
        let sentence = split_claims("apples, pears; plums.", ClaimSplit::Sentence);
        assert_eq!(sentence.len(), 1);
        let clause = split_claims("apples, pears; plums.", ClaimSplit::Clause);
        let texts: Vec<&str> = clause.iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["apples,", "pears;", "plums."]);
    }

    #[test]
    fn blank_and_empty_input_yield_no_claims() {
        assert!(split_claims("", ClaimSplit::Sentence).is_empty());
        assert!(split_claims("  \n\n  ", ClaimSplit::Sentence).is_empty());
        assert!(split_claims("...", ClaimSplit::Sentence).len() == 1);
    }
}
