use regex::Regex;

use prism_core::config::RedactPattern;
use prism_core::errors::ConfigError;

/// A redaction rule compiled and ready to scan.
#[derive(Debug)]
pub(crate) struct CompiledPattern {
    pub name: String,
    pub regex: Regex,
    pub replacement: String,
}

/// Compile a pattern list, rejecting anything that could loop or re-match
/// forever: uncompilable regexes, patterns matching the empty string, and
/// patterns matching their own replacement.
pub(crate) fn compile(patterns: &[RedactPattern]) -> Result<Vec<CompiledPattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            let regex = Regex::new(&p.pattern).map_err(|e| ConfigError::InvalidPattern {
                name: p.name.clone(),
                reason: e.to_string(),
            })?;
            if regex.is_match("") {
                return Err(ConfigError::InvalidPattern {
                    name: p.name.clone(),
                    reason: "matches the empty string".to_string(),
                });
            }
            let replacement = if p.replacement.is_empty() {
                format!("[REDACTED:{}]", p.name)
            } else {
                p.replacement.clone()
            };
            if regex.is_match(&replacement) {
                return Err(ConfigError::InvalidPattern {
                    name: p.name.clone(),
                    reason: "matches its own replacement".to_string(),
                });
            }
            Ok(CompiledPattern {
                name: p.name.clone(),
                regex,
                replacement,
            })
        })
        .collect()
}

fn preset(name: &str, pattern: &str) -> RedactPattern {
    RedactPattern {
        name: name.to_string(),
        pattern: pattern.to_string(),
        replacement: String::new(),
    }
}

/// Built-in secret and credential patterns. Callers append these to
/// `PurifyConfig::redact_patterns`; they compile through the same path as
/// custom rules and can be mixed with them freely.
pub fn secret_presets() -> Vec<RedactPattern> {
    vec![
        preset("email", r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}"),
        preset("aws_key", r"\bAKIA[0-9A-Z]{16}\b"),
        preset(
            "jwt",
            r"\beyJ[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\.[A-Za-z0-9_-]{10,}\b",
        ),
        preset("bearer_token", r"(?i)bearer\s+[A-Za-z0-9\-._~+/]{16,}=*"),
        preset(
            "password_assign",
            r#"(?i)(?:password|passwd|pwd)\s*[=:]\s*['"][^'"]{4,}['"]"#,
        ),
        preset(
            "api_key_assign",
            r#"(?i)(?:api[_-]?key|apikey)\s*[=:]\s*['"][A-Za-z0-9_\-]{16,}['"]"#,
        ),
        preset(
            "connection_string",
            r"(?i)\b[a-z][a-z0-9+]*://[^\s:@/]+:[^\s@/]+@[^\s]+",
        ),
    ]
}
