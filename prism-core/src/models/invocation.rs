use serde::{Deserialize, Serialize};

/// One structured tool invocation extracted from free-form model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Target tool. Never empty: blocks without a tool name are dropped
    /// during parsing instead of surfacing here.
    pub tool_name: String,
    /// Sub-command within the tool. May be empty.
    pub command: String,
    /// Free-form parameters in first-seen order. A repeated key overwrites
    /// its value in place, so the order reflects first appearance.
    pub params: Vec<(String, String)>,
    /// Byte range of the whole block in the source text, sentinels included.
    pub source_span: (usize, usize),
}

impl ToolInvocation {
    /// Look up a parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite a parameter, preserving first-seen order.
    pub fn set_param(&mut self, key: &str, value: String) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.params.push((key.to_string(), value)),
        }
    }
}
