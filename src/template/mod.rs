//! Placeholder templates for generated sources.
//!
//! A template is an immutable text blob with a declared set of
//! placeholder names. Rendering walks the text once, replaces every
//! identifier that exactly matches a placeholder with its field value and
//! copies everything else through. Values are never rescanned, so a value
//! that happens to contain a placeholder name is emitted verbatim.

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::error::{GenError, Result};

/// Replace every occurrence of the literal `name` in `template` with `value`.
pub fn substitute(template: &str, name: &str, value: &str) -> String {
    if name.is_empty() {
        return template.to_string();
    }
    template.replace(name, value)
}

/// A template together with the placeholder names it expects.
#[derive(Clone, Copy, Debug)]
pub struct Template {
    text: &'static str,
    placeholders: &'static [&'static str],
}

impl Template {
    pub const fn new(text: &'static str, placeholders: &'static [&'static str]) -> Self {
        Self { text, placeholders }
    }

    pub fn text(&self) -> &'static str {
        self.text
    }

    pub fn placeholders(&self) -> &'static [&'static str] {
        self.placeholders
    }

    /// Render the template. Every declared placeholder must have a value.
    pub fn render(&self, fields: &Fields) -> Result<String> {
        for name in self.placeholders {
            if !fields.values.contains_key(name) {
                return Err(GenError::MissingField(name));
            }
        }

        let mut out = String::with_capacity(self.text.len() + fields.total_len());
        for_each_token(self.text, |token, is_ident| {
            match self.placeholders.iter().find(|p| is_ident && **p == token) {
                Some(name) => out.push_str(&fields.values[name]),
                None => out.push_str(token),
            }
        });
        Ok(out)
    }
}

/// Rename calls to the functions in `renames`: an identifier is replaced
/// only when a `(` follows it. Member accesses (`.f(`, `->f(`) and
/// qualified names (`ns::f(`) keep their name, as do occurrences inside
/// longer identifiers.
pub fn rename_calls(text: &str, renames: &HashMap<String, String>) -> String {
    if renames.is_empty() {
        return text.to_string();
    }
    let mut tokens = Vec::new();
    for_each_token(text, |token, is_ident| tokens.push((token, is_ident)));

    let mut out = String::with_capacity(text.len());
    for (n, &(token, is_ident)) in tokens.iter().enumerate() {
        let target = renames.get(token).filter(|_| is_ident);
        match target {
            Some(to) if is_call(&tokens, n) => out.push_str(to),
            _ => out.push_str(token),
        }
    }
    out
}

fn is_call(tokens: &[(&str, bool)], n: usize) -> bool {
    let called = tokens
        .get(n + 1)
        .map_or(false, |(next, _)| next.trim_start().starts_with('('));
    let member = n > 0 && {
        let before = tokens[n - 1].0.trim_end();
        before.ends_with('.') || before.ends_with("->") || before.ends_with("::")
    };
    called && !member
}

/// Split `text` into maximal identifier runs and the text between them.
fn for_each_token<'t>(text: &'t str, mut f: impl FnMut(&'t str, bool)) {
    let mut rest = text;
    while let Some(start) = rest.find(is_ident_char) {
        if start > 0 {
            f(&rest[..start], false);
        }
        let word = &rest[start..];
        let len = word.find(|c: char| !is_ident_char(c)).unwrap_or(word.len());
        f(&word[..len], true);
        rest = &word[len..];
    }
    if !rest.is_empty() {
        f(rest, false);
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Named values for one render.
#[derive(Clone, Debug, Default)]
pub struct Fields {
    values: HashMap<&'static str, String>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name, value.into());
        self
    }

    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn total_len(&self) -> usize {
        self.values.values().map(String::len).sum()
    }
}

/// Placeholder names shared by the kernel and wrapper templates.
pub mod ph {
    pub const KERNEL_NAME: &str = "SKEPU_KERNEL_NAME";
    pub const KERNEL_PARAMS: &str = "SKEPU_KERNEL_PARAMS";
    pub const HOST_KERNEL_PARAMS: &str = "SKEPU_HOST_KERNEL_PARAMS";
    pub const KERNEL_ARGS: &str = "SKEPU_KERNEL_ARGS";
    pub const CONTAINER_PROXIES: &str = "SKEPU_CONTAINER_PROXIES";
    pub const CONTAINER_PROXIES_INNER: &str = "SKEPU_CONTAINER_PROXIE_INNER";
    pub const INDEX_INITIALIZER: &str = "SKEPU_INDEX_INITIALIZER";
    pub const MAP_RESULT_TYPE: &str = "SKEPU_MAP_RESULT_TYPE";
    pub const REDUCE_RESULT_TYPE: &str = "SKEPU_REDUCE_RESULT_TYPE";
    pub const SCAN_TYPE: &str = "SKEPU_SCAN_TYPE";
    pub const MAP_FUNCTION: &str = "SKEPU_FUNCTION_NAME_MAP";
    pub const REDUCE_FUNCTION: &str = "SKEPU_FUNCTION_NAME_REDUCE";
    pub const SCAN_FUNCTION: &str = "SKEPU_FUNCTION_NAME_SCAN";
    pub const CALL_FUNCTION: &str = "SKEPU_FUNCTION_NAME_CALL";
    pub const MAP_PARAMS: &str = "SKEPU_MAP_PARAMS";
    pub const CALL_PARAMS: &str = "SKEPU_CALL_ARGS";
    pub const REGION_TYPE: &str = "SKEPU_REGION_TYPE";
    pub const OVERLAP_INPUT_TYPE: &str = "SKEPU_MAPOVERLAP_INPUT_TYPE";
    pub const REDUCE_TREE: &str = "SKEPU_REDUCE_TREE";
    pub const KERNEL_PARAM_COUNT: &str = "SKEPU_KERNEL_PARAM_COUNT";
    pub const LAUNCHER_NAME: &str = "SKEPU_LAUNCHER_NAME";
    pub const KERNEL_ACCESSOR: &str = "SKEPU_KERNEL_ACCESSOR";
}
