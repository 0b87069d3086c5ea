//! Descriptor manifests.
//!
//! The C++ front end serializes what it discovered (user functions, types,
//! constants and skeleton instantiations) as one JSON document. Loading
//! is two steps: [`parse`] turns the text into a [`Manifest`], and
//! [`validate`] checks it against the skeleton table and the allowed
//! function set, producing a [`Registry`] snapshot and resolved
//! [`SkeletonInstance`]s. Problems come back as [`Diagnostic`]s carrying
//! spans into the manifest text.

mod validate;

#[cfg(test)]
mod tests;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::{Registry, SkeletonInstance, UserConstant, UserFunction, UserType};
use crate::diagnostic::Diagnostic;
use crate::error::{GenError, Result};
use crate::options::{GenOptions, ManifestOptions};
use crate::span::Span;

pub use validate::validate;

/// Serialized front-end output.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub options: ManifestOptions,
    #[serde(default)]
    pub constants: Vec<UserConstant>,
    #[serde(default)]
    pub types: Vec<UserType>,
    #[serde(default)]
    pub functions: Vec<UserFunction>,
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
}

/// One skeleton instantiation as the front end saw it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceSpec {
    /// Internal class template name, e.g. `MapPairsImpl`.
    pub skeleton: String,
    /// User function unique names, in constructor order.
    pub functions: Vec<String>,
    #[serde(default)]
    pub arity: Option<usize>,
    #[serde(default)]
    pub varity: Option<usize>,
    #[serde(default)]
    pub harity: Option<usize>,
}

/// A validated manifest, ready for generation.
#[derive(Clone, Debug)]
pub struct Checked {
    pub registry: Registry,
    pub instances: Vec<SkeletonInstance>,
    /// Non-fatal findings.
    pub warnings: Vec<Diagnostic>,
}

/// Parse manifest text. Syntax errors become a single diagnostic pointing
/// at the offending character.
pub fn parse(source: &str) -> Result<Manifest> {
    serde_json::from_str(source).map_err(|err| {
        let span = Span::from_line_col(source, err.line(), err.column());
        GenError::Invalid(vec![Diagnostic::error(
            format!("invalid manifest: {}", err),
            span,
        )])
    })
}

/// Read manifest text from `path`.
pub fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| GenError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse and validate in one go, with `options` already merged.
pub fn load(source: &str, options: &GenOptions) -> Result<Checked> {
    let manifest = parse(source)?;
    validate(manifest, source, options)
}

/// Span of the first `"needle"` string literal in `source`, if any.
pub(crate) fn locate(source: &str, needle: &str) -> Span {
    locate_nth(source, needle, 0)
}

/// Span of the `n`th `"needle"` string literal in `source`.
pub(crate) fn locate_nth(source: &str, needle: &str, n: usize) -> Span {
    let quoted = format!("\"{}\"", needle);
    source
        .match_indices(&quoted)
        .nth(n)
        .map(|(at, _)| Span::new(at as u32, (at + quoted.len()) as u32))
        .unwrap_or_else(Span::dummy)
}
