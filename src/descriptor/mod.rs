//! Descriptor model: what the front end knows about user functions, user
//! types and constants once it has resolved the original program.
//!
//! Descriptors are built once, before any generator runs, and are only
//! read afterwards. Generators receive them through a [`Registry`]
//! snapshot.

mod container;
mod instance;
pub mod skeleton;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

pub use container::{AccessMode, ContainerType, RandomAccessParam};
pub use instance::SkeletonInstance;
pub use skeleton::{Skeleton, SkeletonKind, SKELETONS};

/// A plain (elementwise or scalar) parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub resolved_type_name: String,
}

impl Param {
    pub fn new(name: &str, resolved_type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            resolved_type_name: resolved_type_name.to_string(),
        }
    }
}

/// Dimensionality of the implicit index argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexDims {
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "2d")]
    D2,
}

/// The implicit index parameter an indexed user function declares first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParam {
    pub name: String,
    pub dims: IndexDims,
}

/// The neighbourhood ("region") parameter of a MapOverlap user function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionParam {
    pub name: String,
    #[serde(rename = "type")]
    pub resolved_type_name: String,
    pub dims: usize,
}

/// One user-supplied callback to be specialized into kernel code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFunction {
    pub unique_name: String,
    pub resolved_return_type_name: String,
    #[serde(default)]
    pub index_param: Option<IndexParam>,
    #[serde(default)]
    pub region_param: Option<RegionParam>,
    #[serde(default)]
    pub elwise_params: Vec<Param>,
    #[serde(default)]
    pub any_container_params: Vec<RandomAccessParam>,
    #[serde(default)]
    pub any_scalar_params: Vec<Param>,
    #[serde(default)]
    pub varity: usize,
    #[serde(default)]
    pub harity: usize,
    #[serde(default)]
    pub requires_double_precision: bool,
    /// User types referenced (transitively) from the signature or body.
    #[serde(default)]
    pub referenced_uts: Vec<String>,
    /// Other user functions called from the body.
    #[serde(default)]
    pub referenced_ufs: Vec<String>,
    /// Free functions called from the body.
    #[serde(default)]
    pub called_functions: Vec<String>,
    /// Function body as written for the host.
    pub body: String,
    /// Body rewritten for device backends, when it differs from `body`.
    #[serde(default)]
    pub device_body: Option<String>,
    /// Line of the body in the original source.
    #[serde(default)]
    pub line: Option<u32>,
}

impl UserFunction {
    /// A function with no parameters; tests and callers fill in the rest.
    pub fn new(unique_name: &str, return_type: &str, body: &str) -> Self {
        Self {
            unique_name: unique_name.to_string(),
            resolved_return_type_name: return_type.to_string(),
            index_param: None,
            region_param: None,
            elwise_params: Vec::new(),
            any_container_params: Vec::new(),
            any_scalar_params: Vec::new(),
            varity: 0,
            harity: 0,
            requires_double_precision: false,
            referenced_uts: Vec::new(),
            referenced_ufs: Vec::new(),
            called_functions: Vec::new(),
            body: body.to_string(),
            device_body: None,
            line: None,
        }
    }

    pub fn indexed_1d(&self) -> bool {
        matches!(
            self.index_param,
            Some(IndexParam {
                dims: IndexDims::D1,
                ..
            })
        )
    }

    pub fn indexed_2d(&self) -> bool {
        matches!(
            self.index_param,
            Some(IndexParam {
                dims: IndexDims::D2,
                ..
            })
        )
    }

    pub fn device_code(&self) -> &str {
        self.device_body.as_deref().unwrap_or(&self.body)
    }

    /// Number of parameters the skeleton supplies per call, excluding the
    /// index and region arguments.
    pub fn total_arity(&self) -> usize {
        self.elwise_params.len() + self.any_container_params.len() + self.any_scalar_params.len()
    }
}

/// One field of a user-defined aggregate type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A user-defined aggregate type usable inside device code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Verbatim device declaration supplied by the user, used instead of
    /// the generated struct.
    #[serde(default)]
    pub device_declaration: Option<String>,
}

/// A named compile-time constant inlined into device code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConstant {
    pub name: String,
    pub definition: String,
    pub type_name: String,
}

/// Read-only snapshot of everything the front end discovered.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    functions: BTreeMap<String, UserFunction>,
    types: BTreeMap<String, UserType>,
    constants: BTreeMap<String, UserConstant>,
}

impl Registry {
    pub fn new(
        functions: Vec<UserFunction>,
        types: Vec<UserType>,
        constants: Vec<UserConstant>,
    ) -> Self {
        Self {
            functions: functions
                .into_iter()
                .map(|f| (f.unique_name.clone(), f))
                .collect(),
            types: types.into_iter().map(|t| (t.name.clone(), t)).collect(),
            constants: constants.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    pub fn function(&self, name: &str) -> Result<&UserFunction> {
        self.functions
            .get(name)
            .ok_or_else(|| GenError::UnknownFunction(name.to_string()))
    }

    pub fn user_type(&self, name: &str) -> Result<&UserType> {
        self.types
            .get(name)
            .ok_or_else(|| GenError::UnknownType(name.to_string()))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &UserFunction> {
        self.functions.values()
    }

    pub fn constants(&self) -> impl Iterator<Item = &UserConstant> {
        self.constants.values()
    }

    /// User functions called (transitively) by `roots`, callees before
    /// callers, each listed once. The roots themselves are not included.
    pub fn referenced_functions<'a>(&'a self, roots: &[&'a UserFunction]) -> Result<Vec<&'a UserFunction>> {
        let mut ordered: Vec<&UserFunction> = Vec::new();
        let mut visiting: Vec<&str> = Vec::new();
        for root in roots {
            for callee in &root.referenced_ufs {
                self.visit_function(callee, roots, &mut visiting, &mut ordered)?;
            }
        }
        Ok(ordered)
    }

    fn visit_function<'a>(
        &'a self,
        name: &str,
        roots: &[&'a UserFunction],
        visiting: &mut Vec<&'a str>,
        ordered: &mut Vec<&'a UserFunction>,
    ) -> Result<()> {
        if roots.iter().any(|r| r.unique_name == name)
            || ordered.iter().any(|f| f.unique_name == name)
            || visiting.iter().any(|v| *v == name)
        {
            return Ok(());
        }
        let func = self.function(name)?;
        visiting.push(&func.unique_name);
        for callee in &func.referenced_ufs {
            self.visit_function(callee, roots, visiting, ordered)?;
        }
        visiting.pop();
        ordered.push(func);
        Ok(())
    }

    /// `roots` together with every user function they call, callees before
    /// callers, each listed once. A root called by another root moves
    /// ahead of its caller.
    pub fn call_closure<'a>(&'a self, roots: &[&'a UserFunction]) -> Result<Vec<&'a UserFunction>> {
        let mut all: Vec<&UserFunction> = Vec::new();
        for root in roots {
            for func in self.referenced_functions(&[*root])?.into_iter().chain([*root]) {
                if !all.iter().any(|f| f.unique_name == func.unique_name) {
                    all.push(func);
                }
            }
        }
        Ok(all)
    }

    /// User types referenced by `funcs`, in first-reference order.
    pub fn referenced_types<'a>(&'a self, funcs: &[&'a UserFunction]) -> Result<Vec<&'a UserType>> {
        let mut ordered: Vec<&UserType> = Vec::new();
        for func in funcs {
            for name in &func.referenced_uts {
                if ordered.iter().any(|t| &t.name == name) {
                    continue;
                }
                ordered.push(self.user_type(name)?);
            }
        }
        Ok(ordered)
    }
}
