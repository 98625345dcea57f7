//! Method signatures
//!
//! A [`MethodSig`] is a method name plus its ordered parameter tags. Overloads
//! are disambiguated by exact tag-list match; there is no implicit widening or
//! narrowing between tags.

use std::fmt;

use crate::value::{param_tags, ParamType, Value};

/// Method name plus ordered parameter tags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSig {
    name: String,
    params: Vec<ParamType>,
}

impl MethodSig {
    /// Create a signature from a name and parameter tags
    pub fn new(name: impl Into<String>, params: &[ParamType]) -> Self {
        Self {
            name: name.into(),
            params: params.to_vec(),
        }
    }

    /// Form the signature of a call site from its argument values
    pub fn from_call(name: &str, args: &[Value]) -> Self {
        Self {
            name: name.to_string(),
            params: param_tags(args),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered parameter tags
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")
    }
}

/// Render a bare parameter-tag list, for constructor diagnostics
pub(crate) fn display_tags(tags: &[ParamType]) -> String {
    let parts: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    format!("({})", parts.join(", "))
}
