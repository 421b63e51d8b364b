//! Declared parameter lists and argument binding.

use std::collections::BTreeMap;

use thiserror::Error;

use super::record::InvocationRecord;
use crate::value::Value;

/// Errors raised when call arguments do not fit a signature.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BindError {
    #[error("{function}() takes {expected} positional arguments but {given} were given")]
    TooManyPositional {
        function: String,
        expected: usize,
        given: usize,
    },

    #[error("{function}() got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { function: String, name: String },

    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArgument { function: String, name: String },

    #[error("{function}() missing required argument '{name}'")]
    MissingArgument { function: String, name: String },
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    default: Option<Value>,
}

impl Param {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Name and parameter list of a wrapped function.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    name: String,
    params: Vec<Param>,
    var_positional: Option<String>,
    var_keyword: Option<String>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            var_positional: None,
            var_keyword: None,
        }
    }

    /// Append a required parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Append a parameter with a default value.
    pub fn param_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    /// Collect surplus positional arguments under `name`.
    pub fn var_positional(mut self, name: impl Into<String>) -> Self {
        self.var_positional = Some(name.into());
        self
    }

    /// Collect unknown keyword arguments under `name`.
    pub fn var_keyword(mut self, name: impl Into<String>) -> Self {
        self.var_keyword = Some(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Resolve `args` against this signature, applying defaults.
    ///
    /// The record lists declared parameters in order, followed by the
    /// variadic collectors (when declared), which are always present.
    pub fn bind(&self, args: &Args) -> Result<InvocationRecord, BindError> {
        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        let mut rest = Vec::new();
        let mut extra = BTreeMap::new();

        for (i, value) in args.positional.iter().enumerate() {
            if i < slots.len() {
                slots[i] = Some(value.clone());
            } else if self.var_positional.is_some() {
                rest.push(value.clone());
            } else {
                return Err(BindError::TooManyPositional {
                    function: self.name.clone(),
                    expected: self.params.len(),
                    given: args.positional.len(),
                });
            }
        }

        for (name, value) in &args.keyword {
            match self.params.iter().position(|p| &p.name == name) {
                Some(idx) => {
                    if slots[idx].is_some() {
                        return Err(self.duplicate(name));
                    }
                    slots[idx] = Some(value.clone());
                }
                None if self.var_keyword.is_some() => {
                    if extra.insert(name.clone(), value.clone()).is_some() {
                        return Err(self.duplicate(name));
                    }
                }
                None => {
                    return Err(BindError::UnexpectedKeyword {
                        function: self.name.clone(),
                        name: name.clone(),
                    })
                }
            }
        }

        let mut entries = Vec::with_capacity(self.params.len() + 2);
        for (param, slot) in self.params.iter().zip(slots) {
            let value = slot.or_else(|| param.default.clone()).ok_or_else(|| BindError::MissingArgument {
                function: self.name.clone(),
                name: param.name.clone(),
            })?;
            entries.push((param.name.clone(), value));
        }
        if let Some(name) = &self.var_positional {
            entries.push((name.clone(), Value::Sequence(rest)));
        }
        if let Some(name) = &self.var_keyword {
            entries.push((name.clone(), Value::Mapping(extra)));
        }

        Ok(InvocationRecord::new(self.name.clone(), entries, self.var_keyword.clone()))
    }

    fn duplicate(&self, name: &str) -> BindError {
        BindError::DuplicateArgument {
            function: self.name.clone(),
            name: name.to_string(),
        }
    }
}

/// Arguments of one pending call, as the caller wrote them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }
}
