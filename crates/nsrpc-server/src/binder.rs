//! Parameter binding
//!
//! Turns the `params` of a call into the ordered argument list of the target
//! method. Positional params pass through untouched. Named params are
//! reordered into declaration order.

use nsrpc_json_rpc::Params;
use serde_json::Value;
use thiserror::Error;

use crate::schema::ParamSpec;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// A named argument follows an omitted optional one and has no position
    #[error("parameter '{present}' supplied while earlier parameter '{omitted}' is omitted")]
    Gap { omitted: String, present: String },
}

pub struct ParameterBinder;

impl ParameterBinder {
    /// Bind params against the declared parameter list.
    ///
    /// A missing required key is an error. Trailing optional parameters may be
    /// omitted, which yields a shorter argument list exactly like a shorter
    /// positional call. Values are never defaulted.
    pub fn bind(params: &[ParamSpec], raw: Params) -> Result<Vec<Value>, BindError> {
        match raw {
            Params::Absent => Ok(Vec::new()),
            Params::Positional(values) => Ok(values),
            Params::Named(mut map) => {
                let mut args = Vec::with_capacity(params.len());
                let mut omitted: Option<&str> = None;

                for spec in params {
                    match map.remove(&spec.name) {
                        Some(value) => {
                            if let Some(omitted) = omitted {
                                return Err(BindError::Gap {
                                    omitted: omitted.to_string(),
                                    present: spec.name.clone(),
                                });
                            }
                            args.push(value);
                        }
                        None if spec.optional => {
                            omitted.get_or_insert(spec.name.as_str());
                        }
                        None => return Err(BindError::MissingParameter(spec.name.clone())),
                    }
                }

                Ok(args)
            }
        }
    }
}
