//! Declaration primitives: logical ids, resource records, intrinsic functions.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::SynthError;

/// Logical id of a declared resource: ASCII alphanumeric, non-empty, at most 255 chars.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LogicalId(String);

impl LogicalId {
    pub fn new(id: impl Into<String>) -> Result<Self, SynthError> {
        let id = id.into();
        if id.is_empty() || id.len() > 255 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SynthError::InvalidLogicalId(id));
        }
        Ok(Self(id))
    }

    /// Derive a logical id from a construct id: separator characters are dropped
    /// and each segment is upper-camel-cased, e.g. "get-product-lambda" -> "GetProductLambda".
    pub fn from_construct_id(id: &str) -> Result<Self, SynthError> {
        let mut out = String::with_capacity(id.len());
        let mut upper_next = true;
        for c in id.chars() {
            if c.is_ascii_alphanumeric() {
                if upper_next {
                    out.extend(c.to_uppercase());
                    upper_next = false;
                } else {
                    out.push(c);
                }
            } else {
                upper_next = true;
            }
        }
        if out.is_empty() {
            return Err(SynthError::InvalidLogicalId(id.to_string()));
        }
        Self::new(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LogicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Removal policy applied when the stack is torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    Delete,
    Retain,
}

/// One declared resource: provider type, property document, and dependency edges.
/// Write-once; nothing mutates a record after it is added to a stack.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnResource {
    #[serde(rename = "Type")]
    pub type_: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<LogicalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,
}

impl CfnResource {
    pub fn new(type_: impl Into<String>, properties: Value) -> Self {
        Self {
            type_: type_.into(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
        }
    }

    pub fn depends_on(mut self, id: &LogicalId) -> Self {
        self.depends_on.push(id.clone());
        self
    }

    pub fn deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }
}

/// `{"Ref": id}`.
pub fn r#ref(id: &LogicalId) -> Value {
    json!({ "Ref": id.as_str() })
}

/// `{"Fn::GetAtt": [id, attr]}`.
pub fn get_att(id: &LogicalId, attr: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_str(), attr] })
}

/// `{"Fn::Sub": template}`. `${AWS::*}` pseudo-parameters resolve engine-side.
pub fn sub(template: impl Into<String>) -> Value {
    json!({ "Fn::Sub": template.into() })
}

/// `{"Fn::Sub": [template, vars]}` for placeholders that need explicit values.
pub fn sub_with(template: impl Into<String>, vars: &[(&str, Value)]) -> Value {
    let map: serde_json::Map<String, Value> =
        vars.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect();
    json!({ "Fn::Sub": [template.into(), map] })
}
