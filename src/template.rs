//! Serialized forms: the deployment template and the asset manifest.

use crate::resource::CfnResource;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const FORMAT_VERSION: &str = "2010-09-09";
pub const MANIFEST_VERSION: &str = "1.0";

/// The synthesized deployment descriptor for one stack, in the provisioning
/// engine's native template format. Keys are sorted, so output is deterministic.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resources: BTreeMap<String, CfnResource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn resource(&self, logical_id: &str) -> Option<&CfnResource> {
        self.resources.get(logical_id)
    }

    /// All resources of the given provider type, in logical-id order.
    pub fn resources_of_type(&self, type_: &str) -> Vec<(&str, &CfnResource)> {
        self.resources
            .iter()
            .filter(|(_, r)| r.type_ == type_)
            .map(|(id, r)| (id.as_str(), r))
            .collect()
    }
}

/// A named output value surfaced by the stack after deployment.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Top-level synthesis manifest: which templates were written and which
/// local artifacts back them, so the engine can upload before deploying.
#[derive(Clone, Debug, Serialize)]
pub struct Manifest {
    pub version: &'static str,
    pub stacks: Vec<StackArtifact>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StackArtifact {
    pub stack_name: String,
    pub template_file: String,
    pub account: String,
    pub region: String,
    pub assets: Vec<AssetEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AssetEntry {
    pub source_path: String,
    pub fingerprint: String,
    pub object_key: String,
}
