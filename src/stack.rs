//! The write-once declaration graph: resources, outputs, assets, synthesis.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::app::Environment;
use crate::asset::Asset;
use crate::error::SynthError;
use crate::resource::{CfnResource, LogicalId};
use crate::template::{Output, Template, FORMAT_VERSION};
use crate::validator;

/// One declared API method, kept alongside the raw resource so the validator
/// can cross-check routes, authorizers, and documentation.
#[derive(Clone, Debug)]
pub(crate) struct MethodRecord {
    pub(crate) api: LogicalId,
    pub(crate) verb: String,
    pub(crate) path: String,
    pub(crate) authorizer: Option<LogicalId>,
    pub(crate) method_id: LogicalId,
}

#[derive(Clone, Debug)]
pub(crate) struct DocPartRecord {
    pub(crate) api: LogicalId,
    pub(crate) verb: String,
    pub(crate) path: String,
}

/// A deployable stack: an append-only set of resource declarations bound to
/// one execution environment. Resources are never mutated after declaration;
/// wiring (grants, routes) only appends new records.
pub struct Stack {
    name: String,
    env: Environment,
    description: Option<String>,
    resources: Vec<(LogicalId, CfnResource)>,
    ids: HashSet<String>,
    outputs: Vec<(String, Output)>,
    assets: Vec<Asset>,
    methods: Vec<MethodRecord>,
    authorizers: Vec<(LogicalId, LogicalId)>,
    doc_parts: Vec<DocPartRecord>,
    grants: HashSet<(String, String)>,
}

impl Stack {
    pub fn new(name: impl Into<String>, env: Environment) -> Self {
        Self {
            name: name.into(),
            env,
            description: None,
            resources: Vec::new(),
            ids: HashSet::new(),
            outputs: Vec::new(),
            assets: Vec::new(),
            methods: Vec::new(),
            authorizers: Vec::new(),
            doc_parts: Vec::new(),
            grants: HashSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Declare one resource under a construct id. Duplicate logical ids are
    /// rejected here; everything else is checked by the validator at synth.
    pub fn add_resource(&mut self, construct_id: &str, resource: CfnResource) -> Result<LogicalId, SynthError> {
        let logical_id = LogicalId::from_construct_id(construct_id)?;
        if !self.ids.insert(logical_id.as_str().to_string()) {
            return Err(SynthError::DuplicateLogicalId(logical_id.as_str().to_string()));
        }
        tracing::debug!(id = %logical_id, r#type = %resource.type_, "declare");
        self.resources.push((logical_id.clone(), resource));
        Ok(logical_id)
    }

    pub fn add_output(&mut self, name: &str, value: Value, description: Option<&str>) {
        self.outputs.push((
            name.to_string(),
            Output {
                value,
                description: description.map(str::to_string),
            },
        ));
    }

    pub(crate) fn add_asset(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    pub(crate) fn record_method(&mut self, record: MethodRecord) {
        self.methods.push(record);
    }

    pub(crate) fn record_authorizer(&mut self, api: LogicalId, authorizer: LogicalId) {
        self.authorizers.push((api, authorizer));
    }

    pub(crate) fn record_doc_part(&mut self, record: DocPartRecord) {
        self.doc_parts.push(record);
    }

    /// One read/write grant per (table, function) pair.
    pub(crate) fn record_grant(&mut self, table: &LogicalId, function: &LogicalId) -> Result<(), SynthError> {
        let key = (table.as_str().to_string(), function.as_str().to_string());
        if !self.grants.insert(key) {
            return Err(SynthError::DuplicateGrant {
                table: table.as_str().to_string(),
                function: function.as_str().to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn resources(&self) -> &[(LogicalId, CfnResource)] {
        &self.resources
    }

    pub(crate) fn methods(&self) -> &[MethodRecord] {
        &self.methods
    }

    pub(crate) fn authorizers(&self) -> &[(LogicalId, LogicalId)] {
        &self.authorizers
    }

    pub(crate) fn doc_parts(&self) -> &[DocPartRecord] {
        &self.doc_parts
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Validate the declared graph and produce the deployment template.
    pub fn synth(&self) -> Result<Template, SynthError> {
        validator::validate(self)?;
        let resources: BTreeMap<String, CfnResource> = self
            .resources
            .iter()
            .map(|(id, r)| (id.as_str().to_string(), r.clone()))
            .collect();
        let outputs: BTreeMap<String, Output> = self.outputs.iter().cloned().collect();
        tracing::debug!(stack = %self.name, resources = resources.len(), "synthesized template");
        Ok(Template {
            format_version: FORMAT_VERSION,
            description: self.description.clone(),
            resources,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::r#ref;
    use serde_json::json;

    fn test_env() -> Environment {
        Environment {
            account: "123456789012".to_string(),
            region: "eu-west-1".to_string(),
        }
    }

    #[test]
    fn duplicate_logical_id_rejected() {
        let mut stack = Stack::new("Test", test_env());
        stack
            .add_resource("product", CfnResource::new("AWS::DynamoDB::Table", json!({})))
            .unwrap();
        let err = stack
            .add_resource("product", CfnResource::new("AWS::DynamoDB::Table", json!({})))
            .unwrap_err();
        assert!(matches!(err, SynthError::DuplicateLogicalId(id) if id == "Product"));
    }

    #[test]
    fn synth_collects_resources_and_outputs() {
        let mut stack = Stack::new("Test", test_env()).with_description("demo");
        let id = stack
            .add_resource("product-table", CfnResource::new("AWS::DynamoDB::Table", json!({})))
            .unwrap();
        stack.add_output("TableRef", r#ref(&id), None);

        let template = stack.synth().unwrap();
        assert_eq!(template.description.as_deref(), Some("demo"));
        assert!(template.resource("ProductTable").is_some());
        assert_eq!(template.outputs["TableRef"].value, json!({ "Ref": "ProductTable" }));
    }

    #[test]
    fn second_grant_for_same_pair_rejected() {
        let mut stack = Stack::new("Test", test_env());
        let table = LogicalId::new("Product").unwrap();
        let function = LogicalId::new("GetProductLambda").unwrap();
        stack.record_grant(&table, &function).unwrap();
        let err = stack.record_grant(&table, &function).unwrap_err();
        assert!(matches!(err, SynthError::DuplicateGrant { .. }));
    }
}
