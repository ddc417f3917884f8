//! IAM wire types and the service-assumable role construct.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::SynthError;
use crate::resource::{get_att, CfnResource, LogicalId};
use crate::stack::Stack;

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: &'static str,
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION,
            statement,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Clone, Debug, Serialize)]
pub struct Principal {
    #[serde(rename = "Service")]
    pub service: String,
}

/// An execution role assumable by one provider service.
#[derive(Clone, Debug)]
pub struct Role {
    logical_id: LogicalId,
}

impl Role {
    pub fn service_role(
        stack: &mut Stack,
        construct_id: &str,
        service: &str,
        managed_policy_arns: Vec<Value>,
    ) -> Result<Self, SynthError> {
        let assume = PolicyDocument::new(vec![PolicyStatement {
            effect: Effect::Allow,
            action: vec!["sts:AssumeRole".to_string()],
            resource: None,
            principal: Some(Principal {
                service: service.to_string(),
            }),
        }]);
        let properties = json!({
            "AssumeRolePolicyDocument": assume,
            "ManagedPolicyArns": managed_policy_arns,
        });
        let logical_id = stack.add_resource(construct_id, CfnResource::new("AWS::IAM::Role", properties))?;
        Ok(Self { logical_id })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Environment;
    use crate::resource::sub;

    #[test]
    fn service_role_declares_assume_policy() {
        let mut stack = Stack::new(
            "Test",
            Environment {
                account: "123456789012".to_string(),
                region: "eu-west-1".to_string(),
            },
        );
        let role = Role::service_role(
            &mut stack,
            "fn-role",
            "lambda.amazonaws.com",
            vec![sub("arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole")],
        )
        .unwrap();
        assert_eq!(role.logical_id().as_str(), "FnRole");

        let template = stack.synth().unwrap();
        let resource = template.resource("FnRole").unwrap();
        assert_eq!(resource.type_, "AWS::IAM::Role");
        let doc = &resource.properties["AssumeRolePolicyDocument"];
        assert_eq!(doc["Version"], POLICY_VERSION);
        assert_eq!(doc["Statement"][0]["Effect"], "Allow");
        assert_eq!(doc["Statement"][0]["Principal"]["Service"], "lambda.amazonaws.com");
        assert_eq!(doc["Statement"][0]["Action"][0], "sts:AssumeRole");
    }
}
