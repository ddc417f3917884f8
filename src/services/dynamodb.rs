//! Key-value table declarations and read/write grants.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::SynthError;
use crate::resource::{get_att, r#ref, sub_with, CfnResource, DeletionPolicy, LogicalId};
use crate::services::iam::{Effect, PolicyDocument, PolicyStatement};
use crate::services::lambda::Function;
use crate::stack::Stack;

const READ_WRITE_ACTIONS: &[&str] = &[
    "dynamodb:BatchGetItem",
    "dynamodb:GetItem",
    "dynamodb:Query",
    "dynamodb:Scan",
    "dynamodb:ConditionCheckItem",
    "dynamodb:BatchWriteItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
    "dynamodb:DescribeTable",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

#[derive(Clone, Debug)]
pub struct Attribute {
    pub name: String,
    pub type_: AttributeType,
}

impl Attribute {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_: AttributeType::String,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_: AttributeType::Number,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingMode {
    Provisioned { read: u64, write: u64 },
    PayPerRequest,
}

/// Small provisioned capacity, matching the engine's default for demo tables.
pub const DEFAULT_BILLING: BillingMode = BillingMode::Provisioned { read: 5, write: 5 };

#[derive(Clone, Debug)]
pub struct TableProps {
    pub table_name: String,
    pub partition_key: Attribute,
    pub sort_key: Option<Attribute>,
    pub billing: BillingMode,
    pub removal_policy: DeletionPolicy,
}

/// A declared table handle, usable by downstream grants and references.
#[derive(Clone, Debug)]
pub struct Table {
    logical_id: LogicalId,
}

impl Table {
    pub fn new(stack: &mut Stack, construct_id: &str, props: TableProps) -> Result<Self, SynthError> {
        let mut key_schema = vec![json!({ "AttributeName": props.partition_key.name, "KeyType": "HASH" })];
        let mut attributes = vec![json!({
            "AttributeName": props.partition_key.name,
            "AttributeType": props.partition_key.type_,
        })];
        if let Some(sort_key) = &props.sort_key {
            key_schema.push(json!({ "AttributeName": sort_key.name, "KeyType": "RANGE" }));
            attributes.push(json!({ "AttributeName": sort_key.name, "AttributeType": sort_key.type_ }));
        }
        let mut properties = json!({
            "TableName": props.table_name,
            "KeySchema": key_schema,
            "AttributeDefinitions": attributes,
        });
        match props.billing {
            BillingMode::Provisioned { read, write } => {
                properties["ProvisionedThroughput"] =
                    json!({ "ReadCapacityUnits": read, "WriteCapacityUnits": write });
            }
            BillingMode::PayPerRequest => {
                properties["BillingMode"] = json!("PAY_PER_REQUEST");
            }
        }
        let logical_id = stack.add_resource(
            construct_id,
            CfnResource::new("AWS::DynamoDB::Table", properties).deletion_policy(props.removal_policy),
        )?;
        Ok(Self { logical_id })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }

    /// Grant the function's execution role read/write access to this table
    /// and its indexes. A second grant for the same pair is rejected.
    pub fn grant_read_write(&self, stack: &mut Stack, function: &Function) -> Result<(), SynthError> {
        stack.record_grant(&self.logical_id, function.logical_id())?;
        let index_arn = sub_with("${TableArn}/index/*", &[("TableArn", self.arn())]);
        let document = PolicyDocument::new(vec![PolicyStatement {
            effect: Effect::Allow,
            action: READ_WRITE_ACTIONS.iter().map(|s| s.to_string()).collect(),
            resource: Some(vec![self.arn(), index_arn]),
            principal: None,
        }]);
        let properties = json!({
            "PolicyName": format!("{}ReadWrite{}", self.logical_id, function.logical_id()),
            "PolicyDocument": document,
            "Roles": [r#ref(function.role_id())],
        });
        stack.add_resource(
            &format!("{}-readwrite-{}", self.logical_id, function.logical_id()),
            CfnResource::new("AWS::IAM::Policy", properties),
        )?;
        Ok(())
    }
}
