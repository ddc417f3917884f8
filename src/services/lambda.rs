//! Function compute units and their execution roles.

use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

use crate::asset::{Asset, STAGING_BUCKET};
use crate::error::SynthError;
use crate::resource::{get_att, sub, CfnResource, LogicalId};
use crate::services::iam::Role;
use crate::stack::Stack;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Runtime {
    #[serde(rename = "java17")]
    Java17,
    #[serde(rename = "java21")]
    Java21,
    #[serde(rename = "provided.al2023")]
    ProvidedAl2023,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Architecture {
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "x86_64")]
    X8664,
}

/// A pre-built code artifact backing a function.
#[derive(Clone, Debug)]
pub struct Code {
    asset: Asset,
}

impl Code {
    /// Reference a local artifact. The path is checked and fingerprinted at
    /// declaration time, surfacing missing artifacts before deploy.
    pub fn from_asset(path: impl AsRef<Path>) -> Result<Self, SynthError> {
        Ok(Self {
            asset: Asset::from_path(path)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct FunctionProps {
    pub handler: String,
    pub runtime: Runtime,
    pub architecture: Architecture,
    pub memory_mb: u32,
    pub timeout_secs: u32,
    pub code: Code,
}

/// A declared function: the compute resource plus its own execution role.
#[derive(Clone, Debug)]
pub struct Function {
    logical_id: LogicalId,
    role_id: LogicalId,
}

impl Function {
    pub fn new(stack: &mut Stack, construct_id: &str, props: FunctionProps) -> Result<Self, SynthError> {
        let role = Role::service_role(
            stack,
            &format!("{construct_id}-role"),
            "lambda.amazonaws.com",
            vec![sub(
                "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole",
            )],
        )?;
        let properties = json!({
            "Handler": props.handler,
            "Runtime": props.runtime,
            "Architectures": [props.architecture],
            "MemorySize": props.memory_mb,
            "Timeout": props.timeout_secs,
            "Code": {
                "S3Bucket": sub(STAGING_BUCKET),
                "S3Key": props.code.asset.object_key,
            },
            "Role": role.arn(),
        });
        let logical_id = stack.add_resource(
            construct_id,
            CfnResource::new("AWS::Lambda::Function", properties).depends_on(role.logical_id()),
        )?;
        stack.add_asset(props.code.asset);
        Ok(Self {
            logical_id,
            role_id: role.logical_id().clone(),
        })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn role_id(&self) -> &LogicalId {
        &self.role_id
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }
}
