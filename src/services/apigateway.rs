//! REST API surface: resources, methods, integrations, authorizers,
//! deployment stage, and machine-readable documentation.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::SynthError;
use crate::resource::{get_att, r#ref, sub_with, CfnResource, LogicalId};
use crate::services::cognito::UserPool;
use crate::services::lambda::Function;
use crate::stack::{DocPartRecord, MethodRecord, Stack};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EndpointType {
    #[serde(rename = "REGIONAL")]
    Regional,
    #[serde(rename = "EDGE")]
    Edge,
    #[serde(rename = "PRIVATE")]
    Private,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct RestApiProps {
    pub api_name: String,
    pub description: Option<String>,
    pub endpoint_type: EndpointType,
}

/// A REST API handle; routes hang off `root()`.
#[derive(Clone, Debug)]
pub struct RestApi {
    logical_id: LogicalId,
}

impl RestApi {
    pub fn new(stack: &mut Stack, construct_id: &str, props: RestApiProps) -> Result<Self, SynthError> {
        let mut properties = json!({
            "Name": props.api_name,
            "EndpointConfiguration": { "Types": [props.endpoint_type] },
        });
        if let Some(description) = props.description {
            properties["Description"] = json!(description);
        }
        let logical_id = stack.add_resource(construct_id, CfnResource::new("AWS::ApiGateway::RestApi", properties))?;
        Ok(Self { logical_id })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn id_ref(&self) -> Value {
        r#ref(&self.logical_id)
    }

    pub fn root(&self) -> ApiResource {
        ApiResource {
            api: self.logical_id.clone(),
            resource_ref: get_att(&self.logical_id, "RootResourceId"),
            path: "/".to_string(),
        }
    }

    /// Declare the deployment and its stage; call once, after every method.
    pub fn finalize_deployment(&self, stack: &mut Stack, options: StageOptions) -> Result<(), SynthError> {
        let method_ids: Vec<LogicalId> = stack
            .methods()
            .iter()
            .filter(|m| m.api == self.logical_id)
            .map(|m| m.method_id.clone())
            .collect();

        let mut deployment = CfnResource::new(
            "AWS::ApiGateway::Deployment",
            json!({ "RestApiId": self.id_ref() }),
        );
        for id in &method_ids {
            deployment = deployment.depends_on(id);
        }
        let deployment_id = stack.add_resource(
            &format!("{}-deployment-{}", self.logical_id, options.stage_name),
            deployment,
        )?;

        let mut properties = json!({
            "RestApiId": self.id_ref(),
            "DeploymentId": r#ref(&deployment_id),
            "StageName": options.stage_name,
        });
        if let Some(version) = options.documentation_version {
            properties["DocumentationVersion"] = json!(version);
        }
        stack.add_resource(
            &format!("{}-stage-{}", self.logical_id, options.stage_name),
            CfnResource::new("AWS::ApiGateway::Stage", properties),
        )?;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct StageOptions {
    pub stage_name: String,
    pub documentation_version: Option<String>,
}

/// One path node of the API tree. `add_resource` returns the child node, so
/// nested paths chain naturally.
#[derive(Clone, Debug)]
pub struct ApiResource {
    api: LogicalId,
    resource_ref: Value,
    path: String,
}

impl ApiResource {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn add_resource(&self, stack: &mut Stack, path_part: &str) -> Result<ApiResource, SynthError> {
        let child_path = if self.path == "/" {
            format!("/{path_part}")
        } else {
            format!("{}/{}", self.path, path_part)
        };
        let properties = json!({
            "ParentId": self.resource_ref,
            "PathPart": path_part,
            "RestApiId": r#ref(&self.api),
        });
        let logical_id = stack.add_resource(
            &format!("{child_path}-resource"),
            CfnResource::new("AWS::ApiGateway::Resource", properties),
        )?;
        Ok(ApiResource {
            api: self.api.clone(),
            resource_ref: r#ref(&logical_id),
            path: child_path,
        })
    }

    /// Bind a verb on this path to a function. Also emits the invoke
    /// permission scoped to this route's source ARN.
    pub fn add_method(
        &self,
        stack: &mut Stack,
        verb: HttpMethod,
        integration: LambdaIntegration,
        options: &MethodOptions,
    ) -> Result<LogicalId, SynthError> {
        let verb_tag = verb.as_str().to_lowercase();
        let invocation_uri = sub_with(
            "arn:${AWS::Partition}:apigateway:${AWS::Region}:lambda:path/2015-03-31/functions/${FunctionArn}/invocations",
            &[("FunctionArn", integration.function_arn.clone())],
        );
        let mut properties = json!({
            "HttpMethod": verb.as_str(),
            "ResourceId": self.resource_ref,
            "RestApiId": r#ref(&self.api),
            "AuthorizationType": if options.authorizer.is_some() { "COGNITO_USER_POOLS" } else { "NONE" },
            "Integration": {
                "Type": "AWS_PROXY",
                "IntegrationHttpMethod": "POST",
                "Uri": invocation_uri,
            },
        });
        if let Some(authorizer) = &options.authorizer {
            properties["AuthorizerId"] = r#ref(authorizer);
        }
        let method_id = stack.add_resource(
            &format!("{}-{}-method", self.path, verb_tag),
            CfnResource::new("AWS::ApiGateway::Method", properties),
        )?;

        // Invoke permission for the gateway, wildcarded over stages and path
        // parameters.
        let wildcard_path: String = self
            .path
            .split('/')
            .map(|seg| if seg.starts_with('{') { "*" } else { seg })
            .collect::<Vec<_>>()
            .join("/");
        let source_arn = sub_with(
            &format!(
                "arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{ApiId}}/*/{}{}",
                verb.as_str(),
                wildcard_path
            ),
            &[("ApiId", r#ref(&self.api))],
        );
        stack.add_resource(
            &format!("{}-{}-permission", self.path, verb_tag),
            CfnResource::new(
                "AWS::Lambda::Permission",
                json!({
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": integration.function_arn,
                    "Principal": "apigateway.amazonaws.com",
                    "SourceArn": source_arn,
                }),
            ),
        )?;

        stack.record_method(MethodRecord {
            api: self.api.clone(),
            verb: verb.as_str().to_string(),
            path: self.path.clone(),
            authorizer: options.authorizer.clone(),
            method_id: method_id.clone(),
        });
        Ok(method_id)
    }
}

/// Proxy integration with one backing function.
#[derive(Clone, Debug)]
pub struct LambdaIntegration {
    function_arn: Value,
}

impl LambdaIntegration {
    pub fn new(function: &Function) -> Self {
        Self {
            function_arn: function.arn(),
        }
    }
}

/// Per-method options; today that is just the authorizer precondition.
#[derive(Clone, Debug, Default)]
pub struct MethodOptions {
    authorizer: Option<LogicalId>,
}

impl MethodOptions {
    pub fn open() -> Self {
        Self { authorizer: None }
    }

    pub fn cognito(authorizer: &CognitoAuthorizer) -> Self {
        Self {
            authorizer: Some(authorizer.logical_id.clone()),
        }
    }
}

/// Token-validation precondition backed by one user pool, attachable to every
/// method of the API it was declared on.
#[derive(Clone, Debug)]
pub struct CognitoAuthorizer {
    logical_id: LogicalId,
}

impl CognitoAuthorizer {
    pub fn new(
        stack: &mut Stack,
        construct_id: &str,
        api: &RestApi,
        user_pool: &UserPool,
    ) -> Result<Self, SynthError> {
        let logical_id = LogicalId::from_construct_id(construct_id)?;
        let properties = json!({
            "Name": logical_id.as_str(),
            "Type": "COGNITO_USER_POOLS",
            "IdentitySource": "method.request.header.Authorization",
            "ProviderARNs": [user_pool.arn()],
            "RestApiId": api.id_ref(),
        });
        let logical_id = stack.add_resource(construct_id, CfnResource::new("AWS::ApiGateway::Authorizer", properties))?;
        stack.record_authorizer(api.logical_id().clone(), logical_id.clone());
        Ok(Self { logical_id })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }
}

/// Static response-shape documentation for one route, attached as metadata.
pub struct DocumentationPart;

impl DocumentationPart {
    pub fn new(
        stack: &mut Stack,
        construct_id: &str,
        api: &RestApi,
        method: HttpMethod,
        path: &str,
        properties_json: &str,
    ) -> Result<LogicalId, SynthError> {
        let properties = json!({
            "Location": {
                "Type": "METHOD",
                "Method": method.as_str(),
                "Path": path,
            },
            "Properties": properties_json,
            "RestApiId": api.id_ref(),
        });
        let logical_id =
            stack.add_resource(construct_id, CfnResource::new("AWS::ApiGateway::DocumentationPart", properties))?;
        stack.record_doc_part(DocPartRecord {
            api: api.logical_id().clone(),
            verb: method.as_str().to_string(),
            path: path.to_string(),
        });
        Ok(logical_id)
    }
}

/// Named documentation snapshot registered against the API.
pub struct DocumentationVersion;

impl DocumentationVersion {
    pub fn new(
        stack: &mut Stack,
        construct_id: &str,
        api: &RestApi,
        version: &str,
        description: Option<&str>,
        parts: &[LogicalId],
    ) -> Result<LogicalId, SynthError> {
        let mut properties = json!({
            "DocumentationVersion": version,
            "RestApiId": api.id_ref(),
        });
        if let Some(description) = description {
            properties["Description"] = json!(description);
        }
        let mut resource = CfnResource::new("AWS::ApiGateway::DocumentationVersion", properties);
        for part in parts {
            resource = resource.depends_on(part);
        }
        stack.add_resource(construct_id, resource)
    }
}
