//! Product service stack: one key-value table, five functions with table
//! grants, a user pool with hosted sign-in, and a documented REST API guarded
//! by a Cognito authorizer.

use std::path::{Path, PathBuf};

use cirrus_sdk::services::apigateway::{
    CognitoAuthorizer, DocumentationPart, DocumentationVersion, EndpointType, HttpMethod,
    LambdaIntegration, MethodOptions, RestApi, RestApiProps, StageOptions,
};
use cirrus_sdk::services::cognito::{
    AuthFlow, UserPool, UserPoolClient, UserPoolClientProps, UserPoolDomain, UserPoolProps,
};
use cirrus_sdk::services::dynamodb::{Attribute, Table, TableProps, DEFAULT_BILLING};
use cirrus_sdk::services::lambda::{Architecture, Code, Function, FunctionProps, Runtime};
use cirrus_sdk::{DeletionPolicy, Environment, Stack, SynthError};

use crate::docs;

const STACK_NAME: &str = "ProductServiceStack";
const API_NAME: &str = "Product_Service";
const API_STAGE: &str = "demo";
const DOC_VERSION: &str = "1.1";
const HOSTED_DOMAIN: &str = "demohimanshu2023";
const CALLBACK_URL: &str = "https://www.lyngon.com";
const FUNCTION_TIMEOUT_SECS: u32 = 20;
const FUNCTION_MEMORY_MB: u32 = 256;
const FUNCTION_ARTIFACT: &str = "../assets/function.jar";
pub const PRODUCT_TABLE_NAME: &str = "product";

struct FunctionSpec {
    construct_id: String,
    handler: String,
    artifact: PathBuf,
}

fn default_specs(artifact: &Path) -> [FunctionSpec; 5] {
    let spec = |construct_id: &str, handler: &str| FunctionSpec {
        construct_id: construct_id.to_string(),
        handler: handler.to_string(),
        artifact: artifact.to_path_buf(),
    };
    [
        spec("getlist-product-lambda", "org.myorg.demo.lambda.GetProductList"),
        spec("create-product-lambda", "org.myorg.demo.lambda.AddProduct"),
        spec("get-product-lambda", "org.myorg.demo.lambda.GetProduct"),
        spec("update-product-lambda", "org.myorg.demo.lambda.UpdateProduct"),
        spec("delete-product-lambda", "org.myorg.demo.lambda.DeleteProduct"),
    ]
}

/// Declare the product service stack against the shared pre-built artifact.
pub fn declare(env: Environment) -> Result<Stack, SynthError> {
    declare_with(env, &default_specs(Path::new(FUNCTION_ARTIFACT)))
}

fn declare_with(env: Environment, specs: &[FunctionSpec; 5]) -> Result<Stack, SynthError> {
    let mut stack = Stack::new(STACK_NAME, env)
        .with_description("Product API REST service demo CRUD operations.");

    let table = Table::new(
        &mut stack,
        PRODUCT_TABLE_NAME,
        TableProps {
            table_name: PRODUCT_TABLE_NAME.to_string(),
            partition_key: Attribute::string("id"),
            sort_key: None,
            billing: DEFAULT_BILLING,
            removal_policy: DeletionPolicy::Delete,
        },
    )?;

    let user_pool = UserPool::new(
        &mut stack,
        "product-user-pool",
        UserPoolProps {
            pool_name: "ProductUserPool".to_string(),
            self_sign_up: true,
            auto_verify_email: true,
            sign_in_email_alias: true,
        },
    )?;
    UserPoolClient::new(
        &mut stack,
        "product-user-pool-client",
        &user_pool,
        UserPoolClientProps {
            client_name: "ProductAPIPoolClient".to_string(),
            auth_flows: AuthFlow {
                user_password: true,
                user_srp: true,
                admin_user_password: true,
            },
            callback_urls: vec![CALLBACK_URL.to_string()],
        },
    )?;
    let domain = UserPoolDomain::new(&mut stack, "products-domain", &user_pool, HOSTED_DOMAIN)?;
    stack.add_output(
        "CognitoDomainNameOutput",
        serde_json::Value::String(domain.domain().to_string()),
        Some("Cognito hosted domain name"),
    );

    let mut functions = Vec::with_capacity(specs.len());
    for spec in specs {
        let function = Function::new(
            &mut stack,
            &spec.construct_id,
            FunctionProps {
                handler: spec.handler.clone(),
                runtime: Runtime::Java17,
                architecture: Architecture::Arm64,
                memory_mb: FUNCTION_MEMORY_MB,
                timeout_secs: FUNCTION_TIMEOUT_SECS,
                code: Code::from_asset(&spec.artifact)?,
            },
        )?;
        table.grant_read_write(&mut stack, &function)?;
        functions.push(function);
    }

    let api = RestApi::new(
        &mut stack,
        "products-api",
        RestApiProps {
            api_name: API_NAME.to_string(),
            description: Some("Product API REST service demo CRUD operations.".to_string()),
            endpoint_type: EndpointType::Regional,
        },
    )?;
    let authorizer = CognitoAuthorizer::new(&mut stack, "product-cognito-authorizer", &api, &user_pool)?;
    let guarded = MethodOptions::cognito(&authorizer);

    let list = api.root().add_resource(&mut stack, "getproducts")?;
    list.add_method(&mut stack, HttpMethod::Get, LambdaIntegration::new(&functions[0]), &guarded)?;

    let add = api.root().add_resource(&mut stack, "addProduct")?;
    add.add_method(&mut stack, HttpMethod::Post, LambdaIntegration::new(&functions[1]), &guarded)?;

    let by_id = api
        .root()
        .add_resource(&mut stack, "getProductById")?
        .add_resource(&mut stack, "{id}")?;
    by_id.add_method(&mut stack, HttpMethod::Get, LambdaIntegration::new(&functions[2]), &guarded)?;

    let update = api.root().add_resource(&mut stack, "updateProduct")?;
    update.add_method(&mut stack, HttpMethod::Put, LambdaIntegration::new(&functions[3]), &guarded)?;

    let delete = api
        .root()
        .add_resource(&mut stack, "deleteProduct")?
        .add_resource(&mut stack, "{id}")?;
    delete.add_method(&mut stack, HttpMethod::Delete, LambdaIntegration::new(&functions[4]), &guarded)?;

    let parts = [
        DocumentationPart::new(&mut stack, "doc-getProductList", &api, HttpMethod::Get, list.path(), docs::GET_PRODUCT_LIST)?,
        DocumentationPart::new(&mut stack, "doc-addProduct", &api, HttpMethod::Post, add.path(), docs::ADD_PRODUCT)?,
        DocumentationPart::new(&mut stack, "doc-getProductById", &api, HttpMethod::Get, by_id.path(), docs::GET_PRODUCT_BY_ID)?,
        DocumentationPart::new(&mut stack, "doc-updateProduct", &api, HttpMethod::Put, update.path(), docs::UPDATE_PRODUCT)?,
        DocumentationPart::new(&mut stack, "doc-deleteProduct", &api, HttpMethod::Delete, delete.path(), docs::DELETE_PRODUCT)?,
    ];
    DocumentationVersion::new(&mut stack, "doc-version", &api, DOC_VERSION, Some("Product API documentation"), &parts)?;

    api.finalize_deployment(
        &mut stack,
        StageOptions {
            stage_name: API_STAGE.to_string(),
            documentation_version: Some(DOC_VERSION.to_string()),
        },
    )?;

    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_sdk::Template;
    use serde_json::{json, Value};
    use std::collections::{BTreeSet, HashMap};
    use std::fs;

    fn test_env() -> Environment {
        Environment {
            account: "123456789012".to_string(),
            region: "eu-west-1".to_string(),
        }
    }

    fn synth_with_artifact(dir: &Path) -> Template {
        let artifact = dir.join("function.jar");
        if !artifact.exists() {
            fs::write(&artifact, b"jar-bytes").unwrap();
        }
        declare_with(test_env(), &default_specs(&artifact))
            .unwrap()
            .synth()
            .unwrap()
    }

    /// Rebuild each method's full path from the API resource tree.
    fn route_set(template: &Template) -> BTreeSet<(String, String)> {
        let mut nodes: HashMap<String, (String, Option<String>)> = HashMap::new();
        for (id, resource) in template.resources_of_type("AWS::ApiGateway::Resource") {
            let part = resource.properties["PathPart"].as_str().unwrap().to_string();
            let parent = resource.properties["ParentId"]["Ref"].as_str().map(str::to_string);
            nodes.insert(id.to_string(), (part, parent));
        }
        fn full_path(id: &str, nodes: &HashMap<String, (String, Option<String>)>) -> String {
            match nodes.get(id) {
                Some((part, Some(parent))) => format!("{}/{}", full_path(parent, nodes), part),
                Some((part, None)) => format!("/{part}"),
                None => String::new(),
            }
        }
        template
            .resources_of_type("AWS::ApiGateway::Method")
            .into_iter()
            .map(|(_, m)| {
                let verb = m.properties["HttpMethod"].as_str().unwrap().to_string();
                let resource_id = m.properties["ResourceId"]["Ref"].as_str().unwrap();
                (verb, full_path(resource_id, &nodes))
            })
            .collect()
    }

    fn expected_routes() -> BTreeSet<(String, String)> {
        [
            ("GET", "/getproducts"),
            ("POST", "/addProduct"),
            ("GET", "/getProductById/{id}"),
            ("PUT", "/updateProduct"),
            ("DELETE", "/deleteProduct/{id}"),
        ]
        .iter()
        .map(|(v, p)| (v.to_string(), p.to_string()))
        .collect()
    }

    #[test]
    fn five_routes_match_the_literal_set() {
        let dir = tempfile::tempdir().unwrap();
        let template = synth_with_artifact(dir.path());
        assert_eq!(route_set(&template), expected_routes());
    }

    #[test]
    fn every_route_is_guarded_by_the_one_authorizer() {
        let dir = tempfile::tempdir().unwrap();
        let template = synth_with_artifact(dir.path());
        let authorizers = template.resources_of_type("AWS::ApiGateway::Authorizer");
        assert_eq!(authorizers.len(), 1);
        let methods = template.resources_of_type("AWS::ApiGateway::Method");
        assert_eq!(methods.len(), 5);
        for (_, method) in methods {
            assert_eq!(method.properties["AuthorizationType"], "COGNITO_USER_POOLS");
            assert_eq!(
                method.properties["AuthorizerId"],
                json!({ "Ref": "ProductCognitoAuthorizer" })
            );
        }
    }

    #[test]
    fn each_function_holds_one_grant_on_the_single_table() {
        let dir = tempfile::tempdir().unwrap();
        let template = synth_with_artifact(dir.path());
        assert_eq!(template.resources_of_type("AWS::DynamoDB::Table").len(), 1);
        assert_eq!(template.resources_of_type("AWS::Lambda::Function").len(), 5);

        let grants = template.resources_of_type("AWS::IAM::Policy");
        assert_eq!(grants.len(), 5);
        let mut granted_roles = BTreeSet::new();
        for (_, grant) in &grants {
            let statement = &grant.properties["PolicyDocument"]["Statement"][0];
            assert_eq!(statement["Resource"][0], json!({ "Fn::GetAtt": ["Product", "Arn"] }));
            let role = grant.properties["Roles"][0]["Ref"].as_str().unwrap().to_string();
            granted_roles.insert(role);
        }
        // One distinct execution role per function.
        assert_eq!(granted_roles.len(), 5);
    }

    #[test]
    fn table_partition_key_and_removal_policy() {
        let dir = tempfile::tempdir().unwrap();
        let template = synth_with_artifact(dir.path());
        let table = template.resource("Product").unwrap();
        assert_eq!(table.properties["TableName"], "product");
        assert_eq!(table.properties["KeySchema"][0]["AttributeName"], "id");
        assert_eq!(table.properties["KeySchema"][0]["KeyType"], "HASH");
        assert_eq!(table.properties["AttributeDefinitions"][0]["AttributeType"], "S");
        assert_eq!(table.deletion_policy, Some(DeletionPolicy::Delete));
    }

    #[test]
    fn documentation_matches_each_route_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let template = synth_with_artifact(dir.path());
        let parts = template.resources_of_type("AWS::ApiGateway::DocumentationPart");
        assert_eq!(parts.len(), 5);
        let documented: BTreeSet<(String, String)> = parts
            .iter()
            .map(|(_, p)| {
                (
                    p.properties["Location"]["Method"].as_str().unwrap().to_string(),
                    p.properties["Location"]["Path"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(documented, expected_routes());
        for (_, part) in &parts {
            // Properties are a literal JSON string describing 200/400/500 shapes.
            let body: Value =
                serde_json::from_str(part.properties["Properties"].as_str().unwrap()).unwrap();
            let codes: Vec<i64> = body["responses"]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r["code"].as_i64().unwrap())
                .collect();
            assert_eq!(codes, vec![200, 400, 500]);
        }

        let versions = template.resources_of_type("AWS::ApiGateway::DocumentationVersion");
        assert_eq!(versions.len(), 1);
        let (_, version) = versions[0];
        assert_eq!(version.properties["DocumentationVersion"], "1.1");
        assert_eq!(version.depends_on.len(), 5);
    }

    #[test]
    fn stage_carries_name_and_documentation_version() {
        let dir = tempfile::tempdir().unwrap();
        let template = synth_with_artifact(dir.path());
        let stages = template.resources_of_type("AWS::ApiGateway::Stage");
        assert_eq!(stages.len(), 1);
        let (_, stage) = stages[0];
        assert_eq!(stage.properties["StageName"], "demo");
        assert_eq!(stage.properties["DocumentationVersion"], "1.1");
        let deployments = template.resources_of_type("AWS::ApiGateway::Deployment");
        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].1.depends_on.len(), 5);
    }

    #[test]
    fn hosted_domain_is_the_single_output() {
        let dir = tempfile::tempdir().unwrap();
        let template = synth_with_artifact(dir.path());
        assert_eq!(template.outputs.len(), 1);
        assert_eq!(template.outputs["CognitoDomainNameOutput"].value, json!("demohimanshu2023"));
    }

    #[test]
    fn changing_one_function_leaves_the_others_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = synth_with_artifact(dir.path());

        let other_artifact = dir.path().join("create.jar");
        fs::write(&other_artifact, b"different-bytes").unwrap();
        let mut specs = default_specs(&dir.path().join("function.jar"));
        specs[1].handler = "org.myorg.demo.lambda.AddProductV2".to_string();
        specs[1].artifact = other_artifact;
        let changed = declare_with(test_env(), &specs).unwrap().synth().unwrap();

        let changed_fn = "CreateProductLambda";
        assert_ne!(
            baseline.resource(changed_fn).unwrap(),
            changed.resource(changed_fn).unwrap()
        );
        for id in ["GetlistProductLambda", "GetProductLambda", "UpdateProductLambda", "DeleteProductLambda"] {
            assert_eq!(baseline.resource(id).unwrap(), changed.resource(id).unwrap(), "{id} drifted");
        }
    }

    #[test]
    fn synthesis_stages_the_artifact_and_writes_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("function.jar");
        fs::write(&artifact, b"jar-bytes").unwrap();
        let out = tempfile::tempdir().unwrap();

        let stack = declare_with(test_env(), &default_specs(&artifact)).unwrap();
        let mut app = cirrus_sdk::App::with_outdir(out.path());
        app.add_stack(stack);
        let outdir = app.synth().unwrap();

        assert!(outdir.join("ProductServiceStack.template.json").exists());
        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(outdir.join("manifest.json")).unwrap()).unwrap();
        let assets = manifest["stacks"][0]["assets"].as_array().unwrap();
        // One shared artifact declared five times.
        assert_eq!(assets.len(), 5);
        let key = assets[0]["object_key"].as_str().unwrap();
        assert!(outdir.join(key).exists());
    }
}
