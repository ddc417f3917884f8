//! Identity pool, app client, and hosted sign-in domain.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::error::SynthError;
use crate::resource::{get_att, r#ref, CfnResource, LogicalId};
use crate::stack::Stack;

/// DNS label rules for hosted domains: lowercase alphanumerics and interior
/// hyphens, at most 63 chars.
fn domain_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").expect("domain label pattern"))
}

#[derive(Clone, Debug)]
pub struct UserPoolProps {
    pub pool_name: String,
    /// Whether users may sign themselves up (false restricts creation to admins).
    pub self_sign_up: bool,
    pub auto_verify_email: bool,
    pub sign_in_email_alias: bool,
}

/// A managed user directory handle.
#[derive(Clone, Debug)]
pub struct UserPool {
    logical_id: LogicalId,
}

impl UserPool {
    pub fn new(stack: &mut Stack, construct_id: &str, props: UserPoolProps) -> Result<Self, SynthError> {
        let mut properties = json!({
            "UserPoolName": props.pool_name,
            "AdminCreateUserConfig": { "AllowAdminCreateUserOnly": !props.self_sign_up },
        });
        if props.auto_verify_email {
            properties["AutoVerifiedAttributes"] = json!(["email"]);
        }
        if props.sign_in_email_alias {
            properties["UsernameAttributes"] = json!(["email"]);
        }
        let logical_id = stack.add_resource(construct_id, CfnResource::new("AWS::Cognito::UserPool", properties))?;
        Ok(Self { logical_id })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn id_ref(&self) -> Value {
        r#ref(&self.logical_id)
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }
}

/// Auth flows the app client allows. Refresh-token auth is always on.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthFlow {
    pub user_password: bool,
    pub user_srp: bool,
    pub admin_user_password: bool,
}

impl AuthFlow {
    fn explicit_flows(&self) -> Vec<&'static str> {
        let mut flows = Vec::with_capacity(4);
        if self.user_password {
            flows.push("ALLOW_USER_PASSWORD_AUTH");
        }
        if self.user_srp {
            flows.push("ALLOW_USER_SRP_AUTH");
        }
        if self.admin_user_password {
            flows.push("ALLOW_ADMIN_USER_PASSWORD_AUTH");
        }
        flows.push("ALLOW_REFRESH_TOKEN_AUTH");
        flows
    }
}

#[derive(Clone, Debug)]
pub struct UserPoolClientProps {
    pub client_name: String,
    pub auth_flows: AuthFlow,
    /// Hosted-UI OAuth callback URLs; enables the authorization-code flow.
    pub callback_urls: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct UserPoolClient {
    logical_id: LogicalId,
}

impl UserPoolClient {
    pub fn new(
        stack: &mut Stack,
        construct_id: &str,
        user_pool: &UserPool,
        props: UserPoolClientProps,
    ) -> Result<Self, SynthError> {
        let mut properties = json!({
            "ClientName": props.client_name,
            "UserPoolId": user_pool.id_ref(),
            "ExplicitAuthFlows": props.auth_flows.explicit_flows(),
        });
        if !props.callback_urls.is_empty() {
            properties["CallbackURLs"] = json!(props.callback_urls);
            properties["AllowedOAuthFlows"] = json!(["code"]);
            properties["AllowedOAuthFlowsUserPoolClient"] = json!(true);
            properties["AllowedOAuthScopes"] = json!(["email", "openid", "profile"]);
            properties["SupportedIdentityProviders"] = json!(["COGNITO"]);
        }
        let logical_id =
            stack.add_resource(construct_id, CfnResource::new("AWS::Cognito::UserPoolClient", properties))?;
        Ok(Self { logical_id })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }
}

/// A hosted sign-in domain bound to one user pool.
#[derive(Clone, Debug)]
pub struct UserPoolDomain {
    logical_id: LogicalId,
    domain: String,
}

impl UserPoolDomain {
    pub fn new(
        stack: &mut Stack,
        construct_id: &str,
        user_pool: &UserPool,
        domain: &str,
    ) -> Result<Self, SynthError> {
        if domain.len() > 63 || !domain_label_pattern().is_match(domain) {
            return Err(SynthError::InvalidDomainLabel(domain.to_string()));
        }
        let properties = json!({
            "Domain": domain,
            "UserPoolId": user_pool.id_ref(),
        });
        let logical_id =
            stack.add_resource(construct_id, CfnResource::new("AWS::Cognito::UserPoolDomain", properties))?;
        Ok(Self {
            logical_id,
            domain: domain.to_string(),
        })
    }

    pub fn logical_id(&self) -> &LogicalId {
        &self.logical_id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Environment;

    fn test_stack() -> Stack {
        Stack::new(
            "Test",
            Environment {
                account: "123456789012".to_string(),
                region: "eu-west-1".to_string(),
            },
        )
    }

    fn test_pool(stack: &mut Stack) -> UserPool {
        UserPool::new(
            stack,
            "product-user-pool",
            UserPoolProps {
                pool_name: "ProductUserPool".to_string(),
                self_sign_up: true,
                auto_verify_email: true,
                sign_in_email_alias: true,
            },
        )
        .unwrap()
    }

    #[test]
    fn user_pool_declares_self_signup_and_email_policies() {
        let mut stack = test_stack();
        test_pool(&mut stack);
        let template = stack.synth().unwrap();
        let pool = template.resource("ProductUserPool").unwrap();
        assert_eq!(pool.type_, "AWS::Cognito::UserPool");
        assert_eq!(pool.properties["AdminCreateUserConfig"]["AllowAdminCreateUserOnly"], false);
        assert_eq!(pool.properties["AutoVerifiedAttributes"][0], "email");
        assert_eq!(pool.properties["UsernameAttributes"][0], "email");
    }

    #[test]
    fn client_declares_auth_flows_and_oauth_callback() {
        let mut stack = test_stack();
        let pool = test_pool(&mut stack);
        UserPoolClient::new(
            &mut stack,
            "product-user-pool-client",
            &pool,
            UserPoolClientProps {
                client_name: "ProductAPIPoolClient".to_string(),
                auth_flows: AuthFlow {
                    user_password: true,
                    user_srp: true,
                    admin_user_password: true,
                },
                callback_urls: vec!["https://www.lyngon.com".to_string()],
            },
        )
        .unwrap();

        let template = stack.synth().unwrap();
        let client = template.resource("ProductUserPoolClient").unwrap();
        let flows = client.properties["ExplicitAuthFlows"].as_array().unwrap();
        assert!(flows.contains(&json!("ALLOW_USER_PASSWORD_AUTH")));
        assert!(flows.contains(&json!("ALLOW_USER_SRP_AUTH")));
        assert!(flows.contains(&json!("ALLOW_ADMIN_USER_PASSWORD_AUTH")));
        assert!(flows.contains(&json!("ALLOW_REFRESH_TOKEN_AUTH")));
        assert_eq!(client.properties["CallbackURLs"][0], "https://www.lyngon.com");
        assert_eq!(client.properties["AllowedOAuthFlows"][0], "code");
        assert_eq!(client.properties["UserPoolId"], json!({ "Ref": "ProductUserPool" }));
    }

    #[test]
    fn hosted_domain_label_is_validated() {
        let mut stack = test_stack();
        let pool = test_pool(&mut stack);
        let err = UserPoolDomain::new(&mut stack, "bad-domain", &pool, "Not_Valid").unwrap_err();
        assert!(matches!(err, SynthError::InvalidDomainLabel(_)));

        let domain = UserPoolDomain::new(&mut stack, "products-domain", &pool, "demohimanshu2023").unwrap();
        assert_eq!(domain.domain(), "demohimanshu2023");
        let template = stack.synth().unwrap();
        assert_eq!(
            template.resource("ProductsDomain").unwrap().properties["Domain"],
            "demohimanshu2023"
        );
    }
}
