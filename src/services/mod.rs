//! Service-level constructs: typed wrappers that declare provider resources
//! into a stack and hand back referenceable handles.

pub mod apigateway;
pub mod cognito;
pub mod dynamodb;
pub mod iam;
pub mod lambda;
