//! Cirrus SDK: declarative AWS infrastructure synthesis library.

pub mod app;
pub mod asset;
pub mod error;
pub mod resource;
pub mod services;
pub mod stack;
pub mod template;
mod validator;

pub use app::{App, Environment};
pub use asset::Asset;
pub use error::SynthError;
pub use resource::{get_att, r#ref, sub, sub_with, CfnResource, DeletionPolicy, LogicalId};
pub use stack::Stack;
pub use template::{Manifest, Output, Template};
