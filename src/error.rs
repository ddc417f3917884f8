//! Typed synthesis errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("invalid logical id: '{0}'")]
    InvalidLogicalId(String),
    #[error("duplicate logical id: '{0}'")]
    DuplicateLogicalId(String),
    #[error("duplicate method: {verb} {path}")]
    DuplicateMethod { verb: String, path: String },
    #[error("dangling reference: {kind} '{id}'")]
    DanglingReference { kind: &'static str, id: String },
    #[error("table '{table}' already grants read/write to function '{function}'")]
    DuplicateGrant { table: String, function: String },
    #[error("documentation part has no matching method: {verb} {path}")]
    DocumentationMismatch { verb: String, path: String },
    #[error("invalid hosted domain label: '{0}'")]
    InvalidDomainLabel(String),
    #[error("code asset not found: {0}")]
    AssetNotFound(PathBuf),
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize: {0}")]
    Json(#[from] serde_json::Error),
    #[error("archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}
