//! Application entry: a deployable unit bound to an execution environment,
//! synthesizing templates, assets, and a manifest into an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SynthError;
use crate::stack::Stack;
use crate::template::{AssetEntry, Manifest, StackArtifact, MANIFEST_VERSION};

pub const ACCOUNT_VAR: &str = "CIRRUS_ACCOUNT";
pub const REGION_VAR: &str = "CIRRUS_REGION";
pub const OUTDIR_VAR: &str = "CIRRUS_OUTDIR";

const DEFAULT_OUTDIR: &str = "cirrus.out";

/// Target account and region for a deployment.
#[derive(Clone, Debug)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

impl Environment {
    /// Read the target environment from `CIRRUS_ACCOUNT` / `CIRRUS_REGION`.
    pub fn from_env() -> Result<Self, SynthError> {
        let account = std::env::var(ACCOUNT_VAR).map_err(|_| SynthError::MissingEnv(ACCOUNT_VAR))?;
        let region = std::env::var(REGION_VAR).map_err(|_| SynthError::MissingEnv(REGION_VAR))?;
        Ok(Self { account, region })
    }
}

/// The deployable unit: holds stacks and drives synthesis.
pub struct App {
    outdir: PathBuf,
    stacks: Vec<Stack>,
}

impl App {
    /// Output directory from `CIRRUS_OUTDIR`, defaulting to `cirrus.out`.
    pub fn new() -> Self {
        let outdir = std::env::var(OUTDIR_VAR).unwrap_or_else(|_| DEFAULT_OUTDIR.to_string());
        Self::with_outdir(outdir)
    }

    pub fn with_outdir(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            stacks: Vec::new(),
        }
    }

    pub fn add_stack(&mut self, stack: Stack) {
        self.stacks.push(stack);
    }

    /// Synthesize every stack: validate, write `<name>.template.json`, stage
    /// code assets, and write the manifest. Returns the output directory.
    /// Any error leaves no manifest behind, so a partial run is never
    /// mistaken for a deployable one.
    pub fn synth(&self) -> Result<PathBuf, SynthError> {
        fs::create_dir_all(&self.outdir)?;
        let manifest_path = self.outdir.join("manifest.json");
        if manifest_path.exists() {
            fs::remove_file(&manifest_path)?;
        }

        let mut artifacts = Vec::with_capacity(self.stacks.len());
        for stack in &self.stacks {
            let template = stack.synth()?;
            let template_file = format!("{}.template.json", stack.name());
            write_pretty_json(&self.outdir.join(&template_file), &template)?;

            let mut assets = Vec::with_capacity(stack.assets().len());
            for asset in stack.assets() {
                asset.stage(&self.outdir)?;
                assets.push(AssetEntry {
                    source_path: asset.source_path.display().to_string(),
                    fingerprint: asset.fingerprint.clone(),
                    object_key: asset.object_key.clone(),
                });
            }
            tracing::info!(
                stack = %stack.name(),
                resources = template.resources.len(),
                assets = assets.len(),
                "synthesized"
            );
            artifacts.push(StackArtifact {
                stack_name: stack.name().to_string(),
                template_file,
                account: stack.env().account.clone(),
                region: stack.env().region.clone(),
                assets,
            });
        }

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            stacks: artifacts,
        };
        write_pretty_json(&manifest_path, &manifest)?;
        Ok(self.outdir.clone())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

fn write_pretty_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), SynthError> {
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    fs::write(path, body)?;
    Ok(())
}
