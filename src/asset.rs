//! Code-artifact staging: fingerprint local artifacts and lay them out for upload.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::SynthError;

/// Staging bucket pattern; the provisioning engine resolves the pseudo-parameters
/// per target environment.
pub const STAGING_BUCKET: &str = "cirrus-assets-${AWS::AccountId}-${AWS::Region}";

/// How an artifact is packaged into the staging area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packaging {
    /// Single pre-built artifact copied as-is (a jar, zip, or binary).
    File,
    /// Directory archived at staging time.
    Archive,
}

/// A local code artifact referenced by a function declaration. The fingerprint
/// is content-derived, so an unchanged artifact maps to the same object key
/// across synthesis runs.
#[derive(Clone, Debug)]
pub struct Asset {
    pub source_path: PathBuf,
    pub fingerprint: String,
    pub object_key: String,
    pub packaging: Packaging,
}

impl Asset {
    /// Fingerprint the artifact at `path`. A missing path is a synthesis error,
    /// surfacing what would otherwise fail at deploy time.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SynthError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SynthError::AssetNotFound(path.to_path_buf()));
        }
        let (fingerprint, packaging) = if path.is_dir() {
            (hash_dir(path)?, Packaging::Archive)
        } else {
            (hash_file(path)?, Packaging::File)
        };
        let file_name = match packaging {
            Packaging::File => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "artifact".to_string()),
            Packaging::Archive => "archive.zip".to_string(),
        };
        let object_key = format!("assets/{}/{}", fingerprint, file_name);
        Ok(Self {
            source_path: path.to_path_buf(),
            fingerprint,
            object_key,
            packaging,
        })
    }

    /// Copy (or archive) the artifact into `outdir` under its object key.
    pub fn stage(&self, outdir: &Path) -> Result<PathBuf, SynthError> {
        let dest = outdir.join(&self.object_key);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        match self.packaging {
            Packaging::File => {
                fs::copy(&self.source_path, &dest)?;
            }
            Packaging::Archive => archive_dir(&self.source_path, &dest)?,
        }
        tracing::debug!(source = %self.source_path.display(), key = %self.object_key, "staged asset");
        Ok(dest)
    }
}

fn hash_file(path: &Path) -> Result<String, SynthError> {
    let mut hasher = Sha256::new();
    let mut file = fs::File::open(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

/// Hash relative entry names and file contents in sorted order, so the
/// fingerprint is stable across filesystems.
fn hash_dir(path: &Path) -> Result<String, SynthError> {
    let mut hasher = Sha256::new();
    for entry in collect_files(path)? {
        let rel = entry.strip_prefix(path).unwrap_or(&entry);
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update(fs::read(&entry)?);
    }
    Ok(to_hex(&hasher.finalize()))
}

fn archive_dir(src: &Path, dest: &Path) -> Result<(), SynthError> {
    let file = fs::File::create(dest)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for entry in collect_files(src)? {
        let rel = entry.strip_prefix(src).unwrap_or(&entry);
        writer.start_file(rel.to_string_lossy().as_ref(), options)?;
        writer.write_all(&fs::read(&entry)?)?;
    }
    writer.finish()?;
    Ok(())
}

/// All regular files under `root`, depth-first, sorted by name at each level.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>, SynthError> {
    let mut dirs = vec![root.to_path_buf()];
    let mut files = Vec::new();
    while let Some(dir) = dirs.pop() {
        let mut entries: Vec<PathBuf> =
            fs::read_dir(&dir)?.map(|e| e.map(|e| e.path())).collect::<Result<_, _>>()?;
        entries.sort();
        for entry in entries {
            if entry.is_dir() {
                dirs.push(entry);
            } else {
                files.push(entry);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
