//! Local bit store.
//!
//! Installed bits live under `bits/<name>/` in the project. Each installed
//! bit carries a `.bit-version` marker naming the version that was unpacked.
//!
//! Installation is stage-then-rename: the archive is unpacked into a
//! temporary directory inside the store and only renamed to its final path
//! once it is complete, so a bit directory is never observed half-unpacked.
//! A previously installed version is moved aside before the rename and
//! deleted afterwards.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::descriptor::{Descriptor, DescriptorError, PlanName};
use crate::core::project::PROJECT_FILE;
use crate::core::BitId;

/// File recording the installed version of a bit.
pub const VERSION_MARKER: &str = ".bit-version";

/// Failure reading or writing the bit store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to unpack bit `{bit}`: {source:#}")]
    Unpack {
        bit: BitId,
        #[source]
        source: anyhow::Error,
    },

    #[error("bit store I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bit `{bit}` carries an invalid project.yaml: {source}")]
    InvalidDescriptor {
        bit: BitId,
        #[source]
        source: DescriptorError,
    },

    #[error("bit `{0}` is not installed; run `cpm install`")]
    NotInstalled(BitId),
}

impl StoreError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A bit materialized in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBit {
    pub id: BitId,
    pub path: PathBuf,
}

impl InstalledBit {
    /// Header directory, when the bit has one.
    pub fn include_dir(&self) -> Option<PathBuf> {
        let dir = self.path.join("include");
        dir.is_dir().then_some(dir)
    }

    /// Translation units shipped with the bit.
    ///
    /// Bits keep their sources in `sources/`; the bit's own tests and any
    /// entry point are never compiled into a dependent project.
    pub fn sources(&self) -> Result<Vec<PathBuf>> {
        crate::util::fs::find_sources(&self.path.join("sources"))
    }
}

/// The per-project store of installed bits.
#[derive(Debug, Clone)]
pub struct BitStore {
    root: PathBuf,
}

impl BitStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BitStore { root: root.into() }
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final directory of the bit called `name`.
    pub fn bit_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Version of `name` currently installed, if any.
    pub fn installed_version(&self, name: &str) -> Option<String> {
        let marker = self.bit_dir(name).join(VERSION_MARKER);
        fs::read_to_string(marker)
            .ok()
            .map(|version| version.trim().to_string())
    }

    /// Whether exactly this version of the bit is installed.
    pub fn is_installed(&self, bit: &BitId) -> bool {
        self.installed_version(bit.name()).as_deref() == Some(bit.version())
    }

    /// The installed bit called `name`, whatever its version.
    pub fn get(&self, name: &str) -> Option<InstalledBit> {
        let version = self.installed_version(name)?;
        let id = BitId::new(name, version).ok()?;
        Some(InstalledBit {
            path: self.bit_dir(name),
            id,
        })
    }

    /// Unpack a gzip-compressed tar archive as the bit `bit`.
    ///
    /// Archives may hold the bit's files at the top level or wrapped in a
    /// single directory.
    pub fn install(&self, bit: &BitId, archive: &[u8]) -> Result<InstalledBit, StoreError> {
        fs::create_dir_all(&self.root).map_err(StoreError::io(&self.root))?;

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)
            .map_err(StoreError::io(&self.root))?;

        let unpacked = staging.path().join("unpacked");
        extract_tarball(archive, &unpacked).map_err(|source| StoreError::Unpack {
            bit: bit.clone(),
            source,
        })?;

        let content_root = single_directory(&unpacked).unwrap_or(unpacked);
        let marker = content_root.join(VERSION_MARKER);
        fs::write(&marker, format!("{}\n", bit.version())).map_err(StoreError::io(&marker))?;

        let final_dir = self.bit_dir(bit.name());

        // Held until the new version is in place; dropping it deletes the old one.
        let retired = if final_dir.exists() {
            let trash = tempfile::Builder::new()
                .prefix(".retired-")
                .tempdir_in(&self.root)
                .map_err(StoreError::io(&self.root))?;
            fs::rename(&final_dir, trash.path().join(bit.name()))
                .map_err(StoreError::io(&final_dir))?;
            Some(trash)
        } else {
            None
        };

        fs::rename(&content_root, &final_dir).map_err(StoreError::io(&final_dir))?;
        drop(retired);

        tracing::debug!("unpacked {} into {}", bit, final_dir.display());

        Ok(InstalledBit {
            id: bit.clone(),
            path: final_dir,
        })
    }

    /// Bits the installed bit depends on, from its own project.yaml.
    ///
    /// A bit without a descriptor has no dependencies.
    pub fn dependencies(&self, bit: &InstalledBit) -> Result<Vec<BitId>, StoreError> {
        let path = bit.path.join(PROJECT_FILE);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path).map_err(StoreError::io(&path))?;
        let descriptor =
            Descriptor::parse(&contents).map_err(|source| StoreError::InvalidDescriptor {
                bit: bit.id.clone(),
                source,
            })?;

        Ok(descriptor
            .plan(PlanName::Build)
            .bit_ids()
            .cloned()
            .collect())
    }

    /// Every installed bit reachable from `roots`, in depth-first order.
    ///
    /// A bit present at a different version than requested is used as
    /// installed (the store keeps one version per name); a bit that is not
    /// installed at all is an error.
    pub fn closure<'a>(
        &self,
        roots: impl IntoIterator<Item = &'a BitId>,
    ) -> Result<Vec<InstalledBit>, StoreError> {
        let mut stack: Vec<BitId> = roots.into_iter().cloned().collect();
        stack.reverse();

        let mut seen = HashSet::new();
        let mut closure = Vec::new();

        while let Some(wanted) = stack.pop() {
            if !seen.insert(wanted.name().to_string()) {
                continue;
            }

            let installed = self
                .get(wanted.name())
                .ok_or_else(|| StoreError::NotInstalled(wanted.clone()))?;
            if installed.id != wanted {
                tracing::warn!(
                    "bit `{}` requested at {} but {} is installed",
                    wanted.name(),
                    wanted.version(),
                    installed.id.version()
                );
            }

            for dep in self.dependencies(&installed)?.into_iter().rev() {
                if !seen.contains(dep.name()) {
                    stack.push(dep);
                }
            }
            closure.push(installed);
        }

        Ok(closure)
    }
}

/// Directories that belong to a bit's own layout and are never a wrapper.
const LAYOUT_DIRS: &[&str] = &["include", "sources", "tests"];

/// If `dir` contains exactly one entry and it is a wrapping directory, return it.
fn single_directory(dir: &Path) -> Option<PathBuf> {
    let mut entries = fs::read_dir(dir).ok()?;
    let only = entries.next()?.ok()?;
    if entries.next().is_some() {
        return None;
    }
    let path = only.path();
    let is_layout_dir = LAYOUT_DIRS
        .iter()
        .any(|name| only.file_name() == std::ffi::OsStr::new(name));
    (path.is_dir() && !is_layout_dir).then_some(path)
}

/// Extract a gzip-compressed tarball into `dest`.
///
/// Entries that would land outside `dest` are skipped.
pub fn extract_tarball(data: &[u8], dest: &Path) -> Result<()> {
    use flate2::read::GzDecoder;
    use std::io::Cursor;
    use tar::Archive;

    let decoder = GzDecoder::new(Cursor::new(data));
    let mut archive = Archive::new(decoder);

    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for entry in archive.entries().context("failed to read tarball entries")? {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry
            .path()
            .context("failed to get entry path")?
            .to_string_lossy()
            .into_owned();

        let unpacked = entry
            .unpack_in(dest)
            .with_context(|| format!("failed to extract {}", entry_path))?;
        if !unpacked {
            tracing::warn!("skipping tarball entry outside the bit: {}", entry_path);
        }
    }

    Ok(())
}
