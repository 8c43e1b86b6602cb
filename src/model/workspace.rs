use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use ignore::WalkBuilder;
use uuid::Uuid;

use crate::error::DotnetGetError;

/// Temporary directory a repository is cloned into for one run.
///
/// Shared between the pipeline and the interrupt hook; whichever calls
/// [`CloneWorkspace::cleanup`] first does the deletion.
#[derive(Debug)]
pub struct CloneWorkspace {
    path: PathBuf,
    cleaned: AtomicBool,
}

impl CloneWorkspace {
    /// Picks a fresh, not yet existing path under `parent`.
    pub fn new(parent: &Path) -> Self {
        let path = parent.join(format!("dotnet-get-{}", Uuid::new_v4()));
        Self {
            path,
            cleaned: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_cleaned(&self) -> bool {
        self.cleaned.load(Ordering::SeqCst)
    }

    /// Removes the clone. Only the first call does any work; later calls return `Ok`.
    pub fn cleanup(&self) -> Result<(), DotnetGetError> {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::info!("removing clone at {}", self.path.display());
        remove_tree(&self.path).map_err(|source| DotnetGetError::Cleanup {
            path: self.path.clone(),
            source,
        })
    }

    /// Cleanup for contexts that cannot report errors (signal hook, drop).
    pub fn cleanup_quietly(&self) {
        if let Err(err) = self.cleanup() {
            tracing::warn!("{err}");
        }
    }
}

impl Drop for CloneWorkspace {
    fn drop(&mut self) {
        self.cleanup_quietly();
    }
}

fn remove_tree(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }

    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            // git marks pack files read-only, which blocks deletion on Windows.
            tracing::debug!("retrying removal of {} after clearing read-only: {err}", path.display());
            clear_readonly(path);
            fs::remove_dir_all(path)
        }
    }
}

#[allow(clippy::permissions_set_readonly_false)]
fn clear_readonly(root: &Path) {
    for entry in WalkBuilder::new(root).standard_filters(false).build().flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };

        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            let _ = fs::set_permissions(entry.path(), permissions);
        }
    }
}
