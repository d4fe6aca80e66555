use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::TimesliceResult;

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> TimesliceResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Hidden sibling of `path` that keeps its extension: `out/a.png` -> `out/.a.partial.png`.
pub(crate) fn temp_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.partial"),
    };
    path.with_file_name(name)
}

/// Removes a temporary file on drop unless it was published.
pub(crate) struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self(Some(path))
    }

    /// Rename the temporary file onto `dest`.
    pub(crate) fn publish(mut self, dest: &Path) -> TimesliceResult<()> {
        if let Some(tmp) = self.0.take() {
            if let Err(e) = std::fs::rename(&tmp, dest) {
                let _ = std::fs::remove_file(&tmp);
                return Err(anyhow::Error::new(e)
                    .context(format!("failed to publish '{}'", dest.display()))
                    .into());
            }
        }
        Ok(())
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
