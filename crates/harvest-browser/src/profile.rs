use crate::Result;
use std::path::Path;
use tempfile::TempDir;

/// Throw-away Chrome user-data directory, removed when dropped
///
/// One per browser session; two live sessions never share a profile.
#[derive(Debug)]
pub struct ScratchProfile {
    dir: TempDir,
}

impl ScratchProfile {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("harvest-profile-")
            .tempdir()?;

        tracing::debug!("Created scratch profile at {}", dir.path().display());

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
