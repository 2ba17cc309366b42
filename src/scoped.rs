use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::{Builder, NamedTempFile};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPolicy {
    Required,
    BestEffort,
}

pub struct ScopedTempFile {
    file: Option<NamedTempFile>,
    path: PathBuf,
    policy: CleanupPolicy,
}

impl ScopedTempFile {
    pub fn create(dir: &Path, prefix: &str, suffix: &str, policy: CleanupPolicy) -> Result<Self> {
        let file = Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .rand_bytes(16)
            .tempfile_in(dir)?;
        let path = file.path().to_path_buf();

        Ok(Self { file: Some(file), path, policy })
    }

    pub fn with_contents(
        dir: &Path,
        prefix: &str,
        suffix: &str,
        policy: CleanupPolicy,
        bytes: &[u8],
    ) -> Result<Self> {
        let mut scoped = Self::create(dir, prefix, suffix, policy)?;
        scoped.write_all(bytes)?;
        Ok(scoped)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> CleanupPolicy {
        self.policy
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(bytes)?;
            file.flush()?;
        }
        Ok(())
    }

    // Only `Required` files report a failed removal to the caller.
    pub fn finish(mut self) -> Result<()> {
        match self.remove() {
            Err(e) if self.policy == CleanupPolicy::Required => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn remove(&mut self) -> std::io::Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        let result = file.close();
        if let Err(ref e) = result {
            match self.policy {
                CleanupPolicy::Required => {
                    log::error!("Could not delete temporary file {}: {}", self.path.display(), e)
                }
                CleanupPolicy::BestEffort => {
                    log::warn!("Could not delete temporary file {}: {}", self.path.display(), e)
                }
            }
        }
        result
    }
}

impl Drop for ScopedTempFile {
    fn drop(&mut self) {
        let _ = self.remove();
    }
}
