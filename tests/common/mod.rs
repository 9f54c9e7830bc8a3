use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding the os-release fixture and an empty config.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        fs::write(temp_dir.path().join("config.toml"), "")?;
        Ok(Self { temp_dir })
    }

    /// Environment whose host identity file has the given content.
    pub fn with_os_release(content: &str) -> Result<Self> {
        let env = Self::new()?;
        fs::write(env.os_release_path(), content)?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn os_release_path(&self) -> PathBuf {
        self.path().join("os-release")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }
}
