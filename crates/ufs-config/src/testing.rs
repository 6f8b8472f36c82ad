//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage an isolated project root with its
//! own `.ufs/` state directory, so tests never touch the real canonical
//! image path or each other.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use tempfile::TempDir;

use ufs_defs::SizeRequest;

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated test environment with its own project root and state directory.
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Project root for the test
    pub project_root: PathBuf,
    /// Isolated `.ufs` state directory
    pub state_dir: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        let project_root = root.join(format!("project-{}", test_id));
        let state_dir = project_root.join(".ufs");

        std::fs::create_dir_all(&state_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_root,
            state_dir,
            test_id,
        })
    }

    /// Path of the index image inside this environment.
    pub fn image_path(&self) -> PathBuf {
        self.state_dir.join("ufs_index")
    }

    /// Write a project-local config file.
    pub fn write_config(&self, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.state_dir.join("config.toml");
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// A deliberately small capacity request, so exhaustion paths are
    /// reachable in tests.
    pub fn small_size_request() -> SizeRequest {
        SizeRequest {
            num_files: 16,
            num_areas: 8,
            num_nodes: 64,
            num_str_bytes: 256,
        }
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_creates_directories() {
        let env = TestEnvironment::new().unwrap();
        assert!(env.project_root.exists());
        assert!(env.state_dir.exists());
        assert!(!env.image_path().exists());
    }

    #[test]
    fn test_environments_are_isolated() {
        let env1 = TestEnvironment::new().unwrap();
        let env2 = TestEnvironment::new().unwrap();
        assert_ne!(env1.image_path(), env2.image_path());
    }

    #[test]
    fn test_write_config() {
        let env = TestEnvironment::new().unwrap();
        let path = env.write_config("[image]\nnum_files = 4\n").unwrap();
        assert!(path.exists());
    }
}
