//! Throwaway config files and directories for CLI tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// A scratch directory holding `config.toml` and a proof directory.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    /// Config with an in-memory store, so every invocation starts empty.
    pub fn in_memory() -> Self {
        Self::with_database(":memory:")
    }

    /// Config with a SQLite file inside the workspace.
    pub fn sqlite() -> Self {
        Self::with_database("linepool.db")
    }

    fn with_database(database: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let database = if database == ":memory:" {
            database.to_string()
        } else {
            dir.path().join(database).to_string_lossy().replace('\\', "/")
        };
        let proofs = dir.path().join("proofs").to_string_lossy().replace('\\', "/");
        let toml = format!(
            concat!(
                "[logging]\n",
                "level = \"warn\"\n",
                "\n",
                "[storage]\n",
                "database = \"{}\"\n",
                "proof_dir = \"{}\"\n",
                "\n",
                "[[price.sources]]\n",
                "name = \"local\"\n",
                "url = \"http://127.0.0.1:9/price?ids={{asset}}\"\n",
                "pointer = \"/price\"\n",
            ),
            database, proofs
        );
        fs::write(dir.path().join("config.toml"), toml).expect("write config");
        Self { dir }
    }

    pub fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// Write `contents` to `name` inside the workspace.
    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write temp file");
        path
    }
}
