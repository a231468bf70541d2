//! Content-addressed proof storage on the local filesystem.
//!
//! Each blob is written as `<hash>.json` under the root directory and
//! addressed by a `file://` URL. Writes go to a temporary file first and
//! are renamed into place, so a reader never sees a partial proof.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::domain::proof::hash_bytes;
use crate::error::{Error, Result};
use crate::port::outbound::proof::ProofStore;

#[derive(Debug, Clone)]
pub struct FsProofStore {
    root: PathBuf,
}

impl FsProofStore {
    /// Store proofs under `root`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or resolved.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, hash: &str) -> PathBuf {
        self.root.join(format!("{hash}.json"))
    }

    fn url_for(path: &Path) -> Result<String> {
        Url::from_file_path(path)
            .map(String::from)
            .map_err(|()| Error::ProofStore(format!("not an absolute path: {}", path.display())))
    }

    fn path_from_url(url: &str) -> Result<PathBuf> {
        let parsed = Url::parse(url)?;
        if parsed.scheme() != "file" {
            return Err(Error::ProofStore(format!("unsupported proof location {url}")));
        }
        parsed
            .to_file_path()
            .map_err(|()| Error::ProofStore(format!("invalid file url {url}")))
    }
}

#[async_trait]
impl ProofStore for FsProofStore {
    async fn put(&self, bytes: &[u8]) -> Result<String> {
        let hash = hash_bytes(bytes);
        let path = self.path_for(&hash);
        let url = Self::url_for(&path)?;

        if tokio::fs::try_exists(&path).await? {
            debug!(url = %url, "Proof already stored");
            return Ok(url);
        }

        let tmp = self.root.join(format!(".{hash}.{}.tmp", std::process::id()));
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| Error::ProofStore(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::ProofStore(format!("publish {}: {e}", path.display())))?;
        Ok(url)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let path = Self::path_from_url(url)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::ProofStore(format!("read {}: {e}", path.display())))
    }
}
