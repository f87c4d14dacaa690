//! Artefact workspace
//!
//! Layout per case:
//!
//! ```text
//! <root>/<suite>-<digest>/<testname>/genesis.json
//! <root>/<suite>-<digest>/<testname>/blocks/0001.rlp
//! <root>/<suite>-<digest>/<testname>/blocks/0002.rlp
//! ```
//!
//! `<suite>` is the suite file stem and `<digest>` a hash of the full suite
//! path, so equally named cases from different suites never share a
//! directory. The control plane receives these paths as `HIVE_INIT_GENESIS`
//! and `HIVE_INIT_BLOCKS`.

use crate::error::{ArtifactError, ArtifactResult};
use probe_model::TestCase;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// Default workspace root
pub const DEFAULT_ARTEFACTS_DIR: &str = "./artefacts";

/// Paths written for one case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtefactPaths {
    /// Genesis file
    pub genesis: PathBuf,
    /// Block directory; `None` for cases that import no blocks
    pub blocks: Option<PathBuf>,
}

/// Writes case data to disk before a node is started
#[derive(Debug, Clone)]
pub struct ArtefactStore {
    root: PathBuf,
}

impl Default for ArtefactStore {
    fn default() -> Self {
        Self::new(DEFAULT_ARTEFACTS_DIR)
    }
}

impl ArtefactStore {
    /// Store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one case
    pub fn case_dir(&self, case: &TestCase) -> PathBuf {
        self.root.join(suite_dir(case.suite())).join(path_component(case.name()))
    }

    /// Replace the case directory with fresh genesis and block files
    pub async fn write(&self, case: &TestCase) -> ArtifactResult<ArtefactPaths> {
        let genesis = case.genesis_spec().ok_or(ArtifactError::MissingGenesis)?;
        let dir = self.case_dir(case);

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(ArtifactError::Io { path: dir, source }),
        }
        create_dir(&dir).await?;

        let genesis_path = dir.join("genesis.json");
        let encoded = serde_json::to_vec_pretty(genesis)?;
        write_file(&genesis_path, &encoded).await?;

        let blocks = case.blocks();
        let blocks_dir = if case.block_test().is_some() {
            let blocks_dir = dir.join("blocks");
            create_dir(&blocks_dir).await?;
            for (i, block) in blocks.iter().enumerate() {
                let index = i + 1;
                let bytes = block
                    .decode_rlp()
                    .map_err(|source| ArtifactError::Block { index, source })?;
                write_file(&blocks_dir.join(format!("{:04}.rlp", index)), &bytes).await?;
            }
            Some(blocks_dir)
        } else {
            None
        };

        tracing::debug!(case = %case.full_name(), dir = %dir.display(), blocks = blocks.len(), "Artefacts written");
        Ok(ArtefactPaths {
            genesis: genesis_path,
            blocks: blocks_dir,
        })
    }
}

fn suite_dir(suite: &str) -> String {
    let stem = Path::new(suite)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    suite.hash(&mut hasher);
    format!("{}-{:08x}", path_component(&stem), hasher.finish() as u32)
}

/// Single path segment: separators replaced, `.`/`..` and empty names escaped
fn path_component(name: &str) -> String {
    let component: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') || c.is_control() { '_' } else { c })
        .collect();
    match component.as_str() {
        "" | "." | ".." => format!("_{}", component),
        _ => component,
    }
}

async fn create_dir(path: &Path) -> ArtifactResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_file(path: &Path, contents: &[u8]) -> ArtifactResult<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })
}
