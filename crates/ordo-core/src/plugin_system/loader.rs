use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;

use crate::config::ConfigFormat;
use crate::kernel::constants::MANIFEST_FILE_STEM;
use crate::kernel::error::{Error as KernelError, Result as KernelResult};
use crate::plugin_system::adapter::ManifestPlugin;
use crate::plugin_system::manifest::PluginManifest;
use crate::plugin_system::traits::Plugin;

/// Anything that can produce load candidates, in discovery order
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self) -> KernelResult<Vec<Arc<dyn Plugin>>>;
}

/// Discovers manifest-backed plugins on disk.
///
/// Each configured directory is scanned one level deep: every
/// sub-directory holding a `plugin.toml`, `plugin.json`, `plugin.yaml` or
/// `plugin.yml` is one plugin. Sub-directories are visited in name order so
/// discovery order is stable. A manifest that fails to parse aborts the
/// whole scan.
#[derive(Debug, Default, Clone)]
pub struct PluginLoader {
    plugin_dirs: Vec<PathBuf>,
}

impl PluginLoader {
    /// Create a new plugin loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin directory to search
    pub fn add_plugin_dir<P: AsRef<Path>>(&mut self, dir: P) {
        self.plugin_dirs.push(dir.as_ref().to_path_buf());
    }

    pub fn with_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut loader = Self::new();
        for dir in dirs {
            loader.add_plugin_dir(dir);
        }
        loader
    }

    pub fn plugin_dirs(&self) -> &[PathBuf] {
        &self.plugin_dirs
    }

    /// Scan every configured directory for plugin manifests
    pub async fn scan_for_manifests(&self) -> KernelResult<Vec<PluginManifest>> {
        let mut manifests = Vec::new();

        for dir in &self.plugin_dirs {
            let is_dir = match fs::metadata(dir).await {
                Ok(meta) => meta.is_dir(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
                Err(e) => return Err(KernelError::io(e, "metadata", dir.clone())),
            };
            if !is_dir {
                log::debug!("Plugin directory {} does not exist, skipping", dir.display());
                continue;
            }
            self.scan_directory(dir, &mut manifests).await?;
        }

        log::debug!("Discovered {} plugin manifests", manifests.len());
        Ok(manifests)
    }

    async fn scan_directory(&self, dir: &Path, manifests: &mut Vec<PluginManifest>) -> KernelResult<()> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| KernelError::io(e, "read_dir", dir.to_path_buf()))?;

        let mut plugin_dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| KernelError::io(e, "read_dir", dir.to_path_buf()))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| KernelError::io(e, "file_type", entry.path()))?;
            if file_type.is_dir() {
                plugin_dirs.push(entry.path());
            }
        }
        plugin_dirs.sort();

        for plugin_dir in plugin_dirs {
            match find_manifest(&plugin_dir).await? {
                Some(path) => manifests.push(load_manifest(&path).await?),
                None => log::debug!("No plugin manifest in {}", plugin_dir.display()),
            }
        }
        Ok(())
    }
}

/// First `plugin.<ext>` file present in `dir`, trying known extensions in order
async fn find_manifest(dir: &Path) -> KernelResult<Option<PathBuf>> {
    for ext in ConfigFormat::known_extensions() {
        let candidate = dir.join(format!("{}.{}", MANIFEST_FILE_STEM, ext));
        let exists = fs::try_exists(&candidate)
            .await
            .map_err(|e| KernelError::io(e, "try_exists", candidate.clone()))?;
        if exists {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Read and parse a single manifest file
pub async fn load_manifest(path: &Path) -> KernelResult<PluginManifest> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| {
        KernelError::config(path, "unsupported manifest extension")
    })?;
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| KernelError::io(e, "read_manifest", path.to_path_buf()))?;
    Ok(PluginManifest::parse(&content, format, path)?)
}

#[async_trait]
impl CandidateSource for PluginLoader {
    async fn candidates(&self) -> KernelResult<Vec<Arc<dyn Plugin>>> {
        let manifests = self.scan_for_manifests().await?;
        Ok(manifests
            .into_iter()
            .map(|manifest| Arc::new(ManifestPlugin::new(manifest)) as Arc<dyn Plugin>)
            .collect())
    }
}
