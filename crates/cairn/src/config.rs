//! Catalog configuration.
//!
//! The configuration lives in `.cairn/config.yaml` under the catalog root.
//! Every key is optional; a missing file means "all defaults".
//!
//! ```yaml
//! index-file: .cairn/index.json
//! directories:
//!   issues: work/issues
//! extension: md
//! cache-ttl-secs: 5
//! scan-batch-size: 32
//! id-prefixes:
//!   prs: PULL
//! ```

use crate::domain::{ItemId, ItemType};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Name of the cairn metadata directory
pub const CAIRN_DIR_NAME: &str = ".cairn";

/// Name of the configuration file inside the metadata directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default location of the index file, relative to the catalog root
pub const DEFAULT_INDEX_FILE: &str = ".cairn/index.json";

/// Default record file extension
pub const DEFAULT_EXTENSION: &str = "md";

/// Default cache time-to-live in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5;

/// Default number of record files read concurrently during a scan
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 32;

/// Per-type record directories, relative to the catalog root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directories {
    /// Directory for projects
    pub projects: String,
    /// Directory for epics
    pub epics: String,
    /// Directory for issues
    pub issues: String,
    /// Directory for tasks
    pub tasks: String,
    /// Directory for pull requests
    pub prs: String,
}

impl Directories {
    /// The directory for the given type.
    #[must_use]
    pub fn get(&self, item_type: ItemType) -> &str {
        match item_type {
            ItemType::Project => &self.projects,
            ItemType::Epic => &self.epics,
            ItemType::Issue => &self.issues,
            ItemType::Task => &self.tasks,
            ItemType::Pr => &self.prs,
        }
    }
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            projects: ItemType::Project.default_dir().to_string(),
            epics: ItemType::Epic.default_dir().to_string(),
            issues: ItemType::Issue.default_dir().to_string(),
            tasks: ItemType::Task.default_dir().to_string(),
            prs: ItemType::Pr.default_dir().to_string(),
        }
    }
}

/// Per-type ID prefixes (e.g., `ISS` for `ISS-12`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdPrefixes {
    /// Prefix for projects
    pub projects: String,
    /// Prefix for epics
    pub epics: String,
    /// Prefix for issues
    pub issues: String,
    /// Prefix for tasks
    pub tasks: String,
    /// Prefix for pull requests
    pub prs: String,
}

impl IdPrefixes {
    /// The prefix for the given type.
    #[must_use]
    pub fn get(&self, item_type: ItemType) -> &str {
        match item_type {
            ItemType::Project => &self.projects,
            ItemType::Epic => &self.epics,
            ItemType::Issue => &self.issues,
            ItemType::Task => &self.tasks,
            ItemType::Pr => &self.prs,
        }
    }
}

impl Default for IdPrefixes {
    fn default() -> Self {
        Self {
            projects: ItemType::Project.default_prefix().to_string(),
            epics: ItemType::Epic.default_prefix().to_string(),
            issues: ItemType::Issue.default_prefix().to_string(),
            tasks: ItemType::Task.default_prefix().to_string(),
            prs: ItemType::Pr.default_prefix().to_string(),
        }
    }
}

/// Configuration file structure for cairn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CatalogConfig {
    /// Index file location, relative to the catalog root
    pub index_file: PathBuf,

    /// Per-type record directories, relative to the catalog root
    pub directories: Directories,

    /// Record file extension, without the dot
    pub extension: String,

    /// How long a loaded index is trusted without touching disk
    pub cache_ttl_secs: u64,

    /// Maximum number of record files read concurrently
    pub scan_batch_size: usize,

    /// Per-type ID prefixes (e.g., `ISS` for `ISS-12`)
    pub id_prefixes: IdPrefixes,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
            directories: Directories::default(),
            extension: DEFAULT_EXTENSION.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
            id_prefixes: IdPrefixes::default(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.cairn/config.yaml` under `root`, or defaults if it does not exist
    pub async fn load_for_root(root: &Path) -> Result<Self> {
        let path = root.join(CAIRN_DIR_NAME).join(CONFIG_FILE_NAME);
        match fs::metadata(&path).await {
            Ok(_) => Self::load(&path).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check the values a catalog cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.scan_batch_size == 0 {
            return Err(Error::Config(
                "scan-batch-size must be at least 1".to_string(),
            ));
        }

        if self.extension.trim().is_empty() || self.extension.contains(['.', '/', '\\']) {
            return Err(Error::Config(format!(
                "extension '{}' must be a bare, non-empty file extension",
                self.extension
            )));
        }

        check_relative("index-file", &self.index_file)?;
        for item_type in ItemType::ALL {
            let dir = self.directories.get(item_type);
            if dir.trim().is_empty() {
                return Err(Error::Config(format!(
                    "directory for {item_type} must not be empty"
                )));
            }
            check_relative(item_type.default_dir(), Path::new(dir))?;
        }

        Ok(())
    }

    /// Cache time-to-live as a duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Absolute directory holding records of `item_type`.
    #[must_use]
    pub fn type_dir(&self, root: &Path, item_type: ItemType) -> PathBuf {
        root.join(self.directories.get(item_type))
    }

    /// Absolute path of the index file.
    #[must_use]
    pub fn index_path(&self, root: &Path) -> PathBuf {
        root.join(&self.index_file)
    }

    /// Conventional path of a record: `<typeDir>/<id>.<extension>`.
    #[must_use]
    pub fn record_path(&self, root: &Path, item_type: ItemType, id: &ItemId) -> PathBuf {
        self.type_dir(root, item_type)
            .join(format!("{}.{}", id.as_str(), self.extension))
    }

    /// Guess an item's type from its ID prefix (`ISS-4` → issue).
    ///
    /// The longest matching prefix wins, so `PRJ` and `PR` can coexist.
    #[must_use]
    pub fn type_for_id(&self, id: &ItemId) -> Option<ItemType> {
        ItemType::ALL
            .into_iter()
            .filter(|t| {
                let prefix = self.id_prefixes.get(*t);
                id.as_str()
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('-'))
            })
            .max_by_key(|t| self.id_prefixes.get(*t).len())
    }
}

fn check_relative(key: &str, path: &Path) -> Result<()> {
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::Config(format!(
            "{key} must be a relative path inside the catalog root, got '{}'",
            path.display()
        )));
    }
    Ok(())
}
