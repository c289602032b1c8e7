//! Catalog of selectable entries, loaded from `pkmn.yaml`.
//!
//! The file maps each entry name to a list of tags (generation ids):
//!
//! ```yaml
//! bulbasaur:
//! - '1'
//! pikachu:
//! - '1'
//! ```
//!
//! The catalog is read once at startup and only replaced wholesale by
//! [`refresh_catalog`].

mod refresh;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::remote::RemoteError;

pub use refresh::{fetch_catalog, refresh_catalog};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to serialize catalog {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("catalog is not a mapping of names to tags")]
    Shape,
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("remote listing returned no entries")]
    EmptyListing,
}

impl CatalogError {
    /// The catalog file simply isn't there yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<String>)>,
        N: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }

    /// Parse catalog YAML. An empty document is an empty catalog; scalar
    /// keys and tags are taken as strings.
    pub fn parse(yaml: &str) -> Result<Self, CatalogError> {
        let mapping = match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Null) => return Ok(Self::new()),
            Ok(Value::Mapping(mapping)) => mapping,
            Ok(_) => return Err(CatalogError::Shape),
            Err(source) => {
                return Err(CatalogError::Parse {
                    path: PathBuf::new(),
                    source,
                });
            }
        };

        let mut entries = BTreeMap::new();
        for (key, value) in mapping {
            let name = scalar_string(&key).ok_or(CatalogError::Shape)?;
            let tags = match value {
                Value::Null => Vec::new(),
                Value::Sequence(items) => items
                    .iter()
                    .map(|item| scalar_string(item).ok_or(CatalogError::Shape))
                    .collect::<Result<Vec<_>, _>>()?,
                other => vec![scalar_string(&other).ok_or(CatalogError::Shape)?],
            };
            entries.insert(name, tags);
        }

        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let yaml = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::parse(&yaml).map_err(|e| match e {
            CatalogError::Parse { source, .. } => CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        tracing::debug!(path = ?path, entries = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let yaml = serde_yaml::to_string(&self.entries).map_err(|source| CatalogError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

        let io_err = |source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, yaml).map_err(io_err)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<CatalogEntry> {
        self.entries.get_key_value(name).map(|(name, tags)| CatalogEntry {
            name: name.clone(),
            tags: tags.clone(),
        })
    }

    pub fn tags(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names starting with `prefix`, ignoring case.
    pub fn search(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.trim().to_lowercase();
        self.names()
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .collect()
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "bulbasaur:\n- '1'\npikachu:\n- '1'\nsprigatito:\n- 9\nmissingno:\n";

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::parse(YAML).unwrap();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.contains("pikachu"));
        assert!(!catalog.contains("Pikachu"));
        assert_eq!(catalog.tags("sprigatito"), Some(&["9".to_string()][..]));
        assert_eq!(catalog.tags("missingno"), Some(&[][..]));
        assert_eq!(
            catalog.get("bulbasaur"),
            Some(CatalogEntry {
                name: "bulbasaur".to_string(),
                tags: vec!["1".to_string()],
            })
        );
    }

    #[test]
    fn test_empty_and_bad_documents() {
        assert!(Catalog::parse("").unwrap().is_empty());
        assert!(matches!(Catalog::parse("- a\n- b\n"), Err(CatalogError::Shape)));
        assert!(matches!(
            Catalog::parse("pikachu: [1\n"),
            Err(CatalogError::Parse { .. })
        ));
    }

    #[test]
    fn test_search_is_case_insensitive_prefix() {
        let catalog = Catalog::parse("Pidgey: ['1']\npikachu: ['1']\npichu: ['2']\neevee: ['1']\n").unwrap();
        assert_eq!(catalog.search("PI"), vec!["Pidgey", "pichu", "pikachu"]);
        assert_eq!(catalog.search("pik"), vec!["pikachu"]);
        assert!(catalog.search("zz").is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("pkmn.yaml")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("pkmn.yaml");
        let catalog = Catalog::from_entries([
            ("pikachu", vec!["1".to_string()]),
            ("sprigatito", vec!["9".to_string()]),
        ]);

        catalog.save(&path).unwrap();
        assert_eq!(Catalog::load(&path).unwrap(), catalog);
    }
}
