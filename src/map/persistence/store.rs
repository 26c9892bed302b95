//! The external store seam and the JSON file store used by the desktop app.
//!
//! [`GeometryStore`] is everything the editor needs from the system of record:
//! the features of one map, and a way to write back one feature's geometry.
//! [`JsonFileStore`] keeps one JSON document per map, laid out like the
//! relationship properties of a graph store (WKT geometry plus flat style keys).

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::map::GeometryData;

use super::wkt;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("map '{0}' does not exist")]
    MapNotFound(String),
    #[error("could not access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("map document {path:?} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode map document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("store is unavailable after an earlier failure")]
    Poisoned,
}

/// One map as delivered by the store. Feature records stay loosely typed so
/// that a single malformed record can be skipped without losing the map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredMap {
    pub map_id: String,
    /// Background image path; relative paths are resolved by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<PathBuf>,
    #[serde(default)]
    pub features: Vec<Value>,
}

/// A single feature record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFeature {
    pub target: String,
    /// WKT text
    pub geometry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_color: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_width: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_pattern: Option<Value>,
}

impl StoredFeature {
    /// Overwrite the geometry fields, keeping style untouched.
    pub fn set_geometry(&mut self, geometry: &GeometryData) {
        self.geometry = wkt::encode(geometry);
        self.geometry_type = Some(geometry.type_name().to_string());
        self.branch_count = match geometry {
            GeometryData::MultiLineString(branches) => Some(branches.len()),
            _ => None,
        };
    }

    pub fn new(target: &str, geometry: &GeometryData) -> Self {
        let mut feature = Self {
            target: target.to_string(),
            geometry: String::new(),
            geometry_type: None,
            branch_count: None,
            style_color: None,
            style_width: None,
            style_pattern: None,
        };
        feature.set_geometry(geometry);
        feature
    }

    /// Whether the record holds a pin (as opposed to a line).
    pub fn is_point(&self) -> bool {
        match self.geometry_type.as_deref() {
            Some(kind) => kind.eq_ignore_ascii_case("point"),
            None => self.geometry.trim_start().to_ascii_uppercase().starts_with("POINT"),
        }
    }
}

pub trait GeometryStore: Send + Sync {
    /// All feature records of a map.
    fn load_features(&self, map_id: &str) -> Result<StoredMap, StoreError>;

    /// Persist the geometry of one feature. Points are pins, anything else is a line.
    fn save_geometry(
        &self,
        map_id: &str,
        target_id: &str,
        geometry: &GeometryData,
    ) -> Result<(), StoreError>;

    /// Turn a path from a stored map into something the asset server can open.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }

    /// Ids of the maps this store can open, for the open-map dialog.
    fn list_maps(&self) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }
}

/// One JSON document per map under a root directory.
pub struct JsonFileStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles from concurrent save tasks
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn map_path(&self, map_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_filename(map_id)))
    }

    fn read(&self, map_id: &str) -> Result<Option<StoredMap>, StoreError> {
        let path = self.map_path(map_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StoreError::Parse { path, source })
    }

    fn write(&self, map: &StoredMap) -> Result<(), StoreError> {
        let path = self.map_path(&map.map_id);
        std::fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(map)?;
        // Write to a sibling file first so a crash never leaves half a document
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }
}

impl GeometryStore for JsonFileStore {
    fn load_features(&self, map_id: &str) -> Result<StoredMap, StoreError> {
        self.read(map_id)?
            .ok_or_else(|| StoreError::MapNotFound(map_id.to_string()))
    }

    fn save_geometry(
        &self,
        map_id: &str,
        target_id: &str,
        geometry: &GeometryData,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut map = self.read(map_id)?.unwrap_or_else(|| StoredMap {
            map_id: map_id.to_string(),
            ..default()
        });
        let wants_point = matches!(geometry, GeometryData::Point(_));

        let existing = map.features.iter_mut().find(|value| {
            serde_json::from_value::<StoredFeature>((*value).clone())
                .is_ok_and(|f| f.target == target_id && f.is_point() == wants_point)
        });

        match existing {
            Some(value) => {
                let mut feature: StoredFeature = serde_json::from_value(value.clone())?;
                feature.set_geometry(geometry);
                *value = serde_json::to_value(feature)?;
            }
            None => {
                let feature = StoredFeature::new(target_id, geometry);
                map.features.push(serde_json::to_value(feature)?);
            }
        }

        self.write(&map)?;
        debug!(
            "Stored {} for '{}' in map '{}'",
            geometry.type_name(),
            target_id,
            map_id
        );
        Ok(())
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn list_maps(&self) -> Result<Vec<String>, StoreError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };
        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Map ids become file names; keep them to a safe character set.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}
