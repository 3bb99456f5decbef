//! JSON-file cache of edited editions.
//!
//! Editors tweak an assembled edition (pick a top image, add adverts, write
//! a foreword) and save it. The next assembly of the same kind re-scrapes
//! everything else and carries those edits over with [`merge_with_cache`].
//!
//! # Layout
//!
//! ```text
//! cache_dir/
//! ├── be.json
//! ├── ge.json
//! ├── jep.json
//! └── aimpremium.json
//! ```

use std::io::ErrorKind;
use std::path::PathBuf;

use serde_json::Value;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::error::{Result, ScrapeError};

/// Fields editors own, per edition kind. Cached values always win for these.
pub const USER_EDITABLE_FIELDS: &[(&str, &[&str])] = &[
    ("be", &["top_image", "horizontal_adverts", "vertical_adverts", "connect_image_url"]),
    ("ge", &["top_image", "horizontal_adverts", "vertical_adverts", "connect_image_url"]),
    ("jep", &["jep_cover_url", "publication_cover_url", "adverts"]),
    ("aimpremium", &["title", "foreword"]),
];

/// Editable fields of `kind`; empty for unknown kinds.
pub fn user_editable_fields(kind: &str) -> &'static [&'static str] {
    USER_EDITABLE_FIELDS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

#[derive(Debug, Clone)]
pub struct EditionCache {
    dir: PathBuf,
}

impl EditionCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{cache_dir}/{kind}.json`.
    pub fn path_for(&self, kind: &str) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }

    /// Writes `record` as pretty JSON, creating the cache directory if needed.
    #[instrument(level = "info", skip(self, record))]
    pub async fn save(&self, kind: &str, record: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(|source| ScrapeError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(kind);
        let json = serde_json::to_string_pretty(record).map_err(|e| ScrapeError::Decode {
            url: path.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json)
            .await
            .map_err(|source| ScrapeError::Io { path: path.clone(), source })?;

        info!(path = %path.display(), "Saved edition to cache");
        Ok(())
    }

    /// The cached record for `kind`, or `None` when nothing usable is cached.
    ///
    /// A corrupt cache file is logged and treated as absent.
    #[instrument(level = "info", skip(self))]
    pub async fn load(&self, kind: &str) -> Result<Option<Value>> {
        let path = self.path_for(kind);
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ScrapeError::Io { path, source }),
        };

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache file");
                Ok(None)
            }
        }
    }

    /// Removes the cached record for `kind`, if any.
    #[instrument(level = "info", skip(self))]
    pub async fn clear(&self, kind: &str) -> Result<()> {
        let path = self.path_for(kind);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Cleared cached edition");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ScrapeError::Io { path, source }),
        }
    }
}

/// Carries editor-owned fields and gaps over from a cached record.
///
/// For every field editors own, the cached value replaces the fresh one.
/// Any other field that came back empty from the scrape (null, `""`, `[]`
/// or `{}`) is filled from the cache when the cache has a non-empty value.
pub fn merge_with_cache(kind: &str, fresh: Value, cached: Option<&Value>) -> Value {
    let (Value::Object(mut merged), Some(Value::Object(cached))) = (fresh.clone(), cached) else {
        return fresh;
    };

    for field in user_editable_fields(kind) {
        if let Some(value) = cached.get(*field) {
            merged.insert((*field).to_string(), value.clone());
        }
    }

    for (key, value) in merged.iter_mut() {
        if is_empty(value) {
            if let Some(cached_value) = cached.get(key).filter(|v| !is_empty(v)) {
                *value = cached_value.clone();
            }
        }
    }

    Value::Object(merged)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
