// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Persistent cache tier
//!
//! Successful results are written as `<fingerprint>.bin` with a JSON sidecar
//! `<fingerprint>.json` holding the checksum and render metadata. The
//! sidecar's modification time is the entry's last use.

use super::entry::checksum;
use crate::engine::EngineKind;
use crate::request::{Fingerprint, RenderResult};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Sidecar metadata for one stored result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskMeta {
    pub fingerprint: String,
    pub engine: EngineKind,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
    pub checksum: String,
    pub len: u64,
}

/// Directory-backed store for rendered geometry
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn data_path(&self, fp: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.bin", fp))
    }

    fn meta_path(&self, fp: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", fp))
    }

    /// Store a successful result. Any other variant replaces what was stored
    /// with nothing, so an older success cannot outlive a newer failure.
    pub fn save(&self, fp: &Fingerprint, result: &RenderResult) -> Result<()> {
        let RenderResult::Success {
            bytes,
            engine,
            duration,
        } = result
        else {
            self.remove(fp);
            return Ok(());
        };

        let meta = DiskMeta {
            fingerprint: fp.to_string(),
            engine: *engine,
            duration_ms: duration.as_millis() as u64,
            created_at: Utc::now(),
            checksum: checksum(bytes),
            len: bytes.len() as u64,
        };

        // Data first, sidecar last: a sidecar only exists for complete data
        let data_tmp = self.dir.join(format!("{}.bin.tmp", fp));
        fs::write(&data_tmp, bytes).context("Failed to write cached geometry")?;
        fs::rename(&data_tmp, self.data_path(fp)).context("Failed to move cached geometry")?;

        let meta_tmp = self.dir.join(format!("{}.json.tmp", fp));
        fs::write(&meta_tmp, serde_json::to_vec_pretty(&meta)?)
            .context("Failed to write cache metadata")?;
        fs::rename(&meta_tmp, self.meta_path(fp)).context("Failed to move cache metadata")?;
        Ok(())
    }

    /// Load a stored result. `Ok(None)` when nothing is stored; an error when
    /// something is stored but cannot be read back intact.
    pub fn load(&self, fp: &Fingerprint) -> Result<Option<RenderResult>> {
        let meta_raw = match fs::read(self.meta_path(fp)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read cache metadata"),
        };
        let meta: DiskMeta =
            serde_json::from_slice(&meta_raw).context("Failed to parse cache metadata")?;
        if meta.fingerprint != fp.as_str() {
            bail!("Cache metadata belongs to {}", meta.fingerprint);
        }

        let bytes = fs::read(self.data_path(fp)).context("Failed to read cached geometry")?;
        if bytes.len() as u64 != meta.len || checksum(&bytes) != meta.checksum {
            bail!("Cached geometry does not match its checksum");
        }

        self.touch(fp);
        Ok(Some(RenderResult::success(
            bytes,
            meta.engine,
            Duration::from_millis(meta.duration_ms),
        )))
    }

    fn touch(&self, fp: &Fingerprint) {
        let touched = File::options()
            .append(true)
            .open(self.meta_path(fp))
            .and_then(|file| file.set_modified(SystemTime::now()));
        if let Err(e) = touched {
            tracing::debug!(fingerprint = fp.short(), error = %e, "failed to refresh cache entry time");
        }
    }

    /// Every stored fingerprint with its last use
    pub fn entries(&self) -> Result<Vec<(Fingerprint, SystemTime)>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map(|ext| ext != "json").unwrap_or(true) {
                continue;
            }
            let Some(fp) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| Fingerprint::parse(stem).ok())
            else {
                continue;
            };
            let used = match fs::metadata(&path).and_then(|meta| meta.modified()) {
                Ok(time) => time,
                // Removed concurrently
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e).with_context(|| format!("Failed to stat {:?}", path)),
            };
            entries.push((fp, used));
        }
        Ok(entries)
    }

    pub fn remove(&self, fp: &Fingerprint) {
        for path in [self.meta_path(fp), self.data_path(fp)] {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove cache file");
                }
            }
        }
    }

    /// Remove every stored result
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_cache_file = path
                .extension()
                .map(|ext| ext == "bin" || ext == "json" || ext == "tmp")
                .unwrap_or(false);
            if is_cache_file {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {:?}", path))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RenderRequest;
    use tempfile::TempDir;

    fn stored() -> (TempDir, DiskStore, Fingerprint) {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let fp = RenderRequest::new("cube(2);").fingerprint();
        let result = RenderResult::success(
            b"solid cube".to_vec(),
            EngineKind::Local,
            Duration::from_millis(42),
        );
        store.save(&fp, &result).unwrap();
        (dir, store, fp)
    }

    #[test]
    fn test_load_after_save() {
        let (_dir, store, fp) = stored();
        let loaded = store.load(&fp).unwrap().unwrap();
        assert_eq!(loaded.bytes(), Some(&b"solid cube"[..]));
    }

    #[test]
    fn test_missing_is_none() {
        let (_dir, store, _) = stored();
        let other = RenderRequest::new("sphere(2);").fingerprint();
        assert!(store.load(&other).unwrap().is_none());
    }

    #[test]
    fn test_tampered_data_is_error() {
        let (_dir, store, fp) = stored();
        fs::write(store.data_path(&fp), b"solid cubX").unwrap();
        assert!(store.load(&fp).is_err());
        store.remove(&fp);
        assert!(store.load(&fp).unwrap().is_none());
    }

    #[test]
    fn test_failure_replaces_stored_success() {
        let (_dir, store, fp) = stored();
        let failure = RenderResult::Failure(crate::error::RenderError::AllEnginesUnavailable {
            attempts: vec![],
        });
        store.save(&fp, &failure).unwrap();
        assert!(store.load(&fp).unwrap().is_none());
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn test_entries_lists_sidecars() {
        let (dir, store, fp) = stored();
        fs::write(dir.path().join("notes.json"), b"{}").unwrap();
        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, fp);
    }

    #[test]
    fn test_pending_not_persisted() {
        let (_dir, store, _) = stored();
        let fp = RenderRequest::new("cylinder(1);").fingerprint();
        let pending = RenderResult::Pending(crate::request::CorrelationToken::for_fingerprint(&fp));
        store.save(&fp, &pending).unwrap();
        assert!(store.load(&fp).unwrap().is_none());
        assert_eq!(store.clear().unwrap(), 2);
    }
}
