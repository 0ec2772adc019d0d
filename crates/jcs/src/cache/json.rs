//! JSON file cache backend.
//!
//! One file per ticket under `<root>/tickets/`, written via a temporary
//! file and a rename so a crash mid-write never leaves a torn record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{CacheEntry, CacheInfo, TicketStore};
use crate::errors::CacheError;

const TICKETS_DIR: &str = "tickets";

/// File-backed ticket cache.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    root: PathBuf,
}

impl JsonFileCache {
    /// Create a cache rooted at the given directory.
    ///
    /// Nothing is created on disk until the first write.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Platform default cache location (`<user cache dir>/jcs`).
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("jcs")
    }

    /// Directory this cache stores records under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tickets_dir(&self) -> PathBuf {
        self.root.join(TICKETS_DIR)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // The key becomes the file name; keep path separators out of it.
        let safe: String = key.replace(['/', '\\'], "_");
        self.tickets_dir().join(format!("{}.json", safe))
    }

    fn io_error(path: &Path, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl TicketStore for JsonFileCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&path, e)),
        };
        let entry = serde_json::from_str(&content).map_err(|e| CacheError::Corrupt {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        Ok(Some(entry))
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let dir = self.tickets_dir();
        fs::create_dir_all(&dir).map_err(|e| Self::io_error(&dir, e))?;

        let path = self.entry_path(&entry.key);
        let json =
            serde_json::to_string_pretty(entry).map_err(|e| Self::io_error(&path, e.into()))?;

        // Write to a temporary file first, then rename for atomic replacement
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(|e| Self::io_error(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| Self::io_error(&path, e))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let dir = self.tickets_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(&dir, e)),
        }
    }

    fn info(&self) -> Result<CacheInfo, CacheError> {
        let dir = self.tickets_dir();
        let location = self.root.display().to_string();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Never written to; an empty cache, not a broken one
                return Ok(CacheInfo {
                    entry_count: 0,
                    total_size_bytes: 0,
                    location,
                });
            }
            Err(e) => return Err(Self::io_error(&dir, e)),
        };

        let mut entry_count = 0;
        let mut total_size_bytes = 0;
        for dir_entry in entries {
            let dir_entry = dir_entry.map_err(|e| Self::io_error(&dir, e))?;
            let path = dir_entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let metadata = dir_entry.metadata().map_err(|e| Self::io_error(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            entry_count += 1;
            total_size_bytes += metadata.len();
        }

        Ok(CacheInfo {
            entry_count,
            total_size_bytes,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ticket;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_entry(key: &str) -> CacheEntry {
        let mut ticket = Ticket::new(key, "Stored ticket", "Feature");
        ticket.updated = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        ticket.assignee = Some("Alice Adams".to_string());
        CacheEntry::new(ticket, Utc.with_ymd_and_hms(2024, 6, 2, 11, 0, 0).unwrap())
    }

    #[test]
    fn test_put_then_get_round_trips_the_record() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());

        let entry = sample_entry("PROJ-1");
        cache.put(&entry).unwrap();

        let loaded = cache.get("PROJ-1").unwrap().unwrap();
        assert_eq!(loaded, entry);
    }

    #[test]
    fn test_get_missing_record_is_none_not_error() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());
        assert!(cache.get("PROJ-404").unwrap().is_none());
    }

    #[test]
    fn test_records_survive_a_new_cache_instance() {
        let temp = TempDir::new().unwrap();
        JsonFileCache::new(temp.path())
            .put(&sample_entry("PROJ-9"))
            .unwrap();

        let reopened = JsonFileCache::new(temp.path());
        let loaded = reopened.get("PROJ-9").unwrap().unwrap();
        assert_eq!(loaded.ticket.summary, "Stored ticket");
    }

    #[test]
    fn test_put_replaces_the_whole_record() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());
        cache.put(&sample_entry("PROJ-1")).unwrap();

        let mut newer = sample_entry("PROJ-1");
        newer.ticket.summary = "Rewritten".to_string();
        newer.ticket.updated = newer.ticket.updated + chrono::Duration::days(1);
        newer.source_updated = newer.ticket.updated;
        cache.put(&newer).unwrap();

        let loaded = cache.get("PROJ-1").unwrap().unwrap();
        assert_eq!(loaded.ticket.summary, "Rewritten");
        assert_eq!(loaded.source_updated, newer.source_updated);
    }

    #[test]
    fn test_put_leaves_no_temporary_file_behind() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());
        cache.put(&sample_entry("PROJ-1")).unwrap();

        let tickets = temp.path().join("tickets");
        let names: Vec<String> = fs::read_dir(&tickets)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["PROJ-1.json"]);
    }

    #[test]
    fn test_corrupt_record_is_an_error_not_a_miss() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());
        cache.put(&sample_entry("PROJ-1")).unwrap();

        let path = temp.path().join("tickets").join("PROJ-1.json");
        fs::write(&path, "{ not json").unwrap();

        let err = cache.get("PROJ-1").unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));
    }

    #[test]
    fn test_is_stale_against_files_on_disk() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());
        let entry = sample_entry("PROJ-1");
        cache.put(&entry).unwrap();

        let same = entry.source_updated;
        let newer = same + chrono::Duration::minutes(5);
        assert!(!cache.is_stale("PROJ-1", same).unwrap());
        assert!(cache.is_stale("PROJ-1", newer).unwrap());
        assert!(cache.is_stale("PROJ-2", same).unwrap());
    }

    #[test]
    fn test_clear_removes_all_records() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());
        cache.put(&sample_entry("PROJ-1")).unwrap();
        cache.put(&sample_entry("PROJ-2")).unwrap();

        cache.clear().unwrap();
        assert!(cache.get("PROJ-1").unwrap().is_none());
        assert_eq!(cache.info().unwrap().entry_count, 0);
    }

    #[test]
    fn test_clear_on_empty_cache_is_fine() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());
        cache.clear().unwrap();
    }

    #[test]
    fn test_info_counts_records_and_bytes() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());
        assert_eq!(cache.info().unwrap().entry_count, 0);

        cache.put(&sample_entry("PROJ-1")).unwrap();
        cache.put(&sample_entry("PROJ-2")).unwrap();

        let info = cache.info().unwrap();
        assert_eq!(info.entry_count, 2);
        assert!(info.total_size_bytes > 0);
        assert_eq!(info.location, temp.path().display().to_string());
    }

    #[test]
    fn test_keys_with_separators_cannot_escape_the_cache_dir() {
        let temp = TempDir::new().unwrap();
        let cache = JsonFileCache::new(temp.path());

        let mut ticket = Ticket::new("../escape", "odd key", "Bug");
        ticket.updated = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        cache.put(&CacheEntry::new(ticket, Utc::now())).unwrap();

        assert!(temp.path().join("tickets").join(".._escape.json").exists());
        assert!(cache.get("../escape").unwrap().is_some());
    }
}
