//! Durable local store: one JSON file per archive plus two small index
//! files, all written atomically (temp file beside the target, then
//! rename). Failures here are logged and absorbed; the cache is an
//! optimization, never a correctness dependency.

use crate::model::Game;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

const ETAGS_FILE: &str = "etags.json";
const USER_ARCHIVES_FILE: &str = "userarchives.json";

/// Owning store for everything the mirror persists: per-archive game
/// files, the archive-id → validator map and the user → archive-id index.
/// Loaded archives are memoized in-process.
pub struct ArchiveCache {
    /// `None` means caching is disabled for the rest of the process.
    dir: Option<PathBuf>,
    archives: HashMap<String, Vec<Game>>,
    etags: Option<HashMap<String, String>>,
    user_archives: Option<HashMap<String, Vec<String>>>,
}

impl ArchiveCache {
    /// Resolve the platform cache directory once. If it cannot be created,
    /// caching is disabled and every call degrades to a miss / no-op.
    pub fn open() -> Self {
        Self::with_dir(resolve_base_dir())
    }

    /// Use an explicit directory instead of the platform default.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self::with_dir(dir.into())
    }

    fn with_dir(dir: PathBuf) -> Self {
        let dir = match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                tracing::info!("cache enabled at {}", dir.display());
                Some(dir)
            }
            Err(err) => {
                tracing::error!(
                    "could not create cache directory {}: {}; caching disabled",
                    dir.display(),
                    err
                );
                None
            }
        };
        Self {
            dir,
            archives: HashMap::new(),
            etags: None,
            user_archives: None,
        }
    }

    /// Load an archive's games: memo first, then disk. A file that decodes
    /// to zero games is still a hit (it may be a quiet month, or a masked
    /// write failure; we log and accept it).
    pub fn load_archive(&mut self, id: &str) -> Option<Vec<Game>> {
        if let Some(games) = self.archives.get(id) {
            return Some(games.clone());
        }

        let dir = self.dir.as_ref()?;
        let path = dir.join(archive_file_name(id));
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!("could not open archive file {}: {}", path.display(), err);
                return None;
            }
        };
        let games: Vec<Game> = match serde_json::from_str(&contents) {
            Ok(games) => games,
            Err(err) => {
                tracing::warn!("could not read archive file {}: {}", path.display(), err);
                return None;
            }
        };

        if games.is_empty() {
            tracing::warn!("archive file {} decoded to zero games", path.display());
        } else {
            tracing::info!("loaded {} cached games for {}", games.len(), id);
        }

        self.archives.insert(id.to_string(), games.clone());
        Some(games)
    }

    pub fn save_archive(&mut self, id: &str, games: &[Game]) {
        let Some(dir) = self.dir.clone() else { return };
        match write_json_atomic(&dir, &archive_file_name(id), &games) {
            Ok(path) => {
                tracing::info!("saved {} games for {} to {}", games.len(), id, path.display());
            }
            Err(err) => tracing::warn!("could not write archive {}: {}", id, err),
        }
    }

    pub fn load_etag(&mut self, id: &str) -> Option<String> {
        self.etags().get(id).cloned()
    }

    pub fn save_etag(&mut self, id: &str, etag: &str) {
        self.etags().insert(id.to_string(), etag.to_string());
        let Some(dir) = self.dir.clone() else { return };
        if let Some(map) = &self.etags {
            match write_json_atomic(&dir, ETAGS_FILE, map) {
                Ok(_) => tracing::info!("saved {} etags", map.len()),
                Err(err) => tracing::warn!("could not write etags: {}", err),
            }
        }
    }

    /// The cached archive listing for a user; empty when nothing is known.
    pub fn load_user_archives(&mut self, user: &str) -> Vec<String> {
        self.user_index().get(user).cloned().unwrap_or_default()
    }

    pub fn save_user_archives(&mut self, user: &str, archives: Vec<String>) {
        self.user_index().insert(user.to_string(), archives);
        let Some(dir) = self.dir.clone() else { return };
        if let Some(map) = &self.user_archives {
            match write_json_atomic(&dir, USER_ARCHIVES_FILE, map) {
                Ok(_) => tracing::info!("saved archive index for {} users", map.len()),
                Err(err) => tracing::warn!("could not write user archive index: {}", err),
            }
        }
    }

    fn etags(&mut self) -> &mut HashMap<String, String> {
        if self.etags.is_none() {
            self.etags = Some(load_map(self.dir.as_deref(), ETAGS_FILE, "etags"));
        }
        self.etags.get_or_insert_with(HashMap::new)
    }

    fn user_index(&mut self) -> &mut HashMap<String, Vec<String>> {
        if self.user_archives.is_none() {
            self.user_archives = Some(load_map(
                self.dir.as_deref(),
                USER_ARCHIVES_FILE,
                "user archives",
            ));
        }
        self.user_archives.get_or_insert_with(HashMap::new)
    }
}

/// `CHESSMIRROR_CACHE_DIR` overrides the platform cache directory; if the
/// platform provides none, fall back to the system temp dir.
fn resolve_base_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESSMIRROR_CACHE_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(dirs) = ProjectDirs::from("sh", "echo", "chessmirror") {
        return dirs.cache_dir().to_path_buf();
    }

    tracing::warn!("platform provided no cache directory, using the temp dir");
    std::env::temp_dir().join("chessmirror")
}

fn archive_file_name(id: &str) -> String {
    format!("{}.json", id.trim_matches('/').replace('/', "_"))
}

fn load_map<V>(dir: Option<&Path>, file_name: &str, what: &str) -> HashMap<String, V>
where
    V: serde::de::DeserializeOwned,
{
    let Some(dir) = dir else {
        return HashMap::new();
    };
    let path = dir.join(file_name);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!("could not open cached {} at {}: {}", what, path.display(), err);
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HashMap<String, V>>(&contents) {
        Ok(map) => {
            if map.is_empty() {
                tracing::warn!("loaded {} file but it was empty: {}", what, path.display());
            } else {
                tracing::info!("loaded {} cached {}", map.len(), what);
            }
            map
        }
        Err(err) => {
            tracing::warn!("could not read cached {} at {}: {}", what, path.display(), err);
            HashMap::new()
        }
    }
}

/// Write JSON to a temp file beside the target, then atomically rename it
/// into place. Readers never observe a partial file.
fn write_json_atomic<T: serde::Serialize>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> io::Result<PathBuf> {
    let path = dir.join(file_name);
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(tmp.as_file(), value)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|err| err.error)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Player;
    use chrono::{TimeZone, Utc};

    fn game(url: &str, end_time: i64) -> Game {
        Game {
            url: url.to_string(),
            end_time: Utc.timestamp_opt(end_time, 0).unwrap(),
            rated: true,
            time_class: "blitz".into(),
            rules: "chess".into(),
            white: Player {
                username: "alice".into(),
                rating: 1200,
                result: "win".into(),
                profile_url: String::new(),
            },
            black: Player {
                username: "bob".into(),
                rating: 1180,
                result: "resigned".into(),
                profile_url: String::new(),
            },
            pgn: "1. e4 e5".into(),
        }
    }

    const ID: &str = "/pub/player/alice/games/2024/01";

    #[test]
    fn archive_round_trips_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let games = vec![game("g1", 100), game("g2", 200)];

        let mut cache = ArchiveCache::at(dir.path());
        cache.save_archive(ID, &games);

        // A fresh instance reads from disk, not the memo.
        let mut fresh = ArchiveCache::at(dir.path());
        let loaded = fresh.load_archive(ID).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].url, "g1");
        assert_eq!(loaded[1].end_time, games[1].end_time);
    }

    #[test]
    fn missing_archive_is_a_miss_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ArchiveCache::at(dir.path());
        assert!(cache.load_archive(ID).is_none());
    }

    #[test]
    fn empty_archive_file_is_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(archive_file_name(ID)), "[]").unwrap();

        let mut cache = ArchiveCache::at(dir.path());
        let loaded = cache.load_archive(ID).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_archive_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(archive_file_name(ID)), "{not json").unwrap();

        let mut cache = ArchiveCache::at(dir.path());
        assert!(cache.load_archive(ID).is_none());
    }

    #[test]
    fn loaded_archives_are_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ArchiveCache::at(dir.path());
        cache.save_archive(ID, &[game("g1", 100)]);
        assert!(cache.load_archive(ID).is_some());

        // Deleting the file does not evict the in-process copy.
        std::fs::remove_file(dir.path().join(archive_file_name(ID))).unwrap();
        assert!(cache.load_archive(ID).is_some());
    }

    #[test]
    fn etags_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ArchiveCache::at(dir.path());
        assert!(cache.load_etag(ID).is_none());
        cache.save_etag(ID, "W/\"abc\"");

        let mut fresh = ArchiveCache::at(dir.path());
        assert_eq!(fresh.load_etag(ID).as_deref(), Some("W/\"abc\""));
    }

    #[test]
    fn user_index_persists_and_unknown_user_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ArchiveCache::at(dir.path());
        assert!(cache.load_user_archives("bob").is_empty());

        cache.save_user_archives("alice", vec![ID.to_string()]);
        let mut fresh = ArchiveCache::at(dir.path());
        assert_eq!(fresh.load_user_archives("alice"), vec![ID.to_string()]);
        assert!(fresh.load_user_archives("bob").is_empty());
    }

    #[test]
    fn disabled_cache_degrades_silently() {
        // A file path cannot become a directory, so creation fails.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let mut cache = ArchiveCache::at(&blocker);
        cache.save_archive(ID, &[game("g1", 100)]);
        assert!(cache.load_archive(ID).is_none());
        assert!(cache.load_user_archives("alice").is_empty());
        assert!(!blocker.is_dir());
    }
}
