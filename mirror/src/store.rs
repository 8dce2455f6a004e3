//! Synchronization policy: when to trust the cache, when to refetch, and
//! how to recover when the two disagree.

use crate::cache::ArchiveCache;
use crate::client::{ArchiveClient, ArchiveFetch};
use crate::error::{MirrorError, MirrorResult};
use crate::model::Game;
use crate::traits::RemoteArchives;

/// Owns the remote client and the local cache; all reads and writes of
/// mirrored data go through here. Not safe for unsynchronized concurrent
/// mutation - callers own one logical sequence of operations.
pub struct GameStore<R = ArchiveClient> {
    remote: R,
    cache: ArchiveCache,
}

impl GameStore<ArchiveClient> {
    /// Store backed by the real service and the platform cache directory.
    pub fn open() -> Self {
        Self::new(ArchiveClient::new(), ArchiveCache::open())
    }
}

impl<R: RemoteArchives> GameStore<R> {
    pub fn new(remote: R, cache: ArchiveCache) -> Self {
        Self { remote, cache }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// A user's archive ids. `cache_only` never touches the network and may
    /// return an empty list; otherwise the remote listing is fetched and
    /// unconditionally replaces the cached index.
    pub fn list_archives(&mut self, user: &str, cache_only: bool) -> MirrorResult<Vec<String>> {
        if cache_only {
            return Ok(self.cache.load_user_archives(user));
        }

        let archives = self.remote.list_archives(user)?;
        self.cache.save_user_archives(user, archives.clone());
        Ok(archives)
    }

    /// Open one archive's games.
    ///
    /// `cache_only` serves the cached snapshot or fails; `force_fetch`
    /// skips the validator and always persists fresh data. The default path
    /// fetches conditionally and trusts the cache on "not modified" -
    /// unless the local copy turns out to be unreadable, in which case one
    /// forced refetch repairs it. The forced path always persists before
    /// returning, so this escalation cannot repeat.
    pub fn open_archive(
        &mut self,
        id: &str,
        cache_only: bool,
        force_fetch: bool,
    ) -> MirrorResult<Vec<Game>> {
        if cache_only {
            return self
                .cache
                .load_archive(id)
                .ok_or_else(|| MirrorError::NotCached(id.to_string()));
        }

        if force_fetch {
            return self.fetch_and_persist(id);
        }

        // A recorded empty validator is the same as no validator.
        let known_etag = self.cache.load_etag(id).filter(|e| !e.is_empty());
        let fetch = self.remote.fetch_archive(id, known_etag.as_deref())?;

        if !fetch.changed {
            if let Some(games) = self.cache.load_archive(id) {
                return Ok(games);
            }
            tracing::error!("could not open cached archive {}, forcing a refetch", id);
            return self.fetch_and_persist(id);
        }

        self.persist(id, &fetch);
        Ok(fetch.games)
    }

    /// Every game of a user under the requested cache policy, newest first.
    /// A single failing archive is logged and skipped, never fatal.
    pub fn list_games(
        &mut self,
        user: &str,
        cache_only: bool,
        force_fetch: bool,
    ) -> MirrorResult<Vec<Game>> {
        let archives = self.list_archives(user, cache_only && !force_fetch)?;

        let mut games = Vec::new();
        for id in &archives {
            match self.open_archive(id, cache_only, force_fetch) {
                Ok(mut archive_games) => games.append(&mut archive_games),
                Err(err) => tracing::warn!("could not open archive {}: {}", id, err),
            }
        }

        games.sort_by(|a, b| b.end_time.cmp(&a.end_time));
        Ok(games)
    }

    /// Everything already mirrored for `user`, without network access.
    pub fn cached_games(&mut self, user: &str) -> MirrorResult<Vec<Game>> {
        self.list_games(user, true, false)
    }

    /// Check the remote for new data. Network failure here propagates; the
    /// caller asked for a refresh explicitly.
    pub fn refresh(&mut self, user: &str, force: bool) -> MirrorResult<Vec<Game>> {
        self.list_games(user, false, force)
    }

    /// Find a mirrored game whose URL ends with `id`.
    pub fn open_game(&mut self, user: &str, id: &str) -> MirrorResult<Game> {
        let games = self.cached_games(user)?;
        games
            .into_iter()
            .find(|g| g.url.ends_with(id))
            .ok_or_else(|| MirrorError::GameNotFound {
                user: user.to_string(),
                id: id.to_string(),
            })
    }

    fn fetch_and_persist(&mut self, id: &str) -> MirrorResult<Vec<Game>> {
        let fetch = self.remote.fetch_archive(id, None)?;
        self.persist(id, &fetch);
        Ok(fetch.games)
    }

    /// Games first, validator second: the stored validator must never
    /// describe games that were not persisted.
    fn persist(&mut self, id: &str, fetch: &ArchiveFetch) {
        self.cache.save_archive(id, &fetch.games);
        self.cache.save_etag(id, &fetch.etag);
    }
}
