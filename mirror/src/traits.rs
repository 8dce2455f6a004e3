//! Remote service interface, implemented by the real HTTP client and by
//! the mock used in store tests.

use crate::client::ArchiveFetch;
use crate::error::MirrorResult;

pub trait RemoteArchives {
    /// List a user's archive identifiers in remote (chronological) order.
    fn list_archives(&self, user: &str) -> MirrorResult<Vec<String>>;

    /// Fetch one archive, conditionally when a validator is known.
    fn fetch_archive(&self, id: &str, known_etag: Option<&str>) -> MirrorResult<ArchiveFetch>;
}
