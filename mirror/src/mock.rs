//! Mock remote for store tests: configurable responses plus a call log.

use crate::client::ArchiveFetch;
use crate::error::{MirrorError, MirrorResult};
use crate::traits::RemoteArchives;
use std::sync::Mutex;

type ListFn = Box<dyn Fn(&str) -> MirrorResult<Vec<String>> + Send>;
type FetchFn = Box<dyn Fn(&str, Option<&str>) -> MirrorResult<ArchiveFetch> + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListArchives {
        user: String,
    },
    FetchArchive {
        id: String,
        etag: Option<String>,
    },
}

#[derive(Default)]
pub struct MockRemote {
    list_fn: Mutex<Option<ListFn>>,
    fetch_fn: Mutex<Option<FetchFn>>,
    call_log: Mutex<Vec<MockCall>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_list(&self, f: impl Fn(&str) -> MirrorResult<Vec<String>> + Send + 'static) {
        *self.list_fn.lock().unwrap() = Some(Box::new(f));
    }

    pub fn on_fetch(
        &self,
        f: impl Fn(&str, Option<&str>) -> MirrorResult<ArchiveFetch> + Send + 'static,
    ) {
        *self.fetch_fn.lock().unwrap() = Some(Box::new(f));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::FetchArchive { .. }))
            .count()
    }
}

impl RemoteArchives for MockRemote {
    fn list_archives(&self, user: &str) -> MirrorResult<Vec<String>> {
        self.call_log.lock().unwrap().push(MockCall::ListArchives {
            user: user.to_string(),
        });
        match &*self.list_fn.lock().unwrap() {
            Some(f) => f(user),
            None => Err(MirrorError::NotConfigured("list_archives".into())),
        }
    }

    fn fetch_archive(&self, id: &str, known_etag: Option<&str>) -> MirrorResult<ArchiveFetch> {
        self.call_log.lock().unwrap().push(MockCall::FetchArchive {
            id: id.to_string(),
            etag: known_etag.map(str::to_string),
        });
        match &*self.fetch_fn.lock().unwrap() {
            Some(f) => f(id, known_etag),
            None => Err(MirrorError::NotConfigured("fetch_archive".into())),
        }
    }
}
