//! State mirror port — best-effort copies of session changes.
//!
//! Mirrors are fed from detached tasks after the in-memory write has already
//! succeeded. Their failures are logged by the caller and never roll back the
//! store.

use std::future::Future;
use std::sync::Arc;

use vehiclehub_domain::entry::Entry;
use vehiclehub_domain::error::HubError;

/// Receives every published session change.
pub trait StateMirror: Send + Sync {
    /// Forward an entry to the external sink.
    fn mirror(&self, entry: &Entry) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: StateMirror> StateMirror for Arc<T> {
    fn mirror(&self, entry: &Entry) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).mirror(entry)
    }
}

/// A disabled mirror does nothing.
impl<T: StateMirror> StateMirror for Option<T> {
    async fn mirror(&self, entry: &Entry) -> Result<(), HubError> {
        match self {
            Some(inner) => inner.mirror(entry).await,
            None => Ok(()),
        }
    }
}

/// No mirroring at all.
impl StateMirror for () {
    async fn mirror(&self, _entry: &Entry) -> Result<(), HubError> {
        Ok(())
    }
}

/// Fan out to two mirrors. Both are always attempted; the first error wins.
impl<A: StateMirror, B: StateMirror> StateMirror for (A, B) {
    async fn mirror(&self, entry: &Entry) -> Result<(), HubError> {
        let first = self.0.mirror(entry).await;
        let second = self.1.mirror(entry).await;
        first.and(second)
    }
}
