//! Page session context.
//!
//! Owns the per-page state every behavior shares: the document, the page
//! location and the host. A [`Page`] lives for one page load and is shared
//! as `Arc<Page>` with the components and their timers.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::dom::{Document, NodeId, Selector};
use crate::host::Host;
use crate::models::Location;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Page {
    document: Mutex<Document>,
    location: Location,
    host: Arc<dyn Host>,
}

impl Page {
    pub fn new(document: Document, location: Location, host: Arc<dyn Host>) -> Arc<Self> {
        Arc::new(Self {
            document: Mutex::new(document),
            location,
            host,
        })
    }

    /// Exclusive access to the document. Never hold the guard across an
    /// `.await`.
    pub fn document(&self) -> MutexGuard<'_, Document> {
        lock(&self.document)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Convenience query from the document root.
    pub fn query(&self, selector: &Selector) -> Option<NodeId> {
        let doc = self.document();
        doc.query(doc.root(), selector)
    }

    /// Run `effect` against the document once `delay` has elapsed.
    /// Earlier timers are never cancelled.
    pub fn after<F>(self: &Arc<Self>, delay: Duration, effect: F) -> JoinHandle<()>
    where
        F: FnOnce(&mut Document) + Send + 'static,
    {
        let page = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            effect(&mut page.document());
        })
    }
}

/// Spawn `task` after `delay`. Used for follow-ups that need more than the
/// document, such as reopening or reloading the overlay.
pub fn spawn_after<F>(delay: Duration, task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        task.await;
    })
}
