//! Page-load-scoped hand-off between the preview route and the page that
//! renders the previewed document. One writer, one reader.

use std::sync::{Arc, RwLock};

use crate::session::PreviewData;

#[derive(Debug, Clone, Default)]
pub struct PreviewSlot {
    inner: Arc<RwLock<Option<PreviewData>>>,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever the slot held.
    pub fn store(&self, data: PreviewData) {
        // A poisoned slot only ever held a complete value; keep using it.
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(data);
    }

    pub fn get(&self) -> Option<PreviewData> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn take(&self) -> Option<PreviewData> {
        self.inner.write().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn clear(&self) {
        self.take();
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .map(|slot| slot.is_none())
            .unwrap_or(true)
    }
}
