use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Something that can be told to give the camera back.
pub(crate) trait CameraHolder: Send + Sync {
    fn release_camera(&self);
}

struct Holder {
    id: u64,
    session: Weak<dyn CameraHolder>,
}

/// Keeps at most one session per context holding the camera.
///
/// Sessions created with the same arbiter stop the previous holder before
/// they start acquiring. Clones share the same registry.
#[derive(Clone, Default)]
pub struct CameraArbiter {
    holder: Arc<Mutex<Option<Holder>>>,
}

impl CameraArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the session that last claimed the camera, if it still exists.
    pub fn holder_id(&self) -> Option<u64> {
        self.holder
            .lock()
            .as_ref()
            .filter(|h| h.session.strong_count() > 0)
            .map(|h| h.id)
    }

    pub(crate) fn claim(&self, id: u64, session: Weak<dyn CameraHolder>) {
        let previous = self.holder.lock().replace(Holder { id, session });
        let Some(previous) = previous else {
            return;
        };
        if previous.id == id {
            return;
        }
        if let Some(session) = previous.session.upgrade() {
            log::info!("Session {} takes the camera from session {}", id, previous.id);
            session.release_camera();
        }
    }

    pub(crate) fn vacate(&self, id: u64) {
        let mut holder = self.holder.lock();
        if holder.as_ref().is_some_and(|h| h.id == id) {
            *holder = None;
        }
    }
}
