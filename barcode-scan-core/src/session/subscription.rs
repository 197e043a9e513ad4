use std::sync::Arc;

use crate::models::platform::PlatformError;
use crate::traits::decode_engine::{DecodeEngine, FrameCallback};
use crate::traits::video_sink::VideoSink;

/// Owned handle to a running decode loop.
///
/// Tagged with the session generation it was started for. Cancelling ends
/// the engine loop exactly once; dropping cancels.
pub struct DecodeSubscription {
    engine: Arc<dyn DecodeEngine>,
    generation: u64,
    active: bool,
}

impl DecodeSubscription {
    pub fn begin(
        engine: Arc<dyn DecodeEngine>,
        sink: Arc<dyn VideoSink>,
        generation: u64,
        on_frame: FrameCallback,
    ) -> Result<Self, PlatformError> {
        engine.begin_decoding(sink, on_frame)?;
        log::debug!("Decode loop started (generation {})", generation);
        Ok(Self {
            engine,
            generation,
            active: true,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cancel(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.engine.end_decoding();
        log::debug!("Decode loop ended (generation {})", self.generation);
    }
}

impl Drop for DecodeSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEngine, FakeSink, SinkMode};

    fn noop_callback() -> FrameCallback {
        Arc::new(|_: Option<&str>, _: Option<&PlatformError>| {})
    }

    #[test]
    fn cancel_ends_decoding_once() {
        let engine = FakeEngine::new();
        let sink = FakeSink::new(SinkMode::Immediate);
        let mut sub = DecodeSubscription::begin(engine.clone(), sink, 7, noop_callback()).unwrap();

        assert!(engine.is_active());
        assert_eq!(sub.generation(), 7);

        sub.cancel();
        sub.cancel();
        drop(sub);

        assert!(!engine.is_active());
        assert_eq!(engine.end_calls(), 1);
    }

    #[test]
    fn begin_failure_is_returned() {
        let engine = FakeEngine::failing("EngineUnavailable");
        let sink = FakeSink::new(SinkMode::Immediate);

        let err = DecodeSubscription::begin(engine.clone(), sink, 1, noop_callback()).err().unwrap();

        assert_eq!(err.name, "EngineUnavailable");
        assert_eq!(engine.end_calls(), 0);
    }
}
