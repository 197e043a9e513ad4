use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::stream_handle::DeviceStreamHandle;
use crate::device::watchdog::Watchdog;
use crate::models::config::ScanConfiguration;
use crate::models::error::{ScanError, SessionError};
use crate::models::platform::{PlatformError, StreamId};
use crate::models::scan_result::{ScanResult, ScanSource};
use crate::models::state::ScanState;
use crate::processing::classify::{classify_engine_failure, classify_frame, FrameVerdict};
use crate::processing::manual_entry::normalize_manual_entry;
use crate::traits::camera_source::CameraSource;
use crate::traits::decode_engine::{DecodeEngine, FrameCallback};
use crate::traits::scan_delegate::ScanDelegate;
use crate::traits::video_sink::VideoSink;

use super::arbiter::{CameraArbiter, CameraHolder};
use super::subscription::DecodeSubscription;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Internal mutable session state, protected by `parking_lot::Mutex`.
///
/// Never held across a call into a collaborator (camera, sink, engine,
/// delegate): those may answer synchronously and re-enter the session.
struct SessionState {
    state: ScanState,
    /// Bumped on every attempt and every teardown; callbacks carry the
    /// generation they were issued for and are dropped when it moved on.
    generation: u64,
    handle: Option<DeviceStreamHandle>,
    subscription: Option<DecodeSubscription>,
    scan_watchdog: Option<Watchdog>,
    last_error: Option<ScanError>,
    last_result: Option<ScanResult>,
    /// Teardowns whose resources are detached but not yet released.
    teardowns: u32,
    destroyed: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            state: ScanState::Idle,
            generation: 0,
            handle: None,
            subscription: None,
            scan_watchdog: None,
            last_error: None,
            last_result: None,
            teardowns: 0,
            destroyed: false,
        }
    }

    fn is_current(&self, generation: u64, state: ScanState) -> bool {
        !self.destroyed && self.generation == generation && self.state == state
    }

    /// Move every held resource out, to be released once the lock is dropped.
    fn detach(&mut self) -> Detached {
        self.teardowns += 1;
        Detached {
            handle: self.handle.take(),
            subscription: self.subscription.take(),
            watchdog: self.scan_watchdog.take(),
        }
    }
}

/// Resources taken out of the session during a teardown.
struct Detached {
    handle: Option<DeviceStreamHandle>,
    subscription: Option<DecodeSubscription>,
    watchdog: Option<Watchdog>,
}

impl Detached {
    /// Ends the decode loop before the tracks stop, so the engine never
    /// samples a dead stream.
    fn release(self) {
        let Self {
            handle,
            subscription,
            watchdog,
        } = self;
        drop(watchdog);
        if let Some(mut subscription) = subscription {
            subscription.cancel();
        }
        if let Some(mut handle) = handle {
            handle.release();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Start,
    Retry,
}

impl Activation {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Retry => "retry",
        }
    }
}

struct SessionCore {
    id: u64,
    camera: Arc<dyn CameraSource>,
    engine: Arc<dyn DecodeEngine>,
    sink: Arc<dyn VideoSink>,
    config: ScanConfiguration,
    delegate: Mutex<Option<Arc<dyn ScanDelegate>>>,
    arbiter: Option<CameraArbiter>,
    state: Mutex<SessionState>,
}

/// Camera-driven barcode scan session.
///
/// Sequences camera acquisition, preview attachment, the decode loop,
/// result emission and teardown:
/// ```text
/// start() → [CameraSource] → DeviceStreamHandle → attach_to(VideoSink)
///         → DecodeSubscription(DecodeEngine) → first decoded frame
///         → release camera → ScanDelegate::on_result
/// ```
///
/// Every asynchronous answer (stream granted, sink ready, frame decoded,
/// watchdog expired) is tagged with the generation that issued it, so
/// answers for a stopped or superseded attempt are dropped and any stream
/// they carry is released.
///
/// Dropping the session stops it.
pub struct ScanSession {
    core: Arc<SessionCore>,
}

impl ScanSession {
    /// Create a standalone session.
    ///
    /// Nothing stops another session from opening the same camera. Sessions
    /// that share a camera must be built with [`ScanSession::with_arbiter`].
    pub fn new(
        camera: Arc<dyn CameraSource>,
        engine: Arc<dyn DecodeEngine>,
        sink: Arc<dyn VideoSink>,
        config: ScanConfiguration,
    ) -> Self {
        Self::build(camera, engine, sink, config, None)
    }

    /// Create a session that shares the camera with other sessions through
    /// `arbiter`; starting it stops whichever session held the camera.
    pub fn with_arbiter(
        camera: Arc<dyn CameraSource>,
        engine: Arc<dyn DecodeEngine>,
        sink: Arc<dyn VideoSink>,
        config: ScanConfiguration,
        arbiter: &CameraArbiter,
    ) -> Self {
        Self::build(camera, engine, sink, config, Some(arbiter.clone()))
    }

    fn build(
        camera: Arc<dyn CameraSource>,
        engine: Arc<dyn DecodeEngine>,
        sink: Arc<dyn VideoSink>,
        config: ScanConfiguration,
        arbiter: Option<CameraArbiter>,
    ) -> Self {
        Self {
            core: Arc::new(SessionCore {
                id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
                camera,
                engine,
                sink,
                config,
                delegate: Mutex::new(None),
                arbiter,
                state: Mutex::new(SessionState::new()),
            }),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn ScanDelegate>) {
        *self.core.delegate.lock() = Some(delegate);
    }

    pub fn id(&self) -> u64 {
        self.core.id
    }

    pub fn state(&self) -> ScanState {
        self.core.state.lock().state
    }

    pub fn last_error(&self) -> Option<ScanError> {
        self.core.state.lock().last_error.clone()
    }

    pub fn last_result(&self) -> Option<ScanResult> {
        self.core.state.lock().last_result.clone()
    }

    /// Stream currently held by the session, if any.
    pub fn active_stream(&self) -> Option<StreamId> {
        self.core.state.lock().handle.as_ref().map(|h| h.id())
    }

    /// Begin a scan. Transitions: idle/failed → initializing.
    ///
    /// A no-op while initializing or scanning.
    pub fn start(&self) -> Result<(), SessionError> {
        self.core.activate(Activation::Start)
    }

    /// Fresh acquisition after a failure. Transitions: failed → initializing.
    pub fn retry(&self) -> Result<(), SessionError> {
        self.core.activate(Activation::Retry)
    }

    /// Release the camera and return to idle. Safe from every state; a
    /// no-op when already idle. The camera is released before this returns.
    pub fn stop(&self) {
        self.core.stop();
    }

    /// Deliver a barcode typed by the user through the same `on_result`
    /// path as a camera scan. Any running scan is stopped first.
    ///
    /// Returns `Ok(None)` for blank input.
    pub fn submit_manual(&self, input: &str) -> Result<Option<ScanResult>, SessionError> {
        self.core.submit_manual(input)
    }

    /// Unmount: stop unconditionally and refuse further activations.
    pub fn destroy(&self) {
        self.core.destroy();
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.core.destroy();
    }
}

impl CameraHolder for SessionCore {
    fn release_camera(&self) {
        self.stop();
    }
}

impl SessionCore {
    fn activate(self: &Arc<Self>, activation: Activation) -> Result<(), SessionError> {
        let generation = {
            let mut s = self.state.lock();
            if s.destroyed {
                return Err(SessionError::Destroyed);
            }
            if s.teardowns > 0 {
                return Err(SessionError::Busy);
            }
            match (activation, s.state) {
                (Activation::Start, ScanState::Initializing | ScanState::Scanning) => {
                    log::debug!("Session {}: start ignored, already {:?}", self.id, s.state);
                    return Ok(());
                }
                (Activation::Start, ScanState::Idle | ScanState::Failed)
                | (Activation::Retry, ScanState::Failed) => {}
                (_, ScanState::Succeeded) => return Err(SessionError::Busy),
                (Activation::Retry, state) => {
                    return Err(SessionError::InvalidTransition {
                        operation: activation.name(),
                        state,
                    })
                }
            }
            s.generation += 1;
            s.state = ScanState::Initializing;
            s.last_error = None;
            s.generation
        };

        log::info!("Session {}: {} (generation {})", self.id, activation.name(), generation);
        self.notify_state(ScanState::Initializing);

        if let Err(reason) = self.config.validate() {
            self.fail(generation, ScanError::Unknown(format!("invalid configuration: {}", reason)));
            return Ok(());
        }

        if let Some(arbiter) = &self.arbiter {
            let holder: Arc<dyn CameraHolder> = self.clone();
            arbiter.claim(self.id, Arc::downgrade(&holder));
        }

        let weak = Arc::downgrade(self);
        DeviceStreamHandle::acquire(
            Arc::clone(&self.camera),
            &self.config,
            Box::new(move |outcome| match weak.upgrade() {
                Some(core) => core.on_acquired(generation, outcome),
                None => {
                    if let Ok(mut handle) = outcome {
                        log::debug!("Session gone, releasing late stream {}", handle.id().0);
                        handle.release();
                    }
                }
            }),
        );
        Ok(())
    }

    fn on_acquired(self: &Arc<Self>, generation: u64, outcome: Result<DeviceStreamHandle, ScanError>) {
        let mut handle = match outcome {
            Ok(handle) => handle,
            Err(error) => {
                self.fail(generation, error);
                return;
            }
        };

        // The handle goes into the session before the sink is called, so a
        // concurrent stop() always finds it and releases it.
        let weak = Arc::downgrade(self);
        let request = {
            let mut s = self.state.lock();
            if !s.is_current(generation, ScanState::Initializing) {
                drop(s);
                log::warn!(
                    "Session {}: stream {} arrived for stale generation {}, releasing",
                    self.id,
                    handle.id().0,
                    generation
                );
                handle.release();
                return;
            }
            let armed = handle.attach_to(
                Arc::clone(&self.sink),
                self.config.attach_timeout,
                Box::new(move |ready| {
                    if let Some(core) = weak.upgrade() {
                        core.on_attached(generation, ready);
                    }
                }),
            );
            match armed {
                Ok(request) => {
                    s.handle = Some(handle);
                    request
                }
                Err(error) => {
                    drop(s);
                    handle.release();
                    self.fail(generation, error);
                    return;
                }
            }
        };
        request.send();
    }

    fn on_attached(self: &Arc<Self>, generation: u64, ready: Result<(), ScanError>) {
        if let Err(error) = ready {
            self.fail(generation, error);
            return;
        }

        {
            let mut s = self.state.lock();
            if !s.is_current(generation, ScanState::Initializing) {
                return;
            }
            s.state = ScanState::Scanning;
        }
        self.notify_state(ScanState::Scanning);

        let weak = Arc::downgrade(self);
        let on_frame: FrameCallback = Arc::new(move |text: Option<&str>, error: Option<&PlatformError>| {
            if let Some(core) = weak.upgrade() {
                core.on_frame(generation, text, error);
            }
        });

        let mut subscription =
            match DecodeSubscription::begin(Arc::clone(&self.engine), Arc::clone(&self.sink), generation, on_frame) {
                Ok(subscription) => subscription,
                Err(e) => {
                    log::error!("Session {}: decoder failed to start: {}", self.id, e);
                    self.fail(generation, classify_engine_failure(&e));
                    return;
                }
            };

        let watchdog = match self.config.max_scan_duration {
            Some(limit) => {
                let weak = Arc::downgrade(self);
                let armed = Watchdog::arm("scan-duration-watchdog", limit, move || {
                    if let Some(core) = weak.upgrade() {
                        log::warn!("Session {}: nothing decoded within {:?}", core.id, limit);
                        core.fail(generation, ScanError::Timeout);
                    }
                });
                match armed {
                    Ok(watchdog) => Some(watchdog),
                    Err(error) => {
                        subscription.cancel();
                        self.fail(generation, error);
                        return;
                    }
                }
            }
            None => None,
        };

        let mut s = self.state.lock();
        if s.is_current(generation, ScanState::Scanning) {
            s.subscription = Some(subscription);
            s.scan_watchdog = watchdog;
        } else {
            drop(s);
            drop(watchdog);
            subscription.cancel();
        }
    }

    fn on_frame(&self, generation: u64, text: Option<&str>, error: Option<&PlatformError>) {
        match classify_frame(text, error) {
            FrameVerdict::Miss => {}
            FrameVerdict::Decoded(text) => self.succeed(generation, text),
            FrameVerdict::Fatal(error) => self.fail(generation, error),
        }
    }

    fn succeed(&self, generation: u64, text: String) {
        let (detached, teardown_generation, result) = {
            let mut s = self.state.lock();
            if !s.is_current(generation, ScanState::Scanning) {
                log::debug!("Session {}: dropping stale decode {:?}", self.id, text);
                return;
            }
            let result = ScanResult::new(text, ScanSource::Camera);
            s.generation += 1;
            s.state = ScanState::Succeeded;
            s.last_result = Some(result.clone());
            (s.detach(), s.generation, result)
        };

        log::info!("Session {}: decoded {:?}", self.id, result.text());
        self.notify_state(ScanState::Succeeded);
        detached.release();

        let settled = {
            let mut s = self.state.lock();
            s.teardowns -= 1;
            if s.generation == teardown_generation && s.state == ScanState::Succeeded {
                s.state = ScanState::Idle;
                true
            } else {
                false
            }
        };
        if settled {
            self.notify_state(ScanState::Idle);
        }

        if let Some(delegate) = self.delegate() {
            delegate.on_result(&result);
        }
    }

    fn fail(&self, generation: u64, error: ScanError) {
        let detached = {
            let mut s = self.state.lock();
            if s.destroyed || s.generation != generation || !s.state.is_active() {
                log::debug!("Session {}: ignoring stale failure: {}", self.id, error);
                return;
            }
            s.generation += 1;
            s.state = ScanState::Failed;
            s.last_error = Some(error.clone());
            s.detach()
        };

        log::error!("Session {}: scan failed: {}", self.id, error);
        self.notify_state(ScanState::Failed);
        detached.release();
        self.state.lock().teardowns -= 1;

        if let Some(delegate) = self.delegate() {
            delegate.on_error(&error);
        }
    }

    fn stop(&self) {
        let detached = {
            let mut s = self.state.lock();
            if s.state.is_idle() {
                return;
            }
            s.generation += 1;
            s.state = ScanState::Idle;
            s.last_error = None;
            s.detach()
        };

        log::info!("Session {}: stopped", self.id);
        detached.release();
        self.state.lock().teardowns -= 1;
        self.notify_state(ScanState::Idle);
    }

    fn submit_manual(&self, input: &str) -> Result<Option<ScanResult>, SessionError> {
        if self.state.lock().destroyed {
            return Err(SessionError::Destroyed);
        }
        let Some(text) = normalize_manual_entry(input) else {
            return Ok(None);
        };

        self.stop();

        let result = ScanResult::new(text, ScanSource::Manual);
        self.state.lock().last_result = Some(result.clone());
        log::info!("Session {}: manual entry {:?}", self.id, result.text());

        if let Some(delegate) = self.delegate() {
            delegate.on_result(&result);
        }
        Ok(Some(result))
    }

    fn destroy(&self) {
        {
            let mut s = self.state.lock();
            if s.destroyed {
                return;
            }
            s.destroyed = true;
        }
        self.stop();
        if let Some(arbiter) = &self.arbiter {
            arbiter.vacate(self.id);
        }
        log::debug!("Session {}: destroyed", self.id);
    }

    fn delegate(&self) -> Option<Arc<dyn ScanDelegate>> {
        self.delegate.lock().clone()
    }

    fn notify_state(&self, state: ScanState) {
        log::debug!("Session {}: -> {:?}", self.id, state);
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(state);
        }
    }
}
