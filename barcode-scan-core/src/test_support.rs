//! Fakes for the platform traits, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::ScanError;
use crate::models::platform::{PlatformError, StreamConstraints, StreamId, TrackKind};
use crate::models::scan_result::ScanResult;
use crate::models::state::ScanState;
use crate::traits::camera_source::{CameraSource, MediaTrack, StreamCompletion, StreamFailure};
use crate::traits::decode_engine::{DecodeEngine, FrameCallback};
use crate::traits::scan_delegate::ScanDelegate;
use crate::traits::video_sink::{ReadyCallback, VideoSink};

/// Shared view of a fake track, still readable after the track itself has
/// been dropped by the code under test.
#[derive(Clone)]
pub struct TrackProbe {
    stops: Arc<AtomicUsize>,
    live: Arc<AtomicBool>,
}

impl TrackProbe {
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

pub struct FakeTrack {
    kind: TrackKind,
    probe: TrackProbe,
}

impl FakeTrack {
    pub fn new(kind: TrackKind) -> (Self, TrackProbe) {
        let probe = TrackProbe {
            stops: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicBool::new(true)),
        };
        (
            Self {
                kind,
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl MediaTrack for FakeTrack {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn label(&self) -> String {
        "Fake Camera".into()
    }

    fn stop(&mut self) {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.probe.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.probe.is_live()
    }
}

/// Scripted answer to one stream request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Grant a stream with this many video tracks.
    Grant(usize),
    /// Grant a stream that only carries an audio track.
    GrantAudioOnly,
    /// Fail with the given platform error name.
    Deny(&'static str),
    /// Open this many tracks, then fail with the given name.
    PartialThenFail(usize, &'static str),
    /// Hold the completion until `resolve_pending` is called.
    Defer,
}

#[derive(Default)]
struct FakeCameraInner {
    script: VecDeque<Reply>,
    pending: VecDeque<StreamCompletion>,
    requests: Vec<StreamConstraints>,
    probes: Vec<TrackProbe>,
}

/// Camera whose answers are scripted per request. Unscripted requests are
/// granted with one video track.
#[derive(Default)]
pub struct FakeCamera {
    inner: Mutex<FakeCameraInner>,
}

impl FakeCamera {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        let camera = Self::new();
        camera.inner.lock().script.extend(replies);
        camera
    }

    pub fn push_reply(&self, reply: Reply) {
        self.inner.lock().script.push_back(reply);
    }

    /// Complete the oldest deferred request.
    pub fn resolve_pending(&self, reply: Reply) {
        let completion = self.inner.lock().pending.pop_front();
        let completion = completion.expect("no pending stream request");
        let outcome = self.build_outcome(&reply);
        completion(outcome);
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.inner.lock().requests.clone()
    }

    pub fn probes(&self) -> Vec<TrackProbe> {
        self.inner.lock().probes.clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.probes().iter().filter(|p| p.is_live()).count()
    }

    fn open_tracks(&self, count: usize, kind: TrackKind) -> Vec<Box<dyn MediaTrack>> {
        let mut inner = self.inner.lock();
        (0..count)
            .map(|_| {
                let (track, probe) = FakeTrack::new(kind);
                inner.probes.push(probe);
                Box::new(track) as Box<dyn MediaTrack>
            })
            .collect()
    }

    fn build_outcome(&self, reply: &Reply) -> Result<Vec<Box<dyn MediaTrack>>, StreamFailure> {
        match reply {
            Reply::Grant(count) => Ok(self.open_tracks(*count, TrackKind::Video)),
            Reply::GrantAudioOnly => Ok(self.open_tracks(1, TrackKind::Audio)),
            Reply::Deny(name) => Err(StreamFailure::new(PlatformError::named(*name))),
            Reply::PartialThenFail(count, name) => Err(StreamFailure::with_opened_tracks(
                PlatformError::named(*name),
                self.open_tracks(*count, TrackKind::Video),
            )),
            Reply::Defer => unreachable!("deferred replies are not built"),
        }
    }
}

impl CameraSource for FakeCamera {
    fn request_stream(&self, constraints: &StreamConstraints, completion: StreamCompletion) {
        let reply = {
            let mut inner = self.inner.lock();
            inner.requests.push(constraints.clone());
            inner.script.pop_front().unwrap_or(Reply::Grant(1))
        };
        if let Reply::Defer = reply {
            self.inner.lock().pending.push_back(completion);
            return;
        }
        let outcome = self.build_outcome(&reply);
        completion(outcome);
    }
}

/// How a fake sink answers an attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Report ready before `attach` returns.
    Immediate,
    /// Hold the readiness callback until `fire_ready` is called.
    Deferred,
    /// Never report anything.
    Silent,
    /// Report a playback error with this name.
    Fail(&'static str),
}

struct FakeSinkInner {
    mode: SinkMode,
    attached: Vec<StreamId>,
    detach_calls: usize,
    pending: VecDeque<ReadyCallback>,
}

pub struct FakeSink {
    inner: Mutex<FakeSinkInner>,
}

impl FakeSink {
    pub fn new(mode: SinkMode) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(FakeSinkInner {
                mode,
                attached: Vec::new(),
                detach_calls: 0,
                pending: VecDeque::new(),
            }),
        })
    }

    pub fn set_mode(&self, mode: SinkMode) {
        self.inner.lock().mode = mode;
    }

    pub fn fire_ready(&self) {
        let callback = self.inner.lock().pending.pop_front();
        if let Some(callback) = callback {
            callback(Ok(()));
        }
    }

    pub fn attached(&self) -> Vec<StreamId> {
        self.inner.lock().attached.clone()
    }

    pub fn detach_calls(&self) -> usize {
        self.inner.lock().detach_calls
    }
}

impl VideoSink for FakeSink {
    fn attach(&self, stream: StreamId, on_ready: ReadyCallback) {
        let mode = {
            let mut inner = self.inner.lock();
            inner.attached.push(stream);
            inner.mode
        };
        match mode {
            SinkMode::Immediate => on_ready(Ok(())),
            SinkMode::Deferred => self.inner.lock().pending.push_back(on_ready),
            SinkMode::Silent => drop(on_ready),
            SinkMode::Fail(name) => on_ready(Err(PlatformError::named(name))),
        }
    }

    fn detach(&self, stream: StreamId) {
        let mut inner = self.inner.lock();
        inner.attached.retain(|s| *s != stream);
        inner.detach_calls += 1;
    }
}

#[derive(Default)]
struct FakeEngineInner {
    callback: Option<FrameCallback>,
    active: bool,
    begin_calls: usize,
    end_calls: usize,
    fail_begin: Option<PlatformError>,
}

/// Decode engine driven by the test. The last frame callback is kept even
/// after `end_decoding`, so tests can replay late frames.
#[derive(Default)]
pub struct FakeEngine {
    inner: Mutex<FakeEngineInner>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        let engine = Self::new();
        engine.inner.lock().fail_begin = Some(PlatformError::named(name));
        engine
    }

    pub fn emit(&self, text: Option<&str>, error: Option<PlatformError>) {
        let callback = self.inner.lock().callback.clone();
        if let Some(callback) = callback {
            callback(text, error.as_ref());
        }
    }

    pub fn emit_not_found(&self) {
        self.emit(None, Some(PlatformError::named("NotFoundException")));
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    pub fn begin_calls(&self) -> usize {
        self.inner.lock().begin_calls
    }

    pub fn end_calls(&self) -> usize {
        self.inner.lock().end_calls
    }
}

impl DecodeEngine for FakeEngine {
    fn begin_decoding(&self, _sink: Arc<dyn VideoSink>, on_frame: FrameCallback) -> Result<(), PlatformError> {
        let mut inner = self.inner.lock();
        inner.begin_calls += 1;
        if let Some(err) = inner.fail_begin.clone() {
            return Err(err);
        }
        inner.callback = Some(on_frame);
        inner.active = true;
        Ok(())
    }

    fn end_decoding(&self) {
        let mut inner = self.inner.lock();
        inner.end_calls += 1;
        inner.active = false;
    }
}

/// Delegate that records every notification.
#[derive(Default)]
pub struct RecordingDelegate {
    pub states: Mutex<Vec<ScanState>>,
    pub results: Mutex<Vec<ScanResult>>,
    pub errors: Mutex<Vec<ScanError>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<ScanState> {
        self.states.lock().clone()
    }

    pub fn result_texts(&self) -> Vec<String> {
        self.results.lock().iter().map(|r| r.text().to_string()).collect()
    }

    pub fn errors(&self) -> Vec<ScanError> {
        self.errors.lock().clone()
    }
}

impl ScanDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: ScanState) {
        self.states.lock().push(state);
    }

    fn on_result(&self, result: &ScanResult) {
        self.results.lock().push(result.clone());
    }

    fn on_error(&self, error: &ScanError) {
        self.errors.lock().push(error.clone());
    }
}
