//! Pipeline orchestration
//!
//! This module provides the public API for livecheck: the stateful
//! per-session processor, a stateless batch entry point, and the sequential
//! frame loop that paces detection at a fixed cadence with an explicit
//! cancellation handle.
//!
//! Frames are processed strictly one at a time: frame N's full pipeline
//! completes before frame N+1 is requested from the source. All session
//! state is owned by the processor, so no locking is needed.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::detector::FrameAdapter;
use crate::encoder::ReportEncoder;
use crate::error::LivenessError;
use crate::session::LivenessSession;
use crate::types::{FrameInput, FrameReport, LivenessState};

/// Default frame cadence (~10 frames per second)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Stateful processor for one verification session.
///
/// Owns the session and the report encoder; call [`process`] once per
/// incoming frame.
///
/// [`process`]: LivenessProcessor::process
pub struct LivenessProcessor {
    session: LivenessSession,
    encoder: ReportEncoder,
}

impl Default for LivenessProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessProcessor {
    /// Create a processor with a fresh session
    pub fn new() -> Self {
        Self {
            session: LivenessSession::new(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Process one frame input and produce the published report
    pub fn process(&mut self, input: &FrameInput) -> FrameReport {
        let assessment = self.session.process(input.face.as_ref());
        self.encoder
            .encode(self.session.session_id(), input.observed_at, &assessment)
    }

    /// Process a single frame from its JSON representation
    pub fn process_json(&mut self, json: &str) -> Result<String, LivenessError> {
        let input: FrameInput = serde_json::from_str(json)
            .map_err(|e| LivenessError::ParseError(format!("Failed to parse frame: {}", e)))?;
        let report = self.process(&input);
        serde_json::to_string(&report).map_err(LivenessError::JsonError)
    }

    /// The underlying session state
    pub fn session(&self) -> &LivenessSession {
        &self.session
    }

    /// Discard all session state and start over
    pub fn reset(&mut self) {
        self.session.reset();
    }
}

/// Convert a JSON array of frame inputs to report JSON strings.
///
/// Stateless, one-shot entry point: a fresh session is created for the
/// batch and discarded afterwards.
///
/// # Example
/// ```ignore
/// let reports = frames_to_reports(frames_json)?;
/// ```
pub fn frames_to_reports(raw_json: &str) -> Result<Vec<String>, LivenessError> {
    let frames = FrameAdapter::parse_array(raw_json)?;
    let mut processor = LivenessProcessor::new();
    frames
        .iter()
        .map(|frame| {
            let report = processor.process(frame);
            serde_json::to_string(&report).map_err(LivenessError::JsonError)
        })
        .collect()
}

/// Blocking source of detector output, one call per frame.
///
/// `Ok(None)` ends the session cleanly (camera stream closed). An error is
/// terminal: the loop stops and surfaces it rather than spinning against an
/// unavailable detector.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<FrameInput>, LivenessError>;
}

/// Consumer of published reports (the rendering/UI collaborator)
pub trait AssessmentSink {
    fn publish(&mut self, report: &FrameReport) -> Result<(), LivenessError>;
}

/// Sink that writes each report as one JSON line
pub struct JsonLineSink<W: Write> {
    writer: W,
    flush_each: bool,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W, flush_each: bool) -> Self {
        Self { writer, flush_each }
    }

    /// Consume the sink and return the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> AssessmentSink for JsonLineSink<W> {
    fn publish(&mut self, report: &FrameReport) -> Result<(), LivenessError> {
        let json = serde_json::to_string(report)?;
        writeln!(self.writer, "{}", json)
            .map_err(|e| LivenessError::PublishError(e.to_string()))?;
        if self.flush_each {
            self.writer
                .flush()
                .map_err(|e| LivenessError::PublishError(e.to_string()))?;
        }
        Ok(())
    }
}

/// Shared cancellation handle for a running session loop.
///
/// Cancelling stops the loop before its next tick; no report is published
/// after cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to stop
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of a completed (or cancelled) session loop
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Frames processed before the loop ended
    pub frames_processed: u64,
    /// Cumulative blinks observed
    pub blink_count: u32,
    /// Whether any frame reached the verified state
    pub verified: bool,
    /// Whether the loop ended via cancellation
    pub cancelled: bool,
}

/// Drive a full verification session at a fixed cadence.
///
/// Pulls frames from `source` one at a time, runs the pipeline, publishes
/// each report to `sink`, and sleeps out the remainder of `interval` before
/// the next frame. Processing overruns simply skip the sleep; ticks are
/// never run concurrently. Detector errors are terminal and surfaced to the
/// caller.
pub fn run_session<S, K>(
    source: &mut S,
    sink: &mut K,
    interval: Duration,
    handle: &CancelHandle,
) -> Result<SessionSummary, LivenessError>
where
    S: FrameSource,
    K: AssessmentSink,
{
    let mut processor = LivenessProcessor::new();
    let mut verified = false;

    loop {
        if handle.is_cancelled() {
            info!("session loop cancelled");
            return Ok(summary(&processor, verified, true));
        }

        let tick_start = Instant::now();

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "detector failed; stopping session");
                return Err(e);
            }
        };

        let report = processor.process(&frame);
        verified |= report.state == LivenessState::Verified;

        // Cancellation between processing and publishing suppresses the
        // report: nothing is published after cancel().
        if handle.is_cancelled() {
            info!("session loop cancelled");
            return Ok(summary(&processor, verified, true));
        }

        sink.publish(&report)?;

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }

    Ok(summary(&processor, verified, false))
}

fn summary(processor: &LivenessProcessor, verified: bool, cancelled: bool) -> SessionSummary {
    SessionSummary {
        frames_processed: processor.session().frame_seq(),
        blink_count: processor.session().blink_count(),
        verified,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2D;
    use crate::types::{Expressions, FaceDetection};
    use pretty_assertions::assert_eq;

    fn eye_with_ear(target: f64) -> Vec<Point2D> {
        let half_gap = target * 4.0 / 3.0;
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, half_gap),
            Point2D::new(3.0, half_gap),
            Point2D::new(4.0, 0.0),
            Point2D::new(3.0, -half_gap),
            Point2D::new(1.0, -half_gap),
        ]
    }

    fn face_frame(ear: f64, nose_x: f64) -> FrameInput {
        FrameInput::with_face(FaceDetection {
            left_eye: eye_with_ear(ear),
            right_eye: eye_with_ear(ear),
            nose: Some(Point2D::new(nose_x, 100.0)),
            expressions: Expressions {
                happy: 0.0,
                surprised: 0.0,
                neutral: 0.9,
            },
        })
    }

    struct VecSource {
        frames: Vec<Result<Option<FrameInput>, LivenessError>>,
    }

    impl VecSource {
        fn new(frames: Vec<FrameInput>) -> Self {
            let mut frames: Vec<_> = frames.into_iter().map(|f| Ok(Some(f))).collect();
            frames.push(Ok(None));
            frames.reverse();
            Self { frames }
        }
    }

    impl FrameSource for VecSource {
        fn next_frame(&mut self) -> Result<Option<FrameInput>, LivenessError> {
            self.frames.pop().unwrap_or(Ok(None))
        }
    }

    struct CollectSink {
        reports: Vec<FrameReport>,
    }

    impl CollectSink {
        fn new() -> Self {
            Self {
                reports: Vec::new(),
            }
        }
    }

    impl AssessmentSink for CollectSink {
        fn publish(&mut self, report: &FrameReport) -> Result<(), LivenessError> {
            self.reports.push(report.clone());
            Ok(())
        }
    }

    #[test]
    fn test_processor_end_to_end_json() {
        let mut processor = LivenessProcessor::new();
        let json = serde_json::to_string(&face_frame(0.3, 100.0)).unwrap();
        let report_json = processor.process_json(&json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report_json).unwrap();
        assert_eq!(value["face_detected"], true);
        assert_eq!(value["provenance"]["frame_seq"], 1);
        assert!(value["debug"]["current_ear"].as_f64().unwrap() > 0.29);
    }

    #[test]
    fn test_processor_no_face_json() {
        let mut processor = LivenessProcessor::new();
        let report_json = processor.process_json(r#"{"face": null}"#).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report_json).unwrap();
        assert_eq!(value["face_detected"], false);
        assert_eq!(value["assessment"]["score"], 0.0);
        assert_eq!(value["state"], "searching");
    }

    #[test]
    fn test_frames_to_reports_batch() {
        let frames = vec![
            face_frame(0.30, 100.0),
            face_frame(0.32, 101.0),
            face_frame(0.05, 100.0),
        ];
        let json = serde_json::to_string(&frames).unwrap();
        let reports = frames_to_reports(&json).unwrap();
        assert_eq!(reports.len(), 3);

        let last: serde_json::Value = serde_json::from_str(&reports[2]).unwrap();
        assert_eq!(last["assessment"]["blink_count"], 1);
    }

    #[test]
    fn test_frames_to_reports_invalid_json() {
        assert!(frames_to_reports("not valid json").is_err());
    }

    #[test]
    fn test_run_session_processes_all_frames() {
        let mut source = VecSource::new(vec![
            face_frame(0.30, 100.0),
            FrameInput::no_face(),
            face_frame(0.31, 101.0),
        ]);
        let mut sink = CollectSink::new();
        let handle = CancelHandle::new();

        let summary =
            run_session(&mut source, &mut sink, Duration::ZERO, &handle).unwrap();

        assert_eq!(summary.frames_processed, 3);
        assert!(!summary.cancelled);
        assert_eq!(sink.reports.len(), 3);
        assert!(!sink.reports[1].face_detected);
    }

    #[test]
    fn test_run_session_cancellation_publishes_nothing_further() {
        struct CancellingSource {
            handle: CancelHandle,
            served: u32,
        }

        impl FrameSource for CancellingSource {
            fn next_frame(&mut self) -> Result<Option<FrameInput>, LivenessError> {
                self.served += 1;
                if self.served == 2 {
                    // Cancellation lands while this frame is in flight
                    self.handle.cancel();
                }
                Ok(Some(FrameInput::no_face()))
            }
        }

        let handle = CancelHandle::new();
        let mut source = CancellingSource {
            handle: handle.clone(),
            served: 0,
        };
        let mut sink = CollectSink::new();

        let summary =
            run_session(&mut source, &mut sink, Duration::ZERO, &handle).unwrap();

        assert!(summary.cancelled);
        // Frame 2 was processed but its report was suppressed
        assert_eq!(summary.frames_processed, 2);
        assert_eq!(sink.reports.len(), 1);
    }

    #[test]
    fn test_run_session_detector_failure_is_terminal() {
        struct FailingSource {
            served: u32,
        }

        impl FrameSource for FailingSource {
            fn next_frame(&mut self) -> Result<Option<FrameInput>, LivenessError> {
                self.served += 1;
                if self.served > 2 {
                    Err(LivenessError::DetectorUnavailable(
                        "model not loaded".to_string(),
                    ))
                } else {
                    Ok(Some(FrameInput::no_face()))
                }
            }
        }

        let mut source = FailingSource { served: 0 };
        let mut sink = CollectSink::new();
        let handle = CancelHandle::new();

        let err = run_session(&mut source, &mut sink, Duration::ZERO, &handle).unwrap_err();
        assert!(matches!(err, LivenessError::DetectorUnavailable(_)));
        // The two good frames were still published before the failure
        assert_eq!(sink.reports.len(), 2);
    }

    #[test]
    fn test_json_line_sink_writes_ndjson() {
        let mut processor = LivenessProcessor::new();
        let report = processor.process(&FrameInput::no_face());

        let mut sink = JsonLineSink::new(Vec::new(), false);
        sink.publish(&report).unwrap();
        sink.publish(&report).unwrap();

        let buffer = sink.into_inner();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 2);
        for line in text.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["face_detected"], false);
        }
    }
}
