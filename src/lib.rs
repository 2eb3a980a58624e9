//! livecheck - On-device liveness-detection engine
//!
//! livecheck decides whether the subject in front of a camera is a live,
//! present human rather than a photo or paused video. It consumes per-frame
//! facial landmark and expression measurements from an external detector and
//! runs a deterministic pipeline: EAR computation → rolling-baseline update →
//! blink edge detection → movement estimation → fused liveness score with
//! user guidance.
//!
//! The camera, the landmark detector, and the UI are external collaborators;
//! this crate owns only the signal-processing and decision pipeline.
//!
//! Threat model: casual spoofs (static photo, paused video) via blink and
//! micro-movement evidence. Sophisticated 3D masks and deep-fake video are
//! out of scope.

pub mod baseline;
pub mod blink;
pub mod detector;
pub mod ear;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod movement;
pub mod pipeline;
pub mod scorer;
pub mod session;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::LivenessError;
pub use pipeline::{
    frames_to_reports, run_session, AssessmentSink, CancelHandle, FrameSource,
    JsonLineSink, LivenessProcessor, SessionSummary,
};
pub use session::LivenessSession;
pub use types::{
    EyeState, FaceDetection, FrameAssessment, FrameInput, FrameReport, LivenessAssessment,
    LivenessState,
};

/// Engine version embedded in all published reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for published reports
pub const PRODUCER_NAME: &str = "livecheck";
