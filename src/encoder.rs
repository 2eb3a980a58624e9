//! Report encoding
//!
//! This module wraps a frame assessment in the payload published to the
//! rendering/UI collaborator: producer and provenance metadata around the
//! assessment and its debug signals. All required fields are always present.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::LivenessError;
use crate::types::{FrameAssessment, FrameReport, ReportProducer, ReportProvenance};
use crate::{ENGINE_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder for per-frame report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Wrap an assessment in a full report payload
    pub fn encode(
        &self,
        session_id: Uuid,
        observed_at: Option<DateTime<Utc>>,
        assessment: &FrameAssessment,
    ) -> FrameReport {
        let computed_at = Utc::now();
        let observed_at = observed_at.unwrap_or(computed_at);

        FrameReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: ReportProvenance {
                session_id: session_id.to_string(),
                frame_seq: assessment.frame_seq,
                observed_at_utc: observed_at.to_rfc3339(),
                computed_at_utc: computed_at.to_rfc3339(),
            },
            face_detected: assessment.face_detected,
            state: assessment.state,
            assessment: assessment.assessment.clone(),
            debug: assessment.debug,
        }
    }

    /// Encode to a JSON string
    pub fn encode_to_json(
        &self,
        session_id: Uuid,
        observed_at: Option<DateTime<Utc>>,
        assessment: &FrameAssessment,
    ) -> Result<String, LivenessError> {
        let report = self.encode(session_id, observed_at, assessment);
        serde_json::to_string(&report).map_err(LivenessError::JsonError)
    }
}
