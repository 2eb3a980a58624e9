//! Detector input adaptation
//!
//! The external landmark detector is a black box that, once per frame,
//! either reports nothing or a detection record. This module parses those
//! records off the wire (NDJSON or a JSON array) and validates them against
//! the input contract for the explicit validation surface.

use serde::Serialize;

use crate::error::LivenessError;
use crate::types::FrameInput;

/// Adapter for parsing frame inputs from the detector boundary
pub struct FrameAdapter;

impl FrameAdapter {
    /// Parse a JSON string containing an array of frame inputs
    pub fn parse_array(json: &str) -> Result<Vec<FrameInput>, LivenessError> {
        let frames: Vec<FrameInput> = serde_json::from_str(json)?;
        Ok(frames)
    }

    /// Parse NDJSON (newline-delimited JSON) containing frame inputs
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<FrameInput>, LivenessError> {
        let mut frames = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<FrameInput>(trimmed) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    return Err(LivenessError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(frames)
    }

    /// Validate a batch of frames, returning one entry per invalid frame.
    ///
    /// No-face frames are always valid; face frames are checked against the
    /// landmark and expression contract. The pipeline itself absorbs
    /// malformed frames, so this is purely a diagnostic surface.
    pub fn validate_frames(frames: &[FrameInput]) -> Vec<ValidationFailure> {
        frames
            .iter()
            .enumerate()
            .filter_map(|(index, frame)| {
                let face = frame.face.as_ref()?;
                face.validate().err().map(|error| ValidationFailure {
                    index,
                    error,
                })
            })
            .collect()
    }
}

/// One frame that failed contract validation
#[derive(Debug, Clone, Serialize)]
pub struct ValidationFailure {
    /// Index of the frame within the batch
    pub index: usize,
    /// Human-readable description of the violation
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FACE_FRAME: &str = r#"{
        "face": {
            "left_eye": [
                {"x": 0.0, "y": 0.0}, {"x": 1.0, "y": 1.0}, {"x": 2.0, "y": 1.0},
                {"x": 3.0, "y": 0.0}, {"x": 2.0, "y": -1.0}, {"x": 1.0, "y": -1.0}
            ],
            "right_eye": [
                {"x": 5.0, "y": 0.0}, {"x": 6.0, "y": 1.0}, {"x": 7.0, "y": 1.0},
                {"x": 8.0, "y": 0.0}, {"x": 7.0, "y": -1.0}, {"x": 6.0, "y": -1.0}
            ],
            "nose": {"x": 4.0, "y": 2.0},
            "expressions": {"happy": 0.1, "surprised": 0.0, "neutral": 0.8}
        }
    }"#;

    #[test]
    fn test_parse_ndjson() {
        let ndjson = format!(
            "{}\n\n{}\n{}\n",
            FACE_FRAME.replace('\n', " "),
            r#"{"face": null}"#,
            FACE_FRAME.replace('\n', " "),
        );
        let frames = FrameAdapter::parse_ndjson(&ndjson).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[0].face.is_some());
        assert!(frames[1].face.is_none());
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let ndjson = format!("{}\nnot json\n", r#"{"face": null}"#);
        let err = FrameAdapter::parse_ndjson(&ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let json = format!("[{}, {}]", FACE_FRAME, r#"{"face": null}"#);
        let frames = FrameAdapter::parse_array(&json).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_validate_flags_malformed_face() {
        let bad = r#"{"face": {"left_eye": [{"x": 0.0, "y": 0.0}], "right_eye": [], "nose": null}}"#;
        let ndjson = format!("{}\n{}\n", r#"{"face": null}"#, bad);
        let frames = FrameAdapter::parse_ndjson(&ndjson).unwrap();
        let failures = FrameAdapter::validate_frames(&frames);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert!(failures[0].error.contains("left eye"));
    }
}
