//! Scan input for hosts without a camera.
//!
//! Lines given on the command line or stdin are treated as already decoded
//! codes and go through the same [`CodeDecoder`] a camera feed would, so
//! blank input and the debounce window behave the same way.

use std::convert::Infallible;
use std::time::Duration;

use modelsight_reference::{
    Capture, CodeDecoder, CodeDetector, DecodeError, DetectedCode, ScanPayload,
};

/// Reports [`Capture::Text`] as a QR code. Images need a real detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDetector;

impl CodeDetector for TextDetector {
    type Error = Infallible;

    async fn detect(&self, capture: &Capture) -> Result<Vec<DetectedCode>, Self::Error> {
        match capture {
            Capture::Text(text) => Ok(vec![DetectedCode::qr(text.clone())]),
            Capture::Frame { .. } | Capture::Still(_) => {
                tracing::debug!("no image decoder available, capture skipped");
                Ok(Vec::new())
            }
        }
    }
}

pub struct TextScanner {
    decoder: CodeDecoder<TextDetector>,
}

impl TextScanner {
    pub fn new(debounce: Duration) -> Self {
        Self {
            decoder: CodeDecoder::new(TextDetector).debounce(debounce),
        }
    }

    /// The payload for `line`, or `None` when it is blank or arrives inside
    /// the debounce window.
    pub async fn scan(&mut self, line: &str) -> Result<Option<ScanPayload>, DecodeError> {
        self.decoder.decode(&Capture::Text(line.to_string())).await
    }

    /// Forget the last emission so the next line is accepted right away.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }
}
