//! Debounced code decoding on top of an opaque detector capability.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::DecodeError;
use crate::payload::{Capture, CodeKind, DetectedCode, ScanPayload};

/// Minimum spacing between two emitted payloads.
///
/// A code held in front of the camera is seen on every frame; without this
/// window each frame would trigger a new resolve.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Capture/decode capability.
///
/// Implementations wrap whatever the platform offers (a camera SDK, an image
/// decoding library) and report every code they find.
pub trait CodeDetector: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect(
        &self,
        capture: &Capture,
    ) -> impl Future<Output = std::result::Result<Vec<DetectedCode>, Self::Error>> + Send;
}

/// Turns captures into at most one [`ScanPayload`] per debounce window.
pub struct CodeDecoder<D: CodeDetector> {
    detector:  D,
    debounce:  Duration,
    last_emit: Option<Instant>,
}

impl<D: CodeDetector> CodeDecoder<D> {
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            debounce: DEFAULT_DEBOUNCE,
            last_emit: None,
        }
    }

    #[must_use]
    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub async fn decode(&mut self, capture: &Capture) -> Result<Option<ScanPayload>, DecodeError> {
        self.decode_at(capture, Instant::now()).await
    }

    /// Decode `capture` as if it was taken at `now`.
    ///
    /// Captures inside the debounce window are skipped without consulting the
    /// detector. The window only starts when a payload is actually emitted.
    pub async fn decode_at(
        &mut self,
        capture: &Capture,
        now: Instant,
    ) -> Result<Option<ScanPayload>, DecodeError> {
        if self.in_window(now) {
            tracing::trace!("capture ignored inside debounce window");
            return Ok(None);
        }

        let codes = self
            .detector
            .detect(capture)
            .await
            .map_err(|e| DecodeError::Detector(Box::new(e)))?;

        let Some(text) = first_qr_value(codes) else {
            return Ok(None);
        };

        self.last_emit = Some(now);
        tracing::debug!(payload = %text, "decoded QR payload");
        Ok(Some(ScanPayload::new(text)))
    }

    /// Forget the last emission, e.g. after the user asked to scan again.
    pub fn reset(&mut self) {
        self.last_emit = None;
    }

    fn in_window(&self, now: Instant) -> bool {
        self.last_emit
            .is_some_and(|last| now.saturating_duration_since(last) < self.debounce)
    }
}

fn first_qr_value(codes: Vec<DetectedCode>) -> Option<String> {
    codes
        .into_iter()
        .filter(|c| c.kind == CodeKind::Qr)
        .map(|c| c.value.trim().to_string())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct DetectorError;

    impl std::fmt::Display for DetectorError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("camera unavailable")
        }
    }

    impl std::error::Error for DetectorError {}

    struct FixedDetector {
        codes: Mutex<Vec<DetectedCode>>,
        calls: AtomicUsize,
        fail:  bool,
    }

    impl FixedDetector {
        fn new(codes: Vec<DetectedCode>) -> Self {
            Self {
                codes: Mutex::new(codes),
                calls: AtomicUsize::new(0),
                fail:  false,
            }
        }
    }

    impl CodeDetector for FixedDetector {
        type Error = DetectorError;

        async fn detect(&self, _capture: &Capture) -> Result<Vec<DetectedCode>, Self::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DetectorError);
            }
            Ok(self.codes.lock().unwrap().clone())
        }
    }

    fn frame() -> Capture {
        Capture::Frame {
            width:  2,
            height: 2,
            luma:   vec![0; 4],
        }
    }

    #[tokio::test]
    async fn test_emits_first_qr_code() {
        let detector = FixedDetector::new(vec![
            DetectedCode {
                kind:  CodeKind::Other("ean13".into()),
                value: "4006381333931".into(),
            },
            DetectedCode::qr("  "),
            DetectedCode::qr(" https://example.com/model.glb "),
        ]);
        let mut decoder = CodeDecoder::new(detector);
        let payload = decoder.decode(&frame()).await.unwrap().unwrap();
        assert_eq!(payload.text, "https://example.com/model.glb");
    }

    #[tokio::test]
    async fn test_debounce_window() {
        let detector = FixedDetector::new(vec![DetectedCode::qr("https://example.com/a.glb")]);
        let mut decoder = CodeDecoder::new(detector);
        let t0 = Instant::now();

        assert!(decoder.decode_at(&frame(), t0).await.unwrap().is_some());
        assert!(
            decoder
                .decode_at(&frame(), t0 + Duration::from_millis(1999))
                .await
                .unwrap()
                .is_none()
        );
        // skipped captures never reach the detector
        assert_eq!(decoder.detector().calls.load(Ordering::SeqCst), 1);
        assert!(
            decoder
                .decode_at(&frame(), t0 + Duration::from_millis(2000))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_empty_capture_does_not_open_window() {
        let detector = FixedDetector::new(vec![]);
        let mut decoder = CodeDecoder::new(detector);
        let t0 = Instant::now();
        assert!(decoder.decode_at(&frame(), t0).await.unwrap().is_none());

        decoder
            .detector()
            .codes
            .lock()
            .unwrap()
            .push(DetectedCode::qr("https://example.com/a.glb"));
        assert!(
            decoder
                .decode_at(&frame(), t0 + Duration::from_millis(10))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_reset_clears_window() {
        let detector = FixedDetector::new(vec![DetectedCode::qr("https://example.com/a.glb")]);
        let mut decoder = CodeDecoder::new(detector).debounce(Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(decoder.decode_at(&frame(), t0).await.unwrap().is_some());
        decoder.reset();
        assert!(decoder.decode_at(&frame(), t0).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_detector_failure_is_wrapped() {
        let mut detector = FixedDetector::new(vec![]);
        detector.fail = true;
        let mut decoder = CodeDecoder::new(detector);
        let err = decoder
            .decode(&Capture::Still("/tmp/photo.jpg".into()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("camera unavailable"));
    }
}
