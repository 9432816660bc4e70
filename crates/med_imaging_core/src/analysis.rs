//! crates/med_imaging_core/src/analysis.rs
//!
//! Drives a single analysis request end to end: normalize the upload, call
//! the remote model with bounded retries on throttling, clean the returned
//! markdown and release the staged artifact on every exit path.

use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{AnalysisReport, NormalizedImage, UploadedImage};
use crate::normalize::{normalize, NormalizeError};
use crate::ports::{AnalysisError, VisionAnalysisService};
use crate::prompt::DIAGNOSTIC_PROMPT;
use crate::report::clean_report;

/// Retry budget for the remote call.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    /// Fixed pause between rate-limited attempts.
    pub retry_delay: Duration,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// The result of one request: the resized image for display plus either the
/// cleaned report text or the typed analysis failure. The caller decides how
/// a failure is rendered; see [`render_failure`].
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub image: NormalizedImage,
    pub result: Result<String, AnalysisError>,
}

impl AnalysisOutcome {
    /// Flattens the outcome into displayable data, rendering a failure as
    /// report text via [`render_failure`].
    pub fn into_report(self) -> AnalysisReport {
        let markdown_text = match &self.result {
            Ok(text) => text.clone(),
            Err(err) => render_failure(err),
        };
        AnalysisReport {
            markdown_text,
            image: self.image,
        }
    }
}

/// Calls the remote model, pausing and retrying on rate limits up to
/// `opts.max_retries` total attempts. Any non-throttling error is returned
/// immediately; cancellation interrupts both the call and the pauses.
pub async fn analyze_with_retry(
    service: &dyn VisionAnalysisService,
    prompt: &str,
    attachment: &Path,
    opts: &AnalysisOptions,
    cancel: &CancellationToken,
) -> Result<String, AnalysisError> {
    for attempt in 1..=opts.max_retries.max(1) {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let call = service.analyze_image(prompt, attachment);
        let result = tokio::select! {
            r = call => r,
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
        };

        match result {
            Ok(text) => return Ok(text),
            Err(AnalysisError::RateLimited) => {
                if attempt == opts.max_retries.max(1) {
                    warn!(attempt, "rate limited on final attempt, giving up");
                    return Err(AnalysisError::RetriesExhausted);
                }
                warn!(
                    attempt,
                    delay_secs = opts.retry_delay.as_secs(),
                    "rate limited, backing off before retrying"
                );
                tokio::select! {
                    _ = tokio::time::sleep(opts.retry_delay) => {}
                    _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
                }
            }
            Err(other) => return Err(other),
        }
    }
    Err(AnalysisError::RetriesExhausted)
}

/// Runs the full pipeline for one uploaded blob.
///
/// The staged temp artifact lives exactly as long as the remote call; it is
/// dropped before this function returns, success or failure.
pub async fn run_analysis(
    service: &dyn VisionAnalysisService,
    upload: &UploadedImage,
    opts: &AnalysisOptions,
    cancel: &CancellationToken,
) -> Result<AnalysisOutcome, NormalizeError> {
    let (image, artifact) = normalize(&upload.raw_bytes)?;
    info!(
        width = image.width,
        height = image.height,
        "image normalized, starting remote analysis"
    );

    let result = analyze_with_retry(service, DIAGNOSTIC_PROMPT, artifact.path(), opts, cancel)
        .await
        .map(|text| clean_report(&text));

    drop(artifact);
    Ok(AnalysisOutcome { image, result })
}

/// Renders a typed analysis failure as user-facing report text, so the
/// caller always has something displayable.
pub fn render_failure(err: &AnalysisError) -> String {
    match err {
        AnalysisError::RetriesExhausted | AnalysisError::RateLimited => {
            "Analysis failed after multiple attempts due to rate limiting. Please try again later."
                .to_string()
        }
        AnalysisError::Cancelled => "Analysis was cancelled before it completed.".to_string(),
        AnalysisError::Remote(msg) => format!("Analysis error: {msg}"),
    }
}
