pub mod analysis;
pub mod auth;
pub mod domain;
pub mod normalize;
pub mod ports;
pub mod prompt;
pub mod report;
pub mod session;

pub use analysis::{analyze_with_retry, render_failure, run_analysis, AnalysisOptions, AnalysisOutcome};
pub use domain::{AnalysisReport, NormalizedImage, UploadedImage, User, UserCredentials, DISPLAY_WIDTH};
pub use normalize::{normalize, NormalizeError, ScopedArtifact};
pub use ports::{AnalysisError, CredentialError, CredentialStore, VisionAnalysisService};
pub use session::Session;
