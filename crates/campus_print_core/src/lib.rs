pub mod auth;
pub mod domain;
pub mod jobs;
pub mod ports;
pub mod pricing;
pub mod uploads;
pub mod validation;

pub use auth::{AuthError, AuthSessionManager};
pub use domain::{
    AssetState, AuthSession, AuthState, ColorMode, JobStatus, Orientation, PrintConfiguration,
    PrintJob, SessionToken, Sides, UploadedAsset,
};
pub use jobs::{JobError, JobQueueManager, JobStats};
pub use ports::{CredentialStore, OtpMailer, PortError, PortResult, PrintDispatcher};
pub use pricing::PricingError;
pub use uploads::{NewUpload, SubmitOutcome, UploadError, UploadRegistry};
pub use validation::AssetRejection;
