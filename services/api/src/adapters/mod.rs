pub mod credentials;
pub mod mailer;
pub mod printer;

pub use credentials::InMemoryCredentialStore;
pub use mailer::LogMailer;
pub use printer::LogDispatcher;
