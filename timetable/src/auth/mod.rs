//! Authentication collaborator abstraction.
//!
//! Defines the [`AuthProvider`] trait the session layer signs users in
//! through. Concrete implementations include:
//! - [`memory::MemoryAuth`]: in-process account table for tests and the
//!   offline demo

pub mod memory;

use tokio::sync::watch;

pub use timetable_proto::{Identity, Uid};

/// Failure kinds reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No account is registered under the email.
    #[error("no user record for this email")]
    UserNotFound,
    /// The account exists but the password does not match.
    #[error("wrong password")]
    WrongPassword,
    /// The email address is not well formed.
    #[error("invalid email address")]
    InvalidEmail,
    /// Email/password pair rejected without saying which part was wrong.
    #[error("invalid credential")]
    InvalidCredential,
    /// Too many failed attempts; the account is temporarily locked.
    #[error("too many requests")]
    TooManyRequests,
    /// Sign-up with an email that already has an account.
    #[error("email already in use")]
    EmailInUse,
    /// Sign-up password rejected by the provider's strength rules.
    #[error("weak password")]
    WeakPassword,
    /// Anything else (network failure, provider outage).
    #[error("auth provider error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Stable error code, useful as a structured log field.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidEmail => "auth/invalid-email",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::EmailInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::Unknown(_) => "auth/unknown",
        }
    }
}

/// Async email/password authentication with an observable current identity.
///
/// # Invariant
///
/// The receiver returned by [`AuthProvider::identity`] is the only source of
/// truth for who is signed in. The results of `sign_in_with_password` and
/// `sign_up_with_password` are informational; callers react to the identity
/// channel instead.
pub trait AuthProvider: Send + Sync {
    /// Sign in an existing account.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Identity, AuthError>> + Send;

    /// Register a new account and sign it in.
    fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Identity, AuthError>> + Send;

    /// End the current session.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), AuthError>> + Send;

    /// Subscribe to identity changes. The receiver starts out holding the
    /// current identity (or `None`).
    fn identity(&self) -> watch::Receiver<Option<Identity>>;
}
