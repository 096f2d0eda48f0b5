//! Session manager: sign-in, sign-up, sign-out and page-guard navigation.
//!
//! The auth collaborator's identity channel is the only source of truth for
//! who is signed in. [`SessionManager::sign_in`] and
//! [`SessionManager::sign_up`] only report failures; success shows up later
//! as an identity notification fed to
//! [`SessionManager::handle_identity_change`].

use std::sync::Arc;

use crate::auth::{AuthError, AuthProvider, Identity};

/// Default minimum sign-up password length checked before any request.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Which top-level view the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Email/password sign-in form.
    #[default]
    Login,
    /// Account creation form.
    Signup,
    /// The task board.
    Board,
}

/// Authentication state machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nobody is signed in.
    #[default]
    SignedOut,
    /// A sign-in or sign-up request is in flight.
    SigningIn,
    /// The collaborator reported an identity.
    SignedIn(Identity),
}

/// State of the login/signup submit button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitControl {
    /// Whether the button ignores presses.
    pub disabled: bool,
    /// Button text.
    pub label: &'static str,
}

impl SubmitControl {
    const fn idle(view: View) -> Self {
        Self {
            disabled: false,
            label: match view {
                View::Signup => "Create Account",
                View::Login | View::Board => "Sign In",
            },
        }
    }

    const fn busy(view: View) -> Self {
        Self {
            disabled: true,
            label: match view {
                View::Signup => "Creating account...",
                View::Login | View::Board => "Signing in...",
            },
        }
    }
}

/// Where the front-end should go after an identity notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Replace the current view.
    Redirect(View),
    /// Stay on the board and make it visible.
    RevealBoard,
}

/// Result of feeding one identity notification to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentityTransition {
    /// Hide the initial loading indicator. True for the first notification only.
    pub hide_loading: bool,
    /// Navigation to perform, if any.
    pub navigation: Option<Navigation>,
}

/// Input rejected before reaching the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Email or password empty after trimming.
    #[error("missing fields")]
    MissingFields,
    /// Sign-up password shorter than the configured minimum.
    #[error("password shorter than {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length, in characters.
        min: usize,
    },
}

/// Sign-in failures as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignInError {
    /// The account exists and the password did not match.
    #[error("wrong password")]
    WrongPassword,
    /// The provider would not say which part was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// No account under that email.
    #[error("account not found")]
    AccountNotFound,
    /// Malformed email.
    #[error("invalid email")]
    InvalidEmail,
    /// Locked out after too many attempts.
    #[error("rate limited")]
    RateLimited,
    /// Anything else.
    #[error("sign-in failed: {0}")]
    Unknown(String),
}

impl From<AuthError> for SignInError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::WrongPassword => Self::WrongPassword,
            AuthError::InvalidCredential => Self::InvalidCredentials,
            AuthError::UserNotFound => Self::AccountNotFound,
            AuthError::InvalidEmail => Self::InvalidEmail,
            AuthError::TooManyRequests => Self::RateLimited,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl SignInError {
    /// Text shown under the login form.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::WrongPassword => "Incorrect password",
            Self::InvalidCredentials => "Invalid email or password",
            Self::AccountNotFound => "No account found with this email",
            Self::InvalidEmail => "Invalid email address",
            Self::RateLimited => "Too many attempts. Please try again later",
            Self::Unknown(_) => "Login failed. Please try again.",
        }
    }
}

/// Sign-up failures as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignUpError {
    /// The email already has an account.
    #[error("email in use")]
    EmailInUse,
    /// Malformed email.
    #[error("invalid email")]
    InvalidEmail,
    /// The provider rejected the password.
    #[error("weak password")]
    WeakPassword,
    /// Anything else.
    #[error("sign-up failed: {0}")]
    Unknown(String),
}

impl From<AuthError> for SignUpError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailInUse => Self::EmailInUse,
            AuthError::InvalidEmail => Self::InvalidEmail,
            AuthError::WeakPassword => Self::WeakPassword,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl SignUpError {
    /// Text shown under the signup form.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::EmailInUse => "An account with this email already exists",
            Self::InvalidEmail => "Invalid email address",
            Self::WeakPassword => "Password is too weak",
            Self::Unknown(_) => "Signup failed. Please try again.",
        }
    }
}

/// Everything [`SessionManager::sign_in`] and [`SessionManager::sign_up`]
/// can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Rejected locally; the collaborator was not called.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The collaborator rejected a sign-in.
    #[error(transparent)]
    SignIn(#[from] SignInError),
    /// The collaborator rejected a sign-up.
    #[error(transparent)]
    SignUp(#[from] SignUpError),
}

impl SessionError {
    /// Text shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(ValidationError::MissingFields) => "Please fill in all fields".into(),
            Self::Validation(ValidationError::PasswordTooShort { min }) => {
                format!("Password must be at least {min} characters")
            }
            Self::SignIn(e) => e.user_message().into(),
            Self::SignUp(e) => e.user_message().into(),
        }
    }
}

/// Session tunables.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum sign-up password length, in characters.
    pub min_password_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
        }
    }
}

/// Drives authentication and decides which view is shown.
pub struct SessionManager<A: AuthProvider> {
    auth: Arc<A>,
    config: SessionConfig,
    state: SessionState,
    view: View,
    loading_visible: bool,
    submit: SubmitControl,
}

impl<A: AuthProvider> SessionManager<A> {
    /// Creates a session starting on `view` with the loading indicator shown.
    #[must_use]
    pub const fn new(auth: Arc<A>, config: SessionConfig, view: View) -> Self {
        Self {
            auth,
            config,
            state: SessionState::SignedOut,
            view,
            loading_visible: true,
            submit: SubmitControl::idle(view),
        }
    }

    /// Current FSM state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Signed-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    /// Current view.
    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    /// Whether the page-load indicator is still showing.
    #[must_use]
    pub const fn loading_visible(&self) -> bool {
        self.loading_visible
    }

    /// Submit button state for the current form.
    #[must_use]
    pub const fn submit_control(&self) -> SubmitControl {
        self.submit
    }

    /// Shared handle to the auth collaborator.
    #[must_use]
    pub const fn auth(&self) -> &Arc<A> {
        &self.auth
    }

    /// Switch to the login form. Ignored on the board.
    pub fn show_login(&mut self) {
        if self.view != View::Board {
            self.view = View::Login;
            self.submit = SubmitControl::idle(self.view);
        }
    }

    /// Switch to the signup form. Ignored on the board.
    pub fn show_signup(&mut self) {
        if self.view != View::Board {
            self.view = View::Signup;
            self.submit = SubmitControl::idle(self.view);
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// [`SessionError::Validation`] if either field is empty after trimming
    /// (no request is made), otherwise [`SessionError::SignIn`] when the
    /// collaborator refuses.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), SessionError> {
        self.submit = SubmitControl::busy(self.view);
        let result = self.try_sign_in(email.trim(), password.trim()).await;
        self.submit = SubmitControl::idle(self.view);
        result
    }

    async fn try_sign_in(&mut self, email: &str, password: &str) -> Result<(), SessionError> {
        if email.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }
        let previous = self.begin_request();
        match self.auth.sign_in_with_password(email, password).await {
            Ok(identity) => {
                tracing::info!(uid = %identity.uid, "sign-in accepted");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(code = err.code(), "sign-in rejected");
                self.end_failed_request(previous);
                Err(SignInError::from(err).into())
            }
        }
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// [`SessionError::Validation`] for empty fields or a password shorter
    /// than the configured minimum (no request is made), otherwise
    /// [`SessionError::SignUp`] when the collaborator refuses.
    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<(), SessionError> {
        self.submit = SubmitControl::busy(self.view);
        let result = self.try_sign_up(email.trim(), password.trim()).await;
        self.submit = SubmitControl::idle(self.view);
        result
    }

    async fn try_sign_up(&mut self, email: &str, password: &str) -> Result<(), SessionError> {
        if email.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }
        let min = self.config.min_password_len;
        if password.chars().count() < min {
            return Err(ValidationError::PasswordTooShort { min }.into());
        }
        let previous = self.begin_request();
        match self.auth.sign_up_with_password(email, password).await {
            Ok(identity) => {
                tracing::info!(uid = %identity.uid, "account created");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(code = err.code(), "sign-up rejected");
                self.end_failed_request(previous);
                Err(SignUpError::from(err).into())
            }
        }
    }

    fn begin_request(&mut self) -> SessionState {
        let previous = self.state.clone();
        if previous == SessionState::SignedOut {
            self.state = SessionState::SigningIn;
        }
        previous
    }

    fn end_failed_request(&mut self, previous: SessionState) {
        if self.state == SessionState::SigningIn {
            self.state = previous;
        }
    }

    /// End the session. A remote failure is logged, never surfaced.
    pub async fn sign_out(&mut self) {
        if let Err(err) = self.auth.sign_out().await {
            tracing::warn!(code = err.code(), error = %err, "sign-out failed");
        }
    }

    /// Apply an identity notification from the collaborator.
    pub fn handle_identity_change(&mut self, identity: Option<Identity>) -> IdentityTransition {
        let hide_loading = std::mem::replace(&mut self.loading_visible, false);
        let navigation = match (&identity, self.view) {
            (Some(_), View::Login | View::Signup) => Some(Navigation::Redirect(View::Board)),
            (Some(_), View::Board) => Some(Navigation::RevealBoard),
            (None, View::Board) => Some(Navigation::Redirect(View::Login)),
            (None, _) => None,
        };
        match identity {
            Some(identity) => {
                tracing::debug!(uid = %identity.uid, "identity established");
                self.state = SessionState::SignedIn(identity);
            }
            None => {
                if matches!(self.state, SessionState::SignedIn(_)) {
                    tracing::debug!("identity cleared");
                }
                self.state = SessionState::SignedOut;
            }
        }
        if let Some(Navigation::Redirect(view)) = navigation {
            self.view = view;
            self.submit = SubmitControl::idle(view);
        }
        IdentityTransition {
            hide_loading,
            navigation,
        }
    }
}
