//! In-process auth provider for tests and the offline demo.
//!
//! Keeps an account table in memory and publishes the signed-in identity
//! on a [`tokio::sync::watch`] channel, mirroring how a hosted provider
//! reports session changes.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use super::{AuthError, AuthProvider, Identity, Uid};

/// Default number of consecutive failed sign-ins before an email is locked.
const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Default minimum password length the provider accepts on sign-up.
const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Tunables for [`MemoryAuth`].
#[derive(Debug, Clone)]
pub struct MemoryAuthConfig {
    /// Failed sign-ins per email before `TooManyRequests`.
    pub max_failed_attempts: u32,
    /// Passwords shorter than this are `WeakPassword`.
    pub min_password_len: usize,
    /// Report unknown emails and wrong passwords both as
    /// `InvalidCredential`, so callers cannot tell which emails exist.
    pub enumeration_protection: bool,
}

impl Default for MemoryAuthConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            enumeration_protection: false,
        }
    }
}

struct Account {
    uid: Uid,
    password: String,
}

#[derive(Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    failures: HashMap<String, u32>,
    injected: Option<AuthError>,
    sign_out_fails: bool,
}

/// Account table plus the identity channel.
pub struct MemoryAuth {
    config: MemoryAuthConfig,
    accounts: Mutex<Accounts>,
    identity_tx: watch::Sender<Option<Identity>>,
    calls: Mutex<u32>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    /// Creates a provider with no accounts and nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MemoryAuthConfig::default())
    }

    /// Creates a provider with custom tunables.
    #[must_use]
    pub fn with_config(config: MemoryAuthConfig) -> Self {
        let (identity_tx, _) = watch::channel(None);
        Self {
            config,
            accounts: Mutex::new(Accounts::default()),
            identity_tx,
            calls: Mutex::new(0),
        }
    }

    /// Seed an account without signing it in.
    ///
    /// # Errors
    ///
    /// Returns the same errors as sign-up validation (`InvalidEmail`,
    /// `EmailInUse`, `WeakPassword`).
    pub fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < self.config.min_password_len {
            return Err(AuthError::WeakPassword);
        }
        let mut accounts = self.accounts.lock();
        if accounts.by_email.contains_key(&email) {
            return Err(AuthError::EmailInUse);
        }
        let uid = Uid::new(Uuid::now_v7().simple().to_string());
        accounts.by_email.insert(
            email.clone(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );
        drop(accounts);
        Ok(Identity { uid, email })
    }

    /// Make the next sign-in or sign-up fail with `error`.
    pub fn fail_next(&self, error: AuthError) {
        self.accounts.lock().injected = Some(error);
    }

    /// Make every sign-out report a remote failure (the session is still
    /// cleared).
    pub fn set_sign_out_fails(&self, fails: bool) {
        self.accounts.lock().sign_out_fails = fails;
    }

    /// Drop the current session as if it expired server-side.
    pub fn expire_session(&self) {
        tracing::info!("session expired");
        self.identity_tx.send_replace(None);
    }

    /// Identity currently signed in.
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.identity_tx.borrow().clone()
    }

    /// Number of sign-in and sign-up requests that reached the provider.
    #[must_use]
    pub fn request_count(&self) -> u32 {
        *self.calls.lock()
    }

    fn count_request(&self) {
        *self.calls.lock() += 1;
    }

    fn publish(&self, identity: &Identity) {
        self.identity_tx.send_replace(Some(identity.clone()));
    }

    fn try_sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        let mut accounts = self.accounts.lock();
        if let Some(err) = accounts.injected.take() {
            return Err(err);
        }
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        let failures = accounts.failures.get(&email).copied().unwrap_or(0);
        if failures >= self.config.max_failed_attempts {
            return Err(AuthError::TooManyRequests);
        }
        let outcome = match accounts.by_email.get(&email) {
            None => Err(AuthError::UserNotFound),
            Some(account) if account.password != password => Err(AuthError::WrongPassword),
            Some(account) => Ok(Identity {
                uid: account.uid.clone(),
                email: email.clone(),
            }),
        };
        match outcome {
            Ok(identity) => {
                accounts.failures.remove(&email);
                Ok(identity)
            }
            Err(err) => {
                *accounts.failures.entry(email).or_insert(0) += 1;
                if self.config.enumeration_protection {
                    Err(AuthError::InvalidCredential)
                } else {
                    Err(err)
                }
            }
        }
    }
}

impl AuthProvider for MemoryAuth {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        self.count_request();
        let identity = self.try_sign_in(email, password)?;
        tracing::debug!(uid = %identity.uid, "signed in");
        self.publish(&identity);
        Ok(identity)
    }

    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        self.count_request();
        if let Some(err) = self.accounts.lock().injected.take() {
            return Err(err);
        }
        let identity = self.register(email, password)?;
        tracing::debug!(uid = %identity.uid, "account created");
        self.publish(&identity);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.identity_tx.send_replace(None);
        if self.accounts.lock().sign_out_fails {
            return Err(AuthError::Unknown("sign-out request failed".into()));
        }
        Ok(())
    }

    fn identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity_tx.subscribe()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
