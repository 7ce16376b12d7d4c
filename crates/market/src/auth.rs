//! Auth provider contract.
//!
//! The application never sees how a user signed in (password, federated,
//! phone OTP); it only consumes the opaque identity the provider yields and
//! an auth-state subscription. Role checks are a pure predicate evaluated
//! before entering a protected operation.

use tokio::sync::watch;

use artvaani_core::{MarketError, MarketResult, Role, UserId, UserProfile};

/// The signed-in identity handed out by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: UserId,
    pub display_name: String,
    pub email: Option<String>,
}

/// Contract for the identity provider.
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;

    /// Subscribe to auth-state changes. The receiver holds the current state
    /// immediately.
    fn watch(&self) -> watch::Receiver<Option<AuthUser>>;
}

/// An explicit session holder.
///
/// Embedders (and tests) drive sign-in/sign-out directly; downstream
/// components observe through [`AuthProvider`].
#[derive(Debug)]
pub struct SessionAuth {
    state: watch::Sender<Option<AuthUser>>,
}

impl SessionAuth {
    /// Create a provider with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    /// Sign a user in, replacing any existing session.
    pub fn sign_in(&self, user: AuthUser) {
        self.state.send_replace(Some(user));
    }

    /// Sign the current user out.
    pub fn sign_out(&self) {
        self.state.send_replace(None);
    }
}

impl Default for SessionAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for SessionAuth {
    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }
}

/// Role guard: pass only when the profile's role matches.
///
/// # Errors
///
/// Returns `PermissionDenied` on mismatch.
pub fn authorize(profile: &UserProfile, required: Role) -> MarketResult<()> {
    if profile.role == required {
        Ok(())
    } else {
        Err(MarketError::PermissionDenied(format!(
            "requires {required} role"
        )))
    }
}
