//! crates/med_imaging_core/src/session.rs
//!
//! The per-visitor session state machine. An explicit value, passed in and
//! out of operations - there is no ambient session global anywhere.

use crate::ports::{CredentialError, CredentialStore};

/// The three reachable session states. Authenticated and guest are mutually
/// exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        username: String,
    },
    Guest,
}

impl Session {
    /// Attempts the `Anonymous -> Authenticated` transition. On a failed
    /// verification the state is left untouched and the credential error is
    /// surfaced to the caller.
    pub async fn login(
        &mut self,
        store: &dyn CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<(), CredentialError> {
        crate::auth::verify(store, username, password).await?;
        *self = Session::Authenticated {
            username: username.to_string(),
        };
        Ok(())
    }

    /// Unconditional `-> Guest` transition.
    pub fn continue_as_guest(&mut self) {
        *self = Session::Guest;
    }

    /// Clears identity and returns to the initial state.
    pub fn logout(&mut self) {
        *self = Session::Anonymous;
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Session::Guest)
    }

    pub fn current_username(&self) -> Option<&str> {
        match self {
            Session::Authenticated { username } => Some(username),
            _ => None,
        }
    }

    /// The analysis pipeline is reachable iff the visitor is logged in or
    /// has chosen to continue as a guest.
    pub fn can_analyze(&self) -> bool {
        self.is_authenticated() || self.is_guest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use async_trait::async_trait;

    /// A store that knows exactly one user: alice / pw1.
    struct SingleUserStore;

    #[async_trait]
    impl CredentialStore for SingleUserStore {
        async fn insert_user(&self, _: &str, _: &str) -> Result<(), CredentialError> {
            Err(CredentialError::AlreadyExists)
        }

        async fn fetch_password_hash(&self, username: &str) -> Result<String, CredentialError> {
            if username == "alice" {
                Ok(hash_password("pw1"))
            } else {
                Err(CredentialError::NotFound)
            }
        }
    }

    #[tokio::test]
    async fn successful_login_reaches_authenticated() {
        let mut session = Session::default();
        assert!(!session.can_analyze());

        session.login(&SingleUserStore, "alice", "pw1").await.unwrap();
        assert!(session.is_authenticated());
        assert!(!session.is_guest());
        assert_eq!(session.current_username(), Some("alice"));
        assert!(session.can_analyze());
    }

    #[tokio::test]
    async fn failed_login_leaves_state_untouched() {
        let mut session = Session::default();
        let err = session
            .login(&SingleUserStore, "alice", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err, CredentialError::WrongPassword);
        assert_eq!(session, Session::Anonymous);
        assert!(!session.can_analyze());
    }

    #[tokio::test]
    async fn guest_and_logout_transitions() {
        let mut session = Session::default();
        session.continue_as_guest();
        assert!(session.is_guest());
        assert!(!session.is_authenticated());
        assert!(session.can_analyze());
        assert_eq!(session.current_username(), None);

        session.logout();
        assert_eq!(session, Session::Anonymous);

        // Logout from authenticated clears identity too.
        session.login(&SingleUserStore, "alice", "pw1").await.unwrap();
        session.logout();
        assert_eq!(session.current_username(), None);
        assert!(!session.can_analyze());
    }
}
