use tracing::debug;

use crate::error::ApiError;
use crate::store::fence::{Fence, Ticket};
use crate::types::{Credential, User};

/// Credential, cached user profile and the user-fetch loading flag.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub credential: Option<Credential>,
    pub user: Option<User>,
    pub is_loading: bool,
    fence: Fence,
}

impl AuthState {
    pub fn new(credential: Option<Credential>) -> Self {
        Self {
            credential,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Start a user fetch unless one is outstanding, a user is already cached
    /// (both bypassed by `force`) or there is no credential to fetch with.
    pub fn begin_fetch_user(&mut self, force: bool) -> Option<Ticket> {
        if !force && (self.is_loading || self.user.is_some()) {
            return None;
        }
        if self.credential.is_none() {
            return None;
        }
        self.is_loading = true;
        Some(self.fence.issue())
    }

    pub fn finish_fetch_user(
        &mut self,
        ticket: Ticket,
        result: Result<User, ApiError>,
    ) -> Result<(), ApiError> {
        let current = self.fence.is_current(ticket);
        if current {
            self.is_loading = false;
        }
        let user = result?;
        if current {
            self.user = Some(user);
        } else {
            debug!("discarding stale user response");
        }
        Ok(())
    }

    /// Install a fresh credential. A cached user from a previous credential is
    /// dropped so the next fetch loads the right profile.
    pub fn sign_in(&mut self, credential: Credential) {
        if self.credential.as_ref() != Some(&credential) {
            self.user = None;
        }
        self.credential = Some(credential);
    }

    pub fn sign_out(&mut self) {
        self.credential = None;
        self.user = None;
        self.is_loading = false;
        self.fence.invalidate();
    }
}
