//! Client-side state: auth, lists and tasks.
//!
//! # Design
//! Each slice is plain data plus transition functions that never perform IO.
//! Fetches are split into `begin_fetch` (apply the loading guard, issue a
//! `Ticket`) and `finish_fetch` (apply the parsed result for that ticket);
//! create/update/delete results are applied with `add`/`rename`/`merge`/
//! `remove` after the server has accepted the change. `Session` strings
//! these together with an `ApiClient` and a `Transport`; hosts that do their
//! own IO can call them directly.

mod auth;
mod fence;
mod list;
mod task;

pub use auth::AuthState;
pub use fence::Ticket;
pub use list::ListState;
pub use task::TaskState;

use crate::types::Credential;

/// The whole client state, owned by the host and passed around by reference.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub auth: AuthState,
    pub lists: ListState,
    pub tasks: TaskState,
}

impl Store {
    /// Initial state for a (re)started client, seeded from the persisted
    /// credential if there is one.
    pub fn new(credential: Option<Credential>) -> Self {
        Self {
            auth: AuthState::new(credential),
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Install a credential. Switching to a different credential also drops
    /// lists and tasks loaded for the previous one.
    pub fn sign_in(&mut self, credential: Credential) {
        if self.auth.credential.as_ref() != Some(&credential) {
            self.lists.reset();
            self.tasks.reset();
        }
        self.auth.sign_in(credential);
    }

    /// Back to the logged-out initial state. Responses still in flight are
    /// discarded when they arrive.
    pub fn reset(&mut self) {
        self.auth.sign_out();
        self.lists.reset();
        self.tasks.reset();
    }
}
