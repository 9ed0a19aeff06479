//! Client-side data synchronization for the todo service.
//!
//! # Overview
//! Keeps the signed-in user, their lists and the tasks of one list in sync
//! with the remote REST API. The view layer dispatches operations and renders
//! from the `Store`; everything in between lives here.
//!
//! # Design
//! - `ApiClient` is stateless: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse` (host-does-IO).
//! - `Store` is plain data with pure transition functions, one slice each for
//!   auth, lists and tasks.
//! - `Session` drives one operation per call over a `Transport`, and owns the
//!   global 401 handling.
//! - Host services (credential persistence, navigation) are traits in `host`.

pub mod client;
pub mod config;
pub mod deadline;
pub mod error;
pub mod host;
pub mod http;
pub mod session;
pub mod store;
pub mod types;

pub use client::ApiClient;
pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use host::{
    CredentialStore, FileCredentialStore, HostError, MemoryCredentialStore, Navigator,
    NoopNavigator, SIGN_IN_PATH, TOKEN_KEY,
};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use session::Session;
pub use store::{AuthState, ListState, Store, TaskState, Ticket};
pub use types::{
    CreateList, CreateTask, Credential, List, ListId, SignIn, SignUp, Task, TaskId,
    TokenResponse, UpdateList, UpdateTask, User,
};
