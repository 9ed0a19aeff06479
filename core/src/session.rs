//! One-call-per-operation driver over the store.
//!
//! # Design
//! Every operation is one turn: check the slice's guard, build the request,
//! send it through the `Transport`, parse the response, apply the result to
//! the store. `&mut self` on every operation means two operations can never
//! interleave on the same store.
//!
//! All traffic goes through `send`, which attaches the bearer credential and
//! reacts to a 401 by dropping the session (persisted credential, store)
//! and steering the host to the sign-in view. The operation that hit the
//! 401 still gets `ApiError::Unauthorized` back.

use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::host::{CredentialStore, Navigator, SIGN_IN_PATH};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::store::Store;
use crate::types::{
    CreateList, CreateTask, Credential, ListId, SignIn, SignUp, TaskId, UpdateList, UpdateTask,
};

pub struct Session<T, C, N> {
    client: ApiClient,
    store: Store,
    transport: T,
    credentials: C,
    navigator: N,
}

impl<T, N> Session<T, Box<dyn CredentialStore>, N>
where
    T: Transport,
    N: Navigator,
{
    pub fn from_config(config: &Config, transport: T, navigator: N) -> Self {
        Session::new(config.client(), transport, config.credential_store(), navigator)
    }
}

impl<T, C, N> Session<T, C, N>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    /// Start a session from whatever credential the host persisted earlier.
    /// An unreadable credential store starts the session logged out.
    pub fn new(client: ApiClient, transport: T, credentials: C, navigator: N) -> Self {
        let credential = credentials.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not read persisted credential");
            None
        });
        Self {
            client,
            store: Store::new(credential),
            transport,
            credentials,
            navigator,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Execute `request` with the current credential attached. A 401 ends the
    /// session before the response is handed back.
    fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request = ApiClient::authorize(request, self.store.auth.credential.as_ref());
        debug!(method = request.method.as_str(), path = %request.path, "dispatching");
        let response = self.transport.execute(request)?;
        if response.status == 401 {
            self.invalidate_session();
        }
        Ok(response)
    }

    fn invalidate_session(&mut self) {
        warn!("credential rejected by server, signing out");
        if let Err(e) = self.credentials.remove() {
            warn!(error = %e, "could not remove persisted credential");
        }
        self.store.reset();
        if self.navigator.current_path() != SIGN_IN_PATH {
            self.navigator.navigate(SIGN_IN_PATH);
        }
    }

    fn establish(&mut self, credential: Credential) {
        if let Err(e) = self.credentials.save(&credential) {
            warn!(error = %e, "could not persist credential");
        }
        self.store.sign_in(credential);
        info!("signed in");
        if let Err(e) = self.fetch_user(false) {
            warn!(error = %e, "could not load the signed-in user");
        }
    }

    // --- auth ---

    pub fn fetch_user(&mut self, force: bool) -> Result<(), ApiError> {
        let Some(ticket) = self.store.auth.begin_fetch_user(force) else {
            return Ok(());
        };
        let request = self.client.build_fetch_user();
        let result = self
            .send(request)
            .and_then(|response| self.client.parse_fetch_user(response));
        self.store.auth.finish_fetch_user(ticket, result)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<(), ApiError> {
        let request = self.client.build_sign_in(&SignIn {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let response = self.send(request)?;
        let credential = self.client.parse_sign_in(response)?;
        self.establish(credential);
        Ok(())
    }

    pub fn signup(&mut self, email: &str, name: &str, password: &str) -> Result<(), ApiError> {
        let request = self.client.build_sign_up(&SignUp {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        })?;
        let response = self.send(request)?;
        let credential = self.client.parse_sign_up(response)?;
        self.establish(credential);
        Ok(())
    }

    /// There is no server-side sign-out; dropping the credential is enough.
    pub fn logout(&mut self) {
        if let Err(e) = self.credentials.remove() {
            warn!(error = %e, "could not remove persisted credential");
        }
        self.store.reset();
        info!("signed out");
    }

    // --- lists ---

    pub fn fetch_lists(&mut self, force: bool) -> Result<(), ApiError> {
        let authenticated = self.store.is_authenticated();
        let Some(ticket) = self.store.lists.begin_fetch(force, authenticated) else {
            return Ok(());
        };
        let request = self.client.build_fetch_lists();
        let result = self
            .send(request)
            .and_then(|response| self.client.parse_fetch_lists(response));
        self.store.lists.finish_fetch(ticket, result)
    }

    /// Create a list and return its id so the caller can navigate to it.
    pub fn create_list(&mut self, title: &str) -> Result<ListId, ApiError> {
        let request = self.client.build_create_list(&CreateList {
            title: title.to_string(),
        })?;
        let response = self.send(request)?;
        let list = self.client.parse_create_list(response)?;
        let id = list.id.clone();
        self.store.lists.add(list);
        Ok(id)
    }

    pub fn update_list(&mut self, id: &ListId, title: &str) -> Result<(), ApiError> {
        let request = self.client.build_update_list(
            id,
            &UpdateList {
                title: title.to_string(),
            },
        )?;
        let response = self.send(request)?;
        self.client.parse_update_list(response)?;
        self.store.lists.rename(id, title);
        Ok(())
    }

    pub fn delete_list(&mut self, id: &ListId) -> Result<(), ApiError> {
        let request = self.client.build_delete_list(id);
        let response = self.send(request)?;
        self.client.parse_delete_list(response)?;
        self.store.lists.remove(id);
        if self.store.tasks.list_id.as_ref() == Some(id) {
            self.store.tasks.reset();
        }
        Ok(())
    }

    /// Select a loaded list. Returns `false` for an unknown id.
    pub fn set_current_list(&mut self, id: &ListId) -> bool {
        self.store.lists.set_current(id)
    }

    // --- tasks ---

    pub fn fetch_tasks(&mut self, list_id: &ListId, force: bool) -> Result<(), ApiError> {
        let authenticated = self.store.is_authenticated();
        let Some(ticket) = self.store.tasks.begin_fetch(list_id, force, authenticated) else {
            return Ok(());
        };
        let request = self.client.build_fetch_tasks(list_id);
        let result = self
            .send(request)
            .and_then(|response| self.client.parse_fetch_tasks(response));
        self.store.tasks.finish_fetch(ticket, result)
    }

    pub fn create_task(&mut self, list_id: &ListId, input: &CreateTask) -> Result<TaskId, ApiError> {
        let request = self.client.build_create_task(list_id, input)?;
        let response = self.send(request)?;
        let task = self.client.parse_create_task(response)?;
        let id = task.id.clone();
        self.store.tasks.add(list_id, task);
        Ok(id)
    }

    pub fn update_task(
        &mut self,
        list_id: &ListId,
        id: &TaskId,
        patch: &UpdateTask,
    ) -> Result<(), ApiError> {
        let request = self.client.build_update_task(list_id, id, patch)?;
        let response = self.send(request)?;
        self.client.parse_update_task(response)?;
        self.store.tasks.merge(list_id, id, patch);
        Ok(())
    }

    pub fn delete_task(&mut self, list_id: &ListId, id: &TaskId) -> Result<(), ApiError> {
        let request = self.client.build_delete_task(list_id, id);
        let response = self.send(request)?;
        self.client.parse_delete_task(response)?;
        self.store.tasks.remove(list_id, id);
        Ok(())
    }
}
