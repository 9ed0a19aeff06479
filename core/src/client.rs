//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each REST call is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The bearer credential is attached separately by `authorize`, so the
//! builders never need to see session state.

use percent_encoding::{utf8_percent_encode, AsciiSet, PercentEncode, CONTROLS};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CreateList, CreateTask, Credential, List, ListId, SignIn, SignUp, Task, TaskId,
    TokenResponse, UpdateList, UpdateTask, User,
};

/// Characters escaped inside a single path segment.
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(raw: &str) -> PercentEncode<'_> {
    utf8_percent_encode(raw, SEGMENT_ENCODE_SET)
}

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach `Authorization: Bearer <token>` when a credential is present.
    /// Any existing authorization header is replaced.
    pub fn authorize(mut request: HttpRequest, credential: Option<&Credential>) -> HttpRequest {
        request
            .headers
            .retain(|(key, _)| !key.eq_ignore_ascii_case("authorization"));
        if let Some(credential) = credential {
            request.headers.push((
                "authorization".to_string(),
                format!("Bearer {}", credential.as_str()),
            ));
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn empty_request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    // --- auth ---

    pub fn build_sign_in(&self, input: &SignIn) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/signin", input)
    }

    pub fn build_sign_up(&self, input: &SignUp) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/users", input)
    }

    pub fn build_fetch_user(&self) -> HttpRequest {
        self.empty_request(HttpMethod::Get, "/users")
    }

    pub fn parse_sign_in(&self, response: HttpResponse) -> Result<Credential, ApiError> {
        let token: TokenResponse = parse_json(response)?;
        Ok(Credential::new(token.token))
    }

    pub fn parse_sign_up(&self, response: HttpResponse) -> Result<Credential, ApiError> {
        let token: TokenResponse = parse_json(response)?;
        Ok(Credential::new(token.token))
    }

    pub fn parse_fetch_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    // --- lists ---

    pub fn build_fetch_lists(&self) -> HttpRequest {
        self.empty_request(HttpMethod::Get, "/lists")
    }

    pub fn build_create_list(&self, input: &CreateList) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/lists", input)
    }

    pub fn build_update_list(&self, id: &ListId, input: &UpdateList) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/lists/{}", segment(id.as_str())), input)
    }

    pub fn build_delete_list(&self, id: &ListId) -> HttpRequest {
        self.empty_request(HttpMethod::Delete, &format!("/lists/{}", segment(id.as_str())))
    }

    pub fn parse_fetch_lists(&self, response: HttpResponse) -> Result<Vec<List>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_list(&self, response: HttpResponse) -> Result<List, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_list(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_delete_list(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // --- tasks ---

    pub fn build_fetch_tasks(&self, list_id: &ListId) -> HttpRequest {
        let path = format!("/lists/{}/tasks", segment(list_id.as_str()));
        self.empty_request(HttpMethod::Get, &path)
    }

    pub fn build_create_task(&self, list_id: &ListId, input: &CreateTask) -> Result<HttpRequest, ApiError> {
        let path = format!("/lists/{}/tasks", segment(list_id.as_str()));
        self.json_request(HttpMethod::Post, &path, input)
    }

    pub fn build_update_task(
        &self,
        list_id: &ListId,
        id: &TaskId,
        input: &UpdateTask,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!(
            "/lists/{}/tasks/{}",
            segment(list_id.as_str()),
            segment(id.as_str())
        ), input)
    }

    pub fn build_delete_task(&self, list_id: &ListId, id: &TaskId) -> HttpRequest {
        self.empty_request(HttpMethod::Delete, &format!(
            "/lists/{}/tasks/{}",
            segment(list_id.as_str()),
            segment(id.as_str())
        ))
    }

    pub fn parse_fetch_tasks(&self, response: HttpResponse) -> Result<Vec<Task>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_task(&self, response: HttpResponse) -> Result<Task, ApiError> {
        parse_json(response)
    }

    pub fn parse_update_task(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_delete_task(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

/// Any 2xx counts as success; everything else maps to an `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, &response.body))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:3000")
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_fetch_lists_produces_correct_request() {
        let req = client().build_fetch_lists();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/lists");
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_sign_in_produces_correct_request() {
        let input = SignIn {
            email: "a@example.com".to_string(),
            password: "pw".to_string(),
        };
        let req = client().build_sign_in(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/signin");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "a@example.com");
        assert_eq!(body["password"], "pw");
    }

    #[test]
    fn authorize_attaches_bearer_header() {
        let credential = Credential::new("tok");
        let req = ApiClient::authorize(client().build_fetch_user(), Some(&credential));
        assert_eq!(req.header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn authorize_without_credential_strips_header() {
        let credential = Credential::new("tok");
        let req = ApiClient::authorize(client().build_fetch_user(), Some(&credential));
        let req = ApiClient::authorize(req, None);
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn task_paths_are_scoped_to_the_list() {
        let list = ListId::from("L1");
        let task = TaskId::from("T9");
        assert_eq!(
            client().build_fetch_tasks(&list).path,
            "http://localhost:3000/lists/L1/tasks"
        );
        let req = client()
            .build_update_task(&list, &task, &UpdateTask::done(true))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/lists/L1/tasks/T9");
        let req = client().build_delete_task(&list, &task);
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn build_update_list_produces_correct_request() {
        let req = client()
            .build_update_list(&ListId::from("L1"), &UpdateList { title: "Work".to_string() })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/lists/L1");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "title": "Work" }));
    }

    #[test]
    fn parse_sign_in_success() {
        let credential = client()
            .parse_sign_in(response(200, r#"{"token":"abc"}"#))
            .unwrap();
        assert_eq!(credential.as_str(), "abc");
    }

    #[test]
    fn parse_sign_in_rejected() {
        let err = client()
            .parse_sign_in(response(
                400,
                r#"{"ErrorCode":400,"ErrorMessageEN":"Wrong email or password"}"#,
            ))
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
        assert_eq!(err.message(), "Wrong email or password");
    }

    #[test]
    fn parse_fetch_lists_success() {
        let lists = client()
            .parse_fetch_lists(response(200, r#"[{"id":"L1","title":"Family"}]"#))
            .unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, ListId::from("L1"));
    }

    #[test]
    fn parse_fetch_lists_unauthorized() {
        let err = client().parse_fetch_lists(response(401, "")).unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[test]
    fn parse_create_task_wrong_status() {
        let err = client()
            .parse_create_task(response(500, "internal error"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
    }

    #[test]
    fn parse_delete_list_success_and_not_found() {
        assert!(client().parse_delete_list(response(204, "")).is_ok());
        let err = client().parse_delete_list(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn any_success_status_is_accepted() {
        let list = client()
            .parse_create_list(response(200, r#"{"id":"L1","title":"Family"}"#))
            .unwrap();
        assert_eq!(list.id, ListId::from("L1"));
        assert!(client().parse_delete_list(response(200, "")).is_ok());
        assert!(client().parse_delete_task(response(202, "")).is_ok());
        assert!(client().parse_update_list(response(204, "")).is_ok());
    }

    #[test]
    fn redirect_is_unexpected() {
        let err = client().parse_delete_list(response(302, "")).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 302, .. }));
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        let list = ListId::from("a/b?c");
        let task = TaskId::from("t#1 2");
        assert_eq!(
            client().build_delete_list(&list).path,
            "http://localhost:3000/lists/a%2Fb%3Fc"
        );
        assert_eq!(
            client().build_delete_task(&list, &task).path,
            "http://localhost:3000/lists/a%2Fb%3Fc/tasks/t%231%202"
        );
    }

    #[test]
    fn parse_update_task_ignores_body() {
        assert!(client().parse_update_task(response(200, "{}")).is_ok());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.build_fetch_lists().path, "http://localhost:3000/lists");
    }

    #[test]
    fn parse_fetch_tasks_bad_json() {
        let err = client().parse_fetch_tasks(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
