//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates. Ids are opaque
//! server strings wrapped in newtypes so a task id cannot be passed where a
//! list id is expected.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque bearer token proving an authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens end up in logs through `{:?}` on the store; keep them out.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(ListId);
string_id!(TaskId);

/// The signed-in user, as returned by `GET /users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A named todo list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct List {
    pub id: ListId,
    pub title: String,
}

/// A task inside a list. `limit` is an absolute UTC deadline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, with = "iso_millis::option")]
    pub limit: Option<DateTime<Utc>>,
}

impl Task {
    /// Merge the fields present in `patch` into this task.
    pub fn apply(&mut self, patch: &UpdateTask) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(detail) = &patch.detail {
            self.detail = detail.clone();
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
        if let Some(limit) = patch.limit {
            self.limit = limit;
        }
    }
}

/// Request payload for `POST /signin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

/// Request payload for `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Response of both sign-in and sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Request payload for `POST /lists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateList {
    pub title: String,
}

/// Request payload for `PUT /lists/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateList {
    pub title: String,
}

/// Request payload for creating a task. `limit` is omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub done: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis::option"
    )]
    pub limit: Option<DateTime<Utc>>,
}

/// Partial task update. Omitted fields are left unchanged; `limit` is
/// tri-state: absent, `Some(None)` (clear the deadline, sent as `null`), or
/// `Some(Some(instant))`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_millis::patch"
    )]
    pub limit: Option<Option<DateTime<Utc>>>,
}

impl UpdateTask {
    /// Toggle-only update, as sent by the checkbox on a task row.
    pub fn done(done: bool) -> Self {
        Self {
            done: Some(done),
            ..Self::default()
        }
    }

    /// Full edit: every field is sent and an absent `limit` clears it.
    pub fn full(
        title: impl Into<String>,
        detail: impl Into<String>,
        done: bool,
        limit: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            detail: Some(detail.into()),
            done: Some(done),
            limit: Some(limit),
        }
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix, the format a
/// browser's `Date.toISOString()` produces.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => s.serialize_str(&format(value)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => parse(&raw).map(Some).map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }

    /// Present-but-null is `Some(None)`; a missing field relies on
    /// `#[serde(default)]` to become `None`.
    pub mod patch {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Option<DateTime<Utc>>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(Some(value)) => s.serialize_str(&format(value)),
                _ => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<Option<DateTime<Utc>>>, D::Error> {
            super::option::deserialize(d).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            id: TaskId::from("T1"),
            title: "Buy milk".to_string(),
            detail: "2 bottles".to_string(),
            done: false,
            limit: None,
        }
    }

    #[test]
    fn limit_keeps_the_exact_instant() {
        let raw = r#"{"id":"T1","title":"t","detail":"d","done":false,"limit":"2024-01-01T00:00:00.000Z"}"#;
        let parsed: Task = serde_json::from_str(raw).unwrap();
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["limit"], "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn limit_with_offset_is_normalized_to_utc() {
        let raw = r#"{"id":"T1","title":"t","detail":"d","done":false,"limit":"2024-01-01T09:00:00+09:00"}"#;
        let parsed: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(
            iso_millis::format(&parsed.limit.unwrap()),
            "2024-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn task_without_limit_field_parses() {
        let parsed: Task =
            serde_json::from_str(r#"{"id":"T1","title":"t","detail":"","done":true}"#).unwrap();
        assert!(parsed.limit.is_none());
        assert!(parsed.done);
    }

    #[test]
    fn create_task_omits_absent_limit() {
        let input = CreateTask {
            title: "t".to_string(),
            detail: "d".to_string(),
            done: false,
            limit: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("limit").is_none());
    }

    #[test]
    fn done_only_update_serializes_one_field() {
        let json = serde_json::to_value(UpdateTask::done(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "done": true }));
    }

    #[test]
    fn full_update_sends_null_limit() {
        let json = serde_json::to_value(UpdateTask::full("t", "d", false, None)).unwrap();
        assert!(json["limit"].is_null());
        assert!(json.as_object().unwrap().contains_key("limit"));
    }

    #[test]
    fn update_task_distinguishes_null_from_missing_limit() {
        let missing: UpdateTask = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(missing.limit.is_none());
        let cleared: UpdateTask = serde_json::from_str(r#"{"limit":null}"#).unwrap();
        assert_eq!(cleared.limit, Some(None));
    }

    #[test]
    fn apply_done_leaves_other_fields() {
        let mut t = task();
        t.apply(&UpdateTask::done(true));
        assert!(t.done);
        assert_eq!(t.title, "Buy milk");
        assert_eq!(t.detail, "2 bottles");
        assert!(t.limit.is_none());
    }

    #[test]
    fn apply_clears_limit() {
        let mut t = task();
        t.limit = Some(iso_millis::parse("2024-01-01T00:00:00.000Z").unwrap());
        t.apply(&UpdateTask {
            limit: Some(None),
            ..UpdateTask::default()
        });
        assert!(t.limit.is_none());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");
        assert!(!format!("{credential:?}").contains("secret"));
        assert_eq!(credential.as_str(), "secret-token");
    }
}
