//! Payloads exchanged with the Ignite API.

use serde::{Deserialize, Deserializer, Serialize};

/// Signed-in user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Body of a successful `POST /sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Account creation request for `POST /users`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Profile update for `PUT /users`.
///
/// `password` and `old_password` are only sent when changing the password.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub group: String,
    #[serde(default)]
    pub series: u32,
    #[serde(default)]
    pub repetitions: u32,
    /// File name of the demo animation, served under `exercise/demo/`.
    #[serde(default)]
    pub demo: Option<String>,
    /// File name of the thumbnail, served under `exercise/thumb/`.
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryRegistration<'a> {
    pub exercise_id: &'a str,
}

/// One completed exercise in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub group: String,
    pub hour: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// History entries grouped under a day heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySection {
    pub title: String,
    pub data: Vec<HistoryEntry>,
}

/// The API returns numeric ids; older builds returned strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(n) => n.to_string(),
    })
}
