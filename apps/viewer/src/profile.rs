//! Profile query document, its normalized shape, and terminal rendering.

use query_core::{Normalize, QueryDescriptor, QueryError, QueryPhase, QueryState};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const USER_PROFILE_QUERY: &str = "\
query ($login: String!) {
  user(login: $login) {
    login
    name
    company
    location
    followers { totalCount }
    following { totalCount }
    repositories { totalCount }
  }
}";

pub fn descriptor(login: &str) -> QueryDescriptor {
    let mut variables = Map::new();
    variables.insert("login".to_string(), Value::String(login.to_string()));
    QueryDescriptor::new(USER_PROFILE_QUERY, variables)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TotalCount {
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub followers: TotalCount,
    pub following: TotalCount,
    pub repositories: TotalCount,
}

pub struct ProfileNormalize;

impl Normalize for ProfileNormalize {
    type Output = UserProfile;

    fn normalize(&self, raw: Value) -> Result<UserProfile, QueryError> {
        let user = raw
            .get("user")
            .filter(|user| !user.is_null())
            .cloned()
            .ok_or_else(|| QueryError::Decode("user missing from response".to_string()))?;
        serde_json::from_value(user).map_err(|err| QueryError::Decode(err.to_string()))
    }
}

pub fn render(state: &QueryState<UserProfile>) -> String {
    match state.phase() {
        QueryPhase::Idle => "idle".to_string(),
        QueryPhase::Fetching => "fetching profile...".to_string(),
        QueryPhase::Errored => state
            .error
            .as_ref()
            .map(|error| format!("profile query failed: {error}"))
            .unwrap_or_else(|| "profile query failed".to_string()),
        QueryPhase::Loaded => match &state.data {
            Some(profile) => {
                let mut lines = vec![format!(
                    "{} ({})",
                    profile.name.as_deref().unwrap_or("<no name>"),
                    profile.login
                )];
                if let Some(company) = &profile.company {
                    lines.push(format!("  company:      {company}"));
                }
                if let Some(location) = &profile.location {
                    lines.push(format!("  location:     {location}"));
                }
                lines.push(format!("  followers:    {}", profile.followers.total_count));
                lines.push(format!("  following:    {}", profile.following.total_count));
                lines.push(format!(
                    "  repositories: {}",
                    profile.repositories.total_count
                ));
                lines.join("\n")
            }
            None => "loaded, but no profile data".to_string(),
        },
    }
}
