use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile gender. Serialized with the labels the listing UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "мужской")]
    Male,
    #[serde(rename = "женский")]
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "мужской",
            Gender::Female => "женский",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gender '{0}', expected 'мужской' or 'женский'")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGender(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: Gender,
    pub description: Option<String>,
    pub interests: Option<String>,
    pub contact: String,
    pub created_ts: DateTime<Utc>,
    pub updated_ts: DateTime<Utc>,
}

/// A profile together with its comments, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileWithComments {
    #[serde(flatten)]
    pub profile: Profile,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub profile_id: i64,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
