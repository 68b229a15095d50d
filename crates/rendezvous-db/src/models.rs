//! Database row types — these map directly to SQLite rows.
//! Distinct from rendezvous-types models to keep the DB layer independent.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rendezvous_types::models::{Comment, Gender, Profile};

pub struct ProfileRow {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub description: Option<String>,
    pub interests: Option<String>,
    pub contact: String,
    pub created_ts: String,
    pub updated_ts: String,
}

pub struct CommentRow {
    pub id: i64,
    pub profile_id: i64,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = anyhow::Error;

    fn try_from(row: ProfileRow) -> Result<Self> {
        let gender: Gender = row
            .gender
            .parse()
            .with_context(|| format!("Corrupt gender on profile {}", row.id))?;

        Ok(Profile {
            id: row.id,
            name: row.name,
            age: row.age,
            gender,
            description: row.description,
            interests: row.interests,
            contact: row.contact,
            created_ts: decode_ts(&row.created_ts)
                .with_context(|| format!("Corrupt created_ts on profile {}", row.id))?,
            updated_ts: decode_ts(&row.updated_ts)
                .with_context(|| format!("Corrupt updated_ts on profile {}", row.id))?,
        })
    }
}

impl TryFrom<CommentRow> for Comment {
    type Error = anyhow::Error;

    fn try_from(row: CommentRow) -> Result<Self> {
        Ok(Comment {
            id: row.id,
            profile_id: row.profile_id,
            author_name: row.author_name,
            content: row.content,
            created_at: decode_ts(&row.created_at)
                .with_context(|| format!("Corrupt created_at on comment {}", row.id))?,
        })
    }
}

/// Current time at the precision the store keeps, so values read back compare equal.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 (`2026-10-17T08:30:00.123456Z`): text order is time order.
pub fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
