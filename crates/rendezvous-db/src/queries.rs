use crate::Database;
use crate::models::{CommentRow, ProfileRow, encode_ts, now};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rendezvous_types::models::{Comment, Profile, ProfileWithComments};
use rendezvous_types::validation::{NewComment, NewProfile, Page, ProfileChanges, ProfileFilter};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

const PROFILE_COLUMNS: &str =
    "id, name, age, gender, description, interests, contact, created_ts, updated_ts";

const COMMENT_COLUMNS: &str = "id, profile_id, author_name, content, created_at";

impl Database {
    // -- Profiles --

    /// Newest first. An empty page is not an error.
    pub fn list_profiles(&self, filter: &ProfileFilter, page: Page) -> Result<Vec<Profile>> {
        self.with_conn(|conn| query_profiles(conn, filter, page))
    }

    pub fn create_profile(&self, new: &NewProfile) -> Result<Profile> {
        self.with_conn_mut(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO profiles (name, age, gender, description, interests, contact, created_ts, updated_ts)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                rusqlite::params![
                    new.name,
                    new.age,
                    new.gender.as_str(),
                    new.description,
                    new.interests,
                    new.contact,
                    encode_ts(ts),
                ],
            )?;
            let id = conn.last_insert_rowid();
            info!(profile_id = id, "Profile created");

            Ok(Profile {
                id,
                name: new.name.clone(),
                age: new.age,
                gender: new.gender,
                description: new.description.clone(),
                interests: new.interests.clone(),
                contact: new.contact.clone(),
                created_ts: ts,
                updated_ts: ts,
            })
        })
    }

    /// The profile plus every comment on it, newest first.
    pub fn get_profile_with_comments(&self, id: i64) -> Result<Option<ProfileWithComments>> {
        self.with_conn(|conn| {
            let Some(profile) = query_profile(conn, id)? else {
                return Ok(None);
            };
            // LIMIT -1 is "no limit" in SQLite
            let comments = query_comments(conn, id, -1, 0)?;
            Ok(Some(ProfileWithComments { profile, comments }))
        })
    }

    /// Applies only the supplied changes and advances `updated_ts`.
    /// Returns `None` if the profile does not exist.
    pub fn update_profile(&self, id: i64, changes: &ProfileChanges) -> Result<Option<Profile>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(mut profile) = query_profile(&tx, id)? else {
                return Ok(None);
            };

            if let Some(name) = &changes.name {
                profile.name = name.clone();
            }
            if let Some(age) = changes.age {
                profile.age = age;
            }
            if let Some(gender) = changes.gender {
                profile.gender = gender;
            }
            if let Some(description) = &changes.description {
                profile.description = description.clone();
            }
            if let Some(interests) = &changes.interests {
                profile.interests = interests.clone();
            }
            if let Some(contact) = &changes.contact {
                profile.contact = contact.clone();
            }
            profile.updated_ts = advance_ts(profile.updated_ts, now());

            tx.execute(
                "UPDATE profiles
                 SET name = ?1, age = ?2, gender = ?3, description = ?4, interests = ?5,
                     contact = ?6, updated_ts = ?7
                 WHERE id = ?8",
                rusqlite::params![
                    profile.name,
                    profile.age,
                    profile.gender.as_str(),
                    profile.description,
                    profile.interests,
                    profile.contact,
                    encode_ts(profile.updated_ts),
                    id,
                ],
            )?;
            tx.commit()?;

            info!(profile_id = id, "Profile updated");
            Ok(Some(profile))
        })
    }

    /// Deletes the profile and, through the foreign key, all of its comments.
    /// Returns false if there was nothing to delete.
    pub fn delete_profile(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let comments: i64 = tx.query_row(
                "SELECT COUNT(*) FROM comments WHERE profile_id = ?1",
                [id],
                |row| row.get(0),
            )?;
            let deleted = tx.execute("DELETE FROM profiles WHERE id = ?1", [id])?;
            tx.commit()?;

            if deleted > 0 {
                info!(profile_id = id, comments, "Profile deleted");
            }
            Ok(deleted > 0)
        })
    }

    // -- Comments --

    /// Returns `None` if the profile does not exist.
    pub fn list_comments(&self, profile_id: i64, page: Page) -> Result<Option<Vec<Comment>>> {
        self.with_conn(|conn| {
            if !profile_exists(conn, profile_id)? {
                return Ok(None);
            }
            let comments = query_comments(conn, profile_id, page.limit(), page.offset())?;
            Ok(Some(comments))
        })
    }

    /// Returns `None` if the profile does not exist.
    pub fn create_comment(&self, profile_id: i64, new: &NewComment) -> Result<Option<Comment>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !profile_exists(&tx, profile_id)? {
                return Ok(None);
            }

            let ts = now();
            tx.execute(
                "INSERT INTO comments (profile_id, author_name, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![profile_id, new.author_name, new.content, encode_ts(ts)],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            info!(comment_id = id, profile_id, "Comment created");
            Ok(Some(Comment {
                id,
                profile_id,
                author_name: new.author_name.clone(),
                content: new.content.clone(),
                created_at: ts,
            }))
        })
    }

    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            if deleted > 0 {
                info!(comment_id = id, "Comment deleted");
            }
            Ok(deleted > 0)
        })
    }
}

/// `updated_ts` must move forward even when two writes share a clock tick.
fn advance_ts(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn profile_exists(conn: &Connection, id: i64) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM profiles WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn query_profile(conn: &Connection, id: i64) -> Result<Option<Profile>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"
    ))?;

    stmt.query_row([id], profile_row)
        .optional()?
        .map(Profile::try_from)
        .transpose()
}

fn query_profiles(conn: &Connection, filter: &ProfileFilter, page: Page) -> Result<Vec<Profile>> {
    let gender = filter.gender.map(|g| g.as_str());
    let limit = page.limit();
    let offset = page.offset();

    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<&dyn ToSql> = Vec::new();
    if let Some(min_age) = &filter.min_age {
        clauses.push("age >= ?");
        params.push(min_age);
    }
    if let Some(max_age) = &filter.max_age {
        clauses.push("age <= ?");
        params.push(max_age);
    }
    if let Some(gender) = &gender {
        clauses.push("gender = ?");
        params.push(gender);
    }
    params.push(&limit);
    params.push(&offset);

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles {where_clause}
         ORDER BY created_ts DESC, id DESC
         LIMIT ? OFFSET ?"
    );
    debug!(?filter, limit, offset, "Listing profiles");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), profile_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(Profile::try_from).collect()
}

fn query_comments(conn: &Connection, profile_id: i64, limit: i64, offset: i64) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments
         WHERE profile_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2 OFFSET ?3"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params![profile_id, limit, offset], comment_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(Comment::try_from).collect()
}

fn profile_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        description: row.get(4)?,
        interests: row.get(5)?,
        contact: row.get(6)?,
        created_ts: row.get(7)?,
        updated_ts: row.get(8)?,
    })
}

fn comment_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        author_name: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendezvous_types::models::Gender;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_profile(name: &str, age: i64, gender: Gender) -> NewProfile {
        NewProfile {
            name: name.to_string(),
            age,
            gender,
            description: None,
            interests: None,
            contact: format!("{}@x.com", name.to_lowercase()),
        }
    }

    fn anna() -> NewProfile {
        NewProfile {
            description: Some("Loves hiking".into()),
            interests: Some("books, chess".into()),
            ..new_profile("Anna", 25, Gender::Female)
        }
    }

    fn comment(author: &str, content: &str) -> NewComment {
        NewComment {
            author_name: author.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn create_then_get_returns_same_profile() {
        let db = db();
        let created = db.create_profile(&anna()).unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.name, "Anna");
        assert_eq!(created.created_ts, created.updated_ts);

        let fetched = db.get_profile_with_comments(created.id).unwrap().unwrap();
        assert_eq!(fetched.profile, created);
        assert!(fetched.comments.is_empty());
    }

    #[test]
    fn missing_profile_is_none() {
        let db = db();
        assert!(db.get_profile_with_comments(42).unwrap().is_none());
        assert!(db.update_profile(42, &ProfileChanges::default()).unwrap().is_none());
        assert!(!db.delete_profile(42).unwrap());
    }

    #[test]
    fn store_rejects_out_of_range_age() {
        // Bypassing validation still cannot persist a bad row.
        let db = db();
        assert!(db.create_profile(&new_profile("Old", 121, Gender::Male)).is_err());
        assert!(db.create_profile(&new_profile("Young", 17, Gender::Male)).is_err());
        assert!(db.list_profiles(&ProfileFilter::default(), Page::default()).unwrap().is_empty());
    }

    #[test]
    fn list_orders_newest_first_and_paginates() {
        let db = db();
        for i in 1..=25 {
            db.create_profile(&new_profile(&format!("P{i}"), 30, Gender::Male)).unwrap();
        }

        let page2 = db
            .list_profiles(&ProfileFilter::default(), Page::new(2, 10).unwrap())
            .unwrap();
        let ids: Vec<i64> = page2.iter().map(|p| p.id).collect();
        assert_eq!(ids, (6..=15i64).rev().collect::<Vec<_>>());

        let page3 = db
            .list_profiles(&ProfileFilter::default(), Page::new(3, 10).unwrap())
            .unwrap();
        assert_eq!(page3.len(), 5);

        let beyond = db
            .list_profiles(&ProfileFilter::default(), Page::new(4, 10).unwrap())
            .unwrap();
        assert!(beyond.is_empty());
    }

    #[test]
    fn list_applies_filters_conjunctively() {
        let db = db();
        db.create_profile(&new_profile("A", 20, Gender::Female)).unwrap();
        db.create_profile(&new_profile("B", 30, Gender::Female)).unwrap();
        db.create_profile(&new_profile("C", 30, Gender::Male)).unwrap();
        db.create_profile(&new_profile("D", 45, Gender::Female)).unwrap();

        let filter = ProfileFilter {
            min_age: Some(25),
            max_age: Some(40),
            gender: Some(Gender::Female),
        };
        let found = db.list_profiles(&filter, Page::default()).unwrap();
        let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B"]);

        let males = db
            .list_profiles(
                &ProfileFilter {
                    gender: Some(Gender::Male),
                    ..Default::default()
                },
                Page::default(),
            )
            .unwrap();
        assert_eq!(males.len(), 1);

        let inverted = ProfileFilter {
            min_age: Some(50),
            max_age: Some(20),
            gender: None,
        };
        assert!(db.list_profiles(&inverted, Page::default()).unwrap().is_empty());
    }

    #[test]
    fn partial_update_keeps_other_fields_and_advances_ts() {
        let db = db();
        let created = db.create_profile(&anna()).unwrap();

        let changes = ProfileChanges {
            age: Some(26),
            description: Some(None),
            ..Default::default()
        };
        let updated = db.update_profile(created.id, &changes).unwrap().unwrap();
        assert_eq!(updated.age, 26);
        assert_eq!(updated.description, None);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.interests, created.interests);
        assert_eq!(updated.contact, created.contact);
        assert_eq!(updated.created_ts, created.created_ts);
        assert!(updated.updated_ts > created.updated_ts);

        let stored = db.get_profile_with_comments(created.id).unwrap().unwrap().profile;
        assert_eq!(stored, updated);
    }

    #[test]
    fn empty_update_still_advances_ts() {
        let db = db();
        let created = db.create_profile(&anna()).unwrap();
        let first = db.update_profile(created.id, &ProfileChanges::default()).unwrap().unwrap();
        let second = db.update_profile(created.id, &ProfileChanges::default()).unwrap().unwrap();
        assert!(first.updated_ts > created.updated_ts);
        assert!(second.updated_ts > first.updated_ts);
    }

    #[test]
    fn advance_ts_never_goes_backwards() {
        let t = "2026-10-17T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(advance_ts(t, t), t + Duration::microseconds(1));
        assert_eq!(advance_ts(t, t - Duration::seconds(5)), t + Duration::microseconds(1));
        assert_eq!(advance_ts(t, t + Duration::seconds(1)), t + Duration::seconds(1));
    }

    #[test]
    fn comments_are_scoped_and_newest_first() {
        let db = db();
        let anna = db.create_profile(&anna()).unwrap();
        let bob = db.create_profile(&new_profile("Bob", 40, Gender::Male)).unwrap();

        let first = db.create_comment(anna.id, &comment("Bob", "Hi")).unwrap().unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(first.profile_id, anna.id);
        db.create_comment(anna.id, &comment("Carl", "Hello")).unwrap().unwrap();
        db.create_comment(bob.id, &comment("Anna", "Hey")).unwrap().unwrap();

        let listed = db.list_comments(anna.id, Page::default()).unwrap().unwrap();
        let authors: Vec<&str> = listed.iter().map(|c| c.author_name.as_str()).collect();
        assert_eq!(authors, vec!["Carl", "Bob"]);

        let paged = db.list_comments(anna.id, Page::new(2, 1).unwrap()).unwrap().unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id, first.id);

        let with_comments = db.get_profile_with_comments(anna.id).unwrap().unwrap();
        assert_eq!(with_comments.comments, listed);
    }

    #[test]
    fn comment_on_missing_profile_is_none() {
        let db = db();
        assert!(db.create_comment(7, &comment("Bob", "Hi")).unwrap().is_none());
        assert!(db.list_comments(7, Page::default()).unwrap().is_none());
    }

    #[test]
    fn deleting_profile_cascades_to_comments() {
        let db = db();
        let anna = db.create_profile(&anna()).unwrap();
        let keep = db.create_profile(&new_profile("Keep", 50, Gender::Male)).unwrap();
        for i in 0..5 {
            db.create_comment(anna.id, &comment("Bob", &format!("note {i}"))).unwrap();
        }
        let survivor = db.create_comment(keep.id, &comment("Bob", "stays")).unwrap().unwrap();

        assert!(db.delete_profile(anna.id).unwrap());
        assert!(db.get_profile_with_comments(anna.id).unwrap().is_none());
        assert!(db.list_comments(anna.id, Page::default()).unwrap().is_none());

        let orphans: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM comments WHERE profile_id = ?1",
                    [anna.id],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(orphans, 0);

        let remaining = db.list_comments(keep.id, Page::default()).unwrap().unwrap();
        assert_eq!(remaining, vec![survivor]);
    }

    #[test]
    fn delete_comment_reports_absence() {
        let db = db();
        let anna = db.create_profile(&anna()).unwrap();
        let c = db.create_comment(anna.id, &comment("Bob", "Hi")).unwrap().unwrap();

        assert!(db.delete_comment(c.id).unwrap());
        assert!(!db.delete_comment(c.id).unwrap());
        assert!(db.list_comments(anna.id, Page::default()).unwrap().unwrap().is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let db = db();
        let first = db.create_profile(&anna()).unwrap();
        db.delete_profile(first.id).unwrap();
        let second = db.create_profile(&anna()).unwrap();
        assert!(second.id > first.id);
    }
}
