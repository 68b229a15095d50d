use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (profiles, comments)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE profiles (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 100),
                age         INTEGER NOT NULL CHECK (age BETWEEN 18 AND 120),
                gender      TEXT NOT NULL CHECK (gender IN ('мужской', 'женский')),
                description TEXT,
                interests   TEXT,
                contact     TEXT NOT NULL CHECK (length(contact) >= 1),
                created_ts  TEXT NOT NULL,
                updated_ts  TEXT NOT NULL CHECK (updated_ts >= created_ts)
            );

            CREATE INDEX idx_profiles_created
                ON profiles(created_ts);

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_id  INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                author_name TEXT NOT NULL CHECK (length(author_name) BETWEEN 1 AND 100),
                content     TEXT NOT NULL CHECK (length(content) >= 1),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_profile
                ON comments(profile_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
