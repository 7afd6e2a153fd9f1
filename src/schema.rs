/*
 * SQL for the `votes` table. The table itself is provisioned outside of this
 * service, the DDL here is only what the service expects to find.
 */

#[cfg(test)]
pub const CREATE_VOTES: &str = r#"
CREATE TABLE IF NOT EXISTS votes (
    option_id VARCHAR(255) PRIMARY KEY,
    vote_count INTEGER NOT NULL DEFAULT 0
)"#;

/**
 * Single-statement upsert, the increment happens inside the database so
 * concurrent votes for the same option never lose an update
 */
pub const UPSERT_VOTE: &str = r#"
INSERT INTO votes (option_id, vote_count)
VALUES ($1, 1)
ON CONFLICT (option_id)
DO UPDATE SET vote_count = votes.vote_count + 1"#;

pub const SELECT_TALLIES: &str =
    "SELECT option_id, vote_count::BIGINT AS vote_count FROM votes";
