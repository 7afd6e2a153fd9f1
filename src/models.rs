use serde::Serialize;

/**
 * A choice a voter can pick, compiled into the binary
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PollOption {
    pub id: &'static str,
    pub name: &'static str,
}

/**
 * The full catalog, in the order clients should display it
 */
pub const OPTIONS: &[PollOption] = &[
    PollOption { id: "python", name: "Python" },
    PollOption { id: "go", name: "Go" },
    PollOption { id: "rust", name: "Rust" },
    PollOption { id: "javascript", name: "JavaScript" },
];

/**
 * Look up a catalog entry by its exact id
 */
pub fn find_option(id: &str) -> Option<&'static PollOption> {
    OPTIONS.iter().find(|option| option.id == id)
}

/**
 * A persisted counter row from the `votes` table
 */
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct VoteTally {
    pub option_id: String,
    pub vote_count: i64,
}
