use serde::{Deserialize, Serialize};

/**
 * One row of GET /results
 */
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct OptionResult {
    pub id: String,
    pub name: String,
    pub votes: i64,
}

/**
 * Acknowledgement for a recorded vote
 */
#[derive(Debug, Deserialize, Serialize)]
pub struct VoteReceipt {
    pub success: bool,
    pub message: String,
}

impl VoteReceipt {
    pub fn for_option(option_id: &str) -> Self {
        Self {
            success: true,
            message: format!("Vote cast for {}", option_id),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Health {
    pub status: String,
}
