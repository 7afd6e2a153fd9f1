use std::collections::HashMap;

use log::*;

use crate::api_models::{OptionResult, VoteReceipt};
use crate::error::PollError;
use crate::models::{find_option, PollOption, OPTIONS};
use crate::store::TallyStore;

pub fn options() -> &'static [PollOption] {
    OPTIONS
}

/**
 * Record one vote for `option_id`.
 *
 * The id is checked against the catalog before the store is touched, so an
 * unknown option is always a client error even if the database is down.
 */
pub async fn cast_vote(store: &dyn TallyStore, option_id: &str) -> Result<VoteReceipt, PollError> {
    let option = find_option(option_id)
        .ok_or_else(|| PollError::InvalidOption(option_id.to_string()))?;

    store.increment(option.id).await?;
    info!("Vote cast for {}", option.id);
    Ok(VoteReceipt::for_option(option.id))
}

/**
 * Current counts for every catalog option, in catalog order
 */
pub async fn results(store: &dyn TallyStore) -> Result<Vec<OptionResult>, PollError> {
    let counts: HashMap<String, i64> = store
        .tallies()
        .await?
        .into_iter()
        .map(|tally| (tally.option_id, tally.vote_count))
        .collect();

    for stray in counts.keys().filter(|id| find_option(id).is_none()) {
        debug!("Ignoring tally for unknown option {:?}", stray);
    }

    Ok(OPTIONS
        .iter()
        .map(|option| OptionResult {
            id: option.id.to_string(),
            name: option.name.to_string(),
            votes: counts.get(option.id).copied().unwrap_or(0),
        })
        .collect())
}
