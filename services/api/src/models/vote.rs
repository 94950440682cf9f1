//! Vote request and response payloads

use serde::{Deserialize, Serialize};

use crate::votes::{InvalidVoteValue, VoteStats, VoteValue};

/// Request body for `POST /events/:id/vote` and `POST /venues/:id/vote`
///
/// Either `value` (`1` or `-1`) or `voteType` (`"up"` or `"down"`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoteRequest {
    pub value: Option<i64>,
    pub vote_type: Option<String>,
}

impl VoteRequest {
    pub fn vote_value(&self) -> Result<VoteValue, InvalidVoteValue> {
        match (self.value, self.vote_type.as_deref()) {
            (Some(value), None) => VoteValue::try_from(value),
            (None, Some(direction)) => VoteValue::from_direction(direction),
            (Some(value), Some(direction)) => {
                let by_value = VoteValue::try_from(value)?;
                if by_value == VoteValue::from_direction(direction)? {
                    Ok(by_value)
                } else {
                    Err(InvalidVoteValue)
                }
            }
            (None, None) => Err(InvalidVoteValue),
        }
    }
}

/// Result of a cast
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub message: &'static str,
    /// The caller's vote after the cast: `1`, `-1` or `null`
    pub user_vote: Option<i16>,
    #[serde(flatten)]
    pub stats: VoteStats,
}
