//! Reputation-specific errors.

use fairlance_types::{JobId, RatingDirection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReputationError {
    #[error("rating {field} = {value} outside the accepted range {min}..={max}")]
    RatingOutOfRange {
        field: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },

    #[error("a {direction:?} rating already exists for {job}")]
    DuplicateRating {
        job: JobId,
        direction: RatingDirection,
    },

    #[error("a party cannot rate itself")]
    SelfRating,
}
