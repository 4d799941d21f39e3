//! Validated severity and occurrence ratings.

use serde::{Deserialize, Serialize};

use crate::error::RatingError;

/// A severity or occurrence rating on the 1-5 scale.
///
/// The inner value is private to guarantee it is always in range:
/// construct via [`Rating::new`] or `TryFrom<u8>`. Serde deserialization
/// runs through the same validation, so a stored or wire value outside
/// the scale fails to decode instead of slipping through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest rating on the scale.
    pub const MIN: u8 = 1;
    /// Highest rating on the scale.
    pub const MAX: u8 = 5;

    /// Validate and wrap a raw rating value.
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(RatingError::OutOfRange { value });
        }
        Ok(Rating(value))
    }

    /// The raw 1-5 value.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_scale() {
        for value in 1..=5 {
            let rating = Rating::new(value).unwrap();
            assert_eq!(rating.value(), value);
        }
    }

    #[test]
    fn test_rejects_zero_and_above_scale() {
        assert_eq!(Rating::new(0), Err(RatingError::OutOfRange { value: 0 }));
        assert_eq!(Rating::new(6), Err(RatingError::OutOfRange { value: 6 }));
        assert_eq!(Rating::new(255), Err(RatingError::OutOfRange { value: 255 }));
    }

    #[test]
    fn test_try_from_matches_new() {
        assert_eq!(Rating::try_from(3).unwrap(), Rating::new(3).unwrap());
        assert!(Rating::try_from(9).is_err());
    }

    #[test]
    fn test_serde_validates_on_decode() {
        let rating: Rating = serde_json::from_str("4").unwrap();
        assert_eq!(rating.value(), 4);

        let err = serde_json::from_str::<Rating>("7");
        assert!(err.is_err());
    }

    #[test]
    fn test_serde_encodes_bare_number() {
        let rating = Rating::new(2).unwrap();
        assert_eq!(serde_json::to_string(&rating).unwrap(), "2");
    }
}
