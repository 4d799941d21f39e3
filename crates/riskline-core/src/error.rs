//! Domain-level error taxonomy for riskline.

/// Errors produced by rating validation.
///
/// An out-of-range rating is a contract violation: it is rejected rather
/// than clamped, and callers must not retry it as if it were transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("rating {value} is outside the 1-5 scale")]
    OutOfRange { value: u8 },
}
