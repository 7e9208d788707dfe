//! Minimum payment rate policy.

use crate::amount::Amount;
use crate::catalog::Stream;
use crate::error::{LedgerError, LedgerResult};

/// Checks a proposed per-block rate against a stream's rate floor.
///
/// A zero rate is always rejected, whether or not the stream configures a
/// minimum. A configured minimum of zero is the same as no minimum.
pub fn validate_rate(stream: &Stream, proposed: Amount) -> LedgerResult<()> {
    if meets_minimum(stream.min_rate, proposed) {
        Ok(())
    } else {
        Err(LedgerError::RateTooLow {
            stream: stream.id,
            rate: proposed,
        })
    }
}

fn meets_minimum(minimum: Option<Amount>, proposed: Amount) -> bool {
    if proposed.is_zero() {
        return false;
    }
    match minimum {
        Some(min) => proposed >= min,
        None => true,
    }
}
