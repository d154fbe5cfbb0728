use thiserror::Error;

/// Errors that can occur during wrapping number operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrappingNumberError {
    /// The distance between two sequence numbers did not fit an i16.
    /// Unreachable for valid u16 inputs.
    #[error("Wrapping distance from {from} to {to} does not fit in an i16")]
    DistanceOverflow { from: u16, to: u16 },
}

const HALF_RANGE: u16 = 32768;

/// Returns whether `s1` was issued after `s2` in a cyclic 16-bit sequence.
/// sequence_greater_than(2, 1) is true
/// sequence_greater_than(0, 65535) is true
/// sequence_greater_than(1, 1) is false
pub fn sequence_greater_than(s1: u16, s2: u16) -> bool {
    ((s1 > s2) && (s1 - s2 <= HALF_RANGE)) || ((s1 < s2) && (s2 - s1 > HALF_RANGE))
}

/// Returns whether `s1` was issued before `s2` in a cyclic 16-bit sequence.
pub fn sequence_less_than(s1: u16, s2: u16) -> bool {
    sequence_greater_than(s2, s1)
}

/// Signed number of steps needed to go from `from` to `to`, taking the short
/// way around the cycle.
///
/// # Examples
/// ```
/// # use ballast_shared::try_wrapping_diff;
/// assert_eq!(try_wrapping_diff(1, 2).unwrap(), 1);
/// assert_eq!(try_wrapping_diff(65535, 0).unwrap(), 1);
/// assert_eq!(try_wrapping_diff(0, 65535).unwrap(), -1);
/// ```
pub fn try_wrapping_diff(from: u16, to: u16) -> Result<i16, WrappingNumberError> {
    let steps = to.wrapping_sub(from);
    let signed = if steps > HALF_RANGE {
        i32::from(steps) - 65536
    } else if steps == HALF_RANGE {
        // both directions are equally long; report the negative one so that
        // the result stays inside i16
        -i32::from(HALF_RANGE)
    } else {
        i32::from(steps)
    };
    i16::try_from(signed).map_err(|_| WrappingNumberError::DistanceOverflow { from, to })
}

/// # Panics
///
/// Never for valid inputs; see [`try_wrapping_diff`].
pub fn wrapping_diff(from: u16, to: u16) -> i16 {
    match try_wrapping_diff(from, to) {
        Ok(diff) => diff,
        Err(err) => panic!("{}", err),
    }
}
