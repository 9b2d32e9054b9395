//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which side of a range a clamped value fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limited {
    /// The value was within the range
    No,
    /// The value was below the minimum and has been raised to it
    Min,
    /// The value was above the maximum and has been lowered to it
    Max,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value into `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    clamp_flagged(value, min, max).0
}

/// Clamp a value into `[min, max]`, also reporting which limit (if any) was
/// applied.
///
/// `NaN` values are not clamped and are reported as `Limited::No`, callers
/// must check for them separately.
pub fn clamp_flagged<T>(value: &T, min: &T, max: &T) -> (T, Limited)
where
    T: Float
{
    if *value > *max {
        (*max, Limited::Max)
    }
    else if *value < *min {
        (*min, Limited::Min)
    }
    else {
        (*value, Limited::No)
    }
}
