//! Injected collaborators

mod int_like;

pub use int_like::{IntLike, IntNormalizer, StrictIntNormalizer};

use crate::IterableError;

/// Normalize `value` and require it to be non-negative
pub(crate) fn non_negative<N>(
    ints: &N,
    value: &IntLike,
    what: &'static str,
) -> Result<usize, IterableError>
where
    N: IntNormalizer + ?Sized,
{
    let normalized = ints.normalize_int(value).map_err(|err| {
        IterableError::invalid_argument(format!("{what} must be an integer")).caused_by(err)
    })?;
    usize::try_from(normalized).map_err(|_| {
        IterableError::invalid_argument(format!("{what} must be non-negative, got {normalized}"))
    })
}
