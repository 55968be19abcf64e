use thiserror::Error;

/// Errors raised by index lookups and navigation.
///
/// A failed call never mutates the [`NavigationState`](crate::navigator::NavigationState)
/// it was invoked on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    #[error("position {position} is out of range for an index of {len} markers")]
    OutOfRange { position: usize, len: usize },
}
