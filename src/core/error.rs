use thiserror::Error;

/// Errors returned synchronously by [`Hub::register`](crate::core::hub::Hub::register).
///
/// Neither is retried internally; the caller decides what to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    /// The handle was never attached to a delivery endpoint.
    #[error("invalid subscriber handle: no delivery endpoint attached")]
    InvalidHandle,
    /// The topic list was empty.
    #[error("no topics specified")]
    NoTopics,
}
