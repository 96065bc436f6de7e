//! Errors raised while constructing a pool.

/// Errors from [`HeapPool::new`](crate::pool::HeapPool::new).
///
/// Checkout and release never fail: exhaustion blocks instead.
#[derive(Debug, thiserror::Error)]
pub enum HeapError {
    /// The pool configuration is unusable.
    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// The idle sweep thread could not be started.
    #[error("failed to spawn idle sweep thread")]
    SweepSpawn(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_message() {
        let err = HeapError::InvalidConfig("size must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid pool configuration: size must be positive"
        );
    }

    #[test]
    fn spawn_error_keeps_source() {
        use std::error::Error;
        let err = HeapError::SweepSpawn(std::io::Error::other("no threads"));
        assert!(err.source().is_some());
    }
}
