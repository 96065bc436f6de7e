//! Error handling and exit codes.

use aspheap_pool::HeapError;

/// Process exit codes.
pub mod exit_codes {
    /// Generic error.
    pub const ERROR_GENERIC: u8 = 1;
    /// Invalid configuration.
    pub const ERROR_CONFIG: u8 = 4;
}

/// Map an application error to its exit code.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<HeapError>() {
        Some(HeapError::InvalidConfig(_)) => exit_codes::ERROR_CONFIG,
        Some(HeapError::SweepSpawn(_)) | None => exit_codes::ERROR_GENERIC,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn config_errors_map_to_config_code() {
        let err: anyhow::Error = HeapError::InvalidConfig("size".into()).into();
        assert_eq!(exit_code(&err), exit_codes::ERROR_CONFIG);
    }

    #[test]
    fn context_is_seen_through() {
        let res: Result<(), HeapError> = Err(HeapError::InvalidConfig("size".into()));
        let err = res.context("building arena pool").unwrap_err();
        assert_eq!(exit_code(&err), exit_codes::ERROR_CONFIG);
    }

    #[test]
    fn other_errors_are_generic() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(exit_code(&err), exit_codes::ERROR_GENERIC);
    }
}
