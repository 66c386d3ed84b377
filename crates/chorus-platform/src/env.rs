//! Environment variable abstraction.
//!
//! Config discovery reads `CHORUS_CONFIG` through [`Environment`] so tests
//! can substitute an in-memory map instead of mutating the process
//! environment.

/// Read-only environment variable access.
pub trait Environment: Send + Sync {
    /// Get the value of an environment variable, or `None` if it is not set.
    fn get_var(&self, name: &str) -> Option<String>;
}

/// Native environment implementation using [`std::env`].
pub struct NativeEnvironment;

impl Environment for NativeEnvironment {
    fn get_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_var_existing() {
        // PATH is set in every reasonable test environment.
        let env = NativeEnvironment;
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_get_var_missing() {
        let env = NativeEnvironment;
        assert!(env.get_var("CHORUS_TEST_DEFINITELY_NOT_SET_42").is_none());
    }
}
