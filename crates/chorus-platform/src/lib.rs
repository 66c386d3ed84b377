//! Platform collaborators for chorus.
//!
//! The skill engine never touches the host directly. Everything it needs
//! from the outside world goes through the traits defined here:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`fs::FileSystem`] | Reading config and writing preference files |
//! | [`env::Environment`] | Environment variable access (config discovery) |
//! | [`permissions::PermissionChecker`] | Which device permissions are granted |
//! | [`preferences::EnablementStore`] | Persisted skill id -> enabled mapping |
//!
//! The [`Platform`] trait bundles the file system and environment;
//! permission and preference collaborators are passed separately because
//! their lifetimes differ (they are shared with the settings surface).

pub mod config_loader;
pub mod env;
pub mod fs;
pub mod permissions;
pub mod preferences;

/// Bundle of host capabilities.
pub trait Platform: Send + Sync {
    /// Filesystem operations.
    fn fs(&self) -> &dyn fs::FileSystem;

    /// Environment variable access.
    fn env(&self) -> &dyn env::Environment;
}

/// Native platform implementation using `tokio::fs` and `std::env`.
pub struct NativePlatform {
    fs: fs::NativeFileSystem,
    env: env::NativeEnvironment,
}

impl NativePlatform {
    /// Create a new native platform.
    pub fn new() -> Self {
        Self {
            fs: fs::NativeFileSystem,
            env: env::NativeEnvironment,
        }
    }
}

impl Default for NativePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for NativePlatform {
    fn fs(&self) -> &dyn fs::FileSystem {
        &self.fs
    }

    fn env(&self) -> &dyn env::Environment {
        &self.env
    }
}
