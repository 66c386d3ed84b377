//! Permission checking.
//!
//! Skills declare the permissions they need in their
//! [`SkillInfo`](chorus_types::SkillInfo); availability checks ask a
//! [`PermissionChecker`] which of those are currently granted.

use std::collections::BTreeSet;
use std::sync::RwLock;

use chorus_types::Permission;

/// Reports which permissions are currently granted.
pub trait PermissionChecker: Send + Sync {
    /// Return the subset of `requested` that is granted, in request order.
    fn granted(&self, requested: &[Permission]) -> Vec<Permission>;

    /// Whether every requested permission is granted.
    fn all_granted(&self, requested: &[Permission]) -> bool {
        self.granted(requested).len() == requested.len()
    }
}

/// A permission checker backed by a fixed, mutable set.
///
/// Used by the CLI (granted set comes from configuration) and by tests.
/// [`grant`](Self::grant) and [`revoke`](Self::revoke) model the user
/// answering a permission prompt.
#[derive(Debug, Default)]
pub struct StaticPermissions {
    granted: RwLock<BTreeSet<Permission>>,
}

impl StaticPermissions {
    /// Create a checker with the given permissions granted.
    pub fn new(granted: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            granted: RwLock::new(granted.into_iter().collect()),
        }
    }

    /// A checker that grants every known permission.
    pub fn all() -> Self {
        Self::new(Permission::ALL)
    }

    /// Grant a permission.
    pub fn grant(&self, permission: Permission) {
        if let Ok(mut set) = self.granted.write() {
            set.insert(permission);
        }
    }

    /// Revoke a permission.
    pub fn revoke(&self, permission: Permission) {
        if let Ok(mut set) = self.granted.write() {
            set.remove(&permission);
        }
    }
}

impl PermissionChecker for StaticPermissions {
    fn granted(&self, requested: &[Permission]) -> Vec<Permission> {
        match self.granted.read() {
            Ok(set) => requested.iter().copied().filter(|p| set.contains(p)).collect(),
            Err(_) => Vec::new(),
        }
    }
}
