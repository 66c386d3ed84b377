//! Skill registry.
//!
//! Skills are registered once at startup and kept in registration order.
//! That order is the dispatcher's tie-break, so it is never changed after
//! construction. Enablement lives outside the registry in an
//! [`EnablementStore`]; every query that filters by it reads the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use chorus_platform::preferences::EnablementStore;
use chorus_types::{ChorusError, Result, SkillInfo};

use crate::skill::{Skill, SkillContext};

/// Availability and enablement of one registered skill.
#[derive(Debug, Clone, Serialize)]
pub struct SkillStatus {
    pub info: SkillInfo,
    pub available: bool,
    pub enabled: bool,
}

/// Ordered set of skills with unique ids.
#[derive(Default)]
pub struct SkillRegistry {
    skills: Vec<Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a skill at the end of the registration order.
    ///
    /// # Errors
    ///
    /// Returns [`ChorusError::DuplicateSkill`] if the id is taken.
    pub fn register(&mut self, skill: Arc<dyn Skill>) -> Result<()> {
        if self.get(skill.id()).is_some() {
            return Err(ChorusError::DuplicateSkill {
                id: skill.id().to_string(),
            });
        }
        debug!(skill = %skill.id(), position = self.skills.len(), "registered skill");
        self.skills.push(skill);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Skill>> {
        self.skills.iter().find(|s| s.id() == id)
    }

    /// All skills in registration order.
    pub fn all(&self) -> &[Arc<dyn Skill>] {
        &self.skills
    }

    pub fn ids(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Read the enablement map, treating a store failure as "all enabled".
    async fn enablement(&self, prefs: &dyn EnablementStore) -> BTreeMap<String, bool> {
        match prefs.snapshot().await {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "failed to read skill preferences, assuming defaults");
                BTreeMap::new()
            }
        }
    }

    /// Skills that are both enabled and available, in registration order.
    pub async fn list_enabled_available(
        &self,
        ctx: &SkillContext,
        prefs: &dyn EnablementStore,
    ) -> Vec<Arc<dyn Skill>> {
        let enabled = self.enablement(prefs).await;
        self.skills
            .iter()
            .filter(|s| enabled.get(s.id()).copied().unwrap_or(true))
            .filter(|s| s.is_available(ctx))
            .cloned()
            .collect()
    }

    /// Status of every registered skill, for a settings surface.
    pub async fn statuses(
        &self,
        ctx: &SkillContext,
        prefs: &dyn EnablementStore,
    ) -> Vec<SkillStatus> {
        let enabled = self.enablement(prefs).await;
        self.skills
            .iter()
            .map(|s| SkillStatus {
                info: s.info().clone(),
                available: s.is_available(ctx),
                enabled: enabled.get(s.id()).copied().unwrap_or(true),
            })
            .collect()
    }

    /// Persist an enablement preference for a registered skill.
    ///
    /// # Errors
    ///
    /// Returns [`ChorusError::UnknownSkill`] for an unregistered id, or the
    /// store's error if writing fails.
    pub async fn set_enabled(
        &self,
        id: &str,
        enabled: bool,
        prefs: &dyn EnablementStore,
    ) -> Result<()> {
        if self.get(id).is_none() {
            return Err(ChorusError::UnknownSkill { id: id.to_string() });
        }
        prefs.set(id, enabled).await
    }
}
