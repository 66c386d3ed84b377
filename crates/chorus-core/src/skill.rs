//! The [`Skill`] trait and the context every skill runs in.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use chorus_platform::permissions::PermissionChecker;
use chorus_sentences::{RecognizerData, SentenceTable};
use chorus_types::{Locale, SkillInfo};

use crate::error::SkillError;
use crate::numbers::NumberParser;
use crate::output::SkillOutput;
use crate::recognizer::{Recognizer, Slots, StandardRecognizer};

/// Ambient environment shared by every skill during a dispatch.
///
/// Cheap to clone; all collaborators are reference counted.
#[derive(Clone)]
pub struct SkillContext {
    locale: Locale,
    sentences: Arc<SentenceTable>,
    permissions: Arc<dyn PermissionChecker>,
    number_parser: Option<Arc<dyn NumberParser>>,
}

impl SkillContext {
    pub fn new(
        locale: Locale,
        sentences: Arc<SentenceTable>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            locale,
            sentences,
            permissions,
            number_parser: None,
        }
    }

    /// Attach a number parser.
    pub fn with_number_parser(mut self, parser: Arc<dyn NumberParser>) -> Self {
        self.number_parser = Some(parser);
        self
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn sentences(&self) -> &SentenceTable {
        &self.sentences
    }

    pub fn permissions(&self) -> &dyn PermissionChecker {
        self.permissions.as_ref()
    }

    pub fn number_parser(&self) -> Option<&Arc<dyn NumberParser>> {
        self.number_parser.as_ref()
    }

    /// Compiled data for `section_id` in the current locale.
    pub fn section(&self, section_id: &str) -> Option<Arc<RecognizerData>> {
        self.sentences.section(&self.locale, section_id)
    }

    /// Whether `section_id` exists for the current locale.
    pub fn has_section(&self, section_id: &str) -> bool {
        self.sentences.is_section_available(&self.locale, section_id)
    }
}

impl fmt::Debug for SkillContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillContext")
            .field("locale", &self.locale)
            .field("has_number_parser", &self.number_parser.is_some())
            .finish_non_exhaustive()
    }
}

/// A self-contained intent handler.
///
/// Most skills are backed by one sentence section: they return its id from
/// [`section_id`](Self::section_id) and rely on the default
/// [`recognizers`](Self::recognizers) and
/// [`is_available`](Self::is_available). Continuation skills built at run
/// time (choosers, confirmations) override `recognizers` instead.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Static metadata.
    fn info(&self) -> &SkillInfo;

    /// Unique skill id.
    fn id(&self) -> &str {
        &self.info().id
    }

    /// Sentence section this skill is recognized by, if any.
    fn section_id(&self) -> Option<&str> {
        None
    }

    /// Recognizers for the context's locale.
    fn recognizers(&self, ctx: &SkillContext) -> Vec<Arc<dyn Recognizer>> {
        self.section_id()
            .and_then(|id| ctx.section(id))
            .map(|data| vec![Arc::new(StandardRecognizer::new(data)) as Arc<dyn Recognizer>])
            .unwrap_or_default()
    }

    /// Every needed permission is granted and the section, if any, exists
    /// for the current locale.
    fn is_available(&self, ctx: &SkillContext) -> bool {
        ctx.permissions().all_granted(&self.info().needed_permissions)
            && self.section_id().is_none_or(|id| ctx.has_section(id))
    }

    /// Run the skill with the slots extracted by the winning recognizer.
    async fn execute(
        &self,
        slots: &Slots,
        ctx: &SkillContext,
    ) -> Result<Box<dyn SkillOutput>, SkillError>;
}

impl fmt::Debug for dyn Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Skill").field("id", &self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MessageOutput;
    use chorus_platform::permissions::StaticPermissions;
    use chorus_sentences::compile_sources;
    use chorus_types::Permission;

    struct Weather {
        info: SkillInfo,
    }

    #[async_trait]
    impl Skill for Weather {
        fn info(&self) -> &SkillInfo {
            &self.info
        }

        fn section_id(&self) -> Option<&str> {
            Some("weather")
        }

        async fn execute(
            &self,
            _slots: &Slots,
            _ctx: &SkillContext,
        ) -> Result<Box<dyn SkillOutput>, SkillError> {
            Ok(Box::new(MessageOutput::new("sunny")))
        }
    }

    fn ctx(tag: &str, permissions: StaticPermissions) -> SkillContext {
        let report = compile_sources([(
            Locale::parse("en").unwrap(),
            "weather.sentences",
            "weather: medium\nhow is the weather\n",
        )]);
        SkillContext::new(
            Locale::parse(tag).unwrap(),
            Arc::new(report.table),
            Arc::new(permissions),
        )
    }

    fn weather() -> Weather {
        Weather {
            info: SkillInfo::new("weather", "Weather").with_permissions([Permission::Location]),
        }
    }

    #[test]
    fn available_needs_permission_and_section() {
        let skill = weather();
        assert!(skill.is_available(&ctx("en-us", StaticPermissions::all())));
        assert!(!skill.is_available(&ctx("en", StaticPermissions::default())));
        assert!(!skill.is_available(&ctx("it", StaticPermissions::all())));
    }

    #[test]
    fn default_recognizers_follow_locale() {
        let skill = weather();
        assert_eq!(skill.recognizers(&ctx("en", StaticPermissions::all())).len(), 1);
        assert!(skill.recognizers(&ctx("it", StaticPermissions::all())).is_empty());
    }

    #[test]
    fn context_number_parser_optional() {
        let c = ctx("en", StaticPermissions::all());
        assert!(c.number_parser().is_none());
        let c = c.with_number_parser(Arc::new(crate::numbers::EnglishNumberParser));
        assert!(c.number_parser().is_some());
    }
}
