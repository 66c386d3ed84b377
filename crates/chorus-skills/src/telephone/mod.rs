//! "Call John" and the follow-up turns that pick a number.
//!
//! The telephone skill looks the spoken name up in a [`ContactsProvider`]
//! and lists what it found. Its output then offers continuation skills:
//! a name chooser, plus an index chooser when the context can parse
//! numbers. The chosen target is dialed right away or after a yes/no
//! confirmation, depending on [`CallSettings::confirm_before_call`].

pub mod choosers;
pub mod contacts;
pub mod dialer;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use chorus_core::{Skill, SkillContext, SkillError, SkillOutput, Slots, localized};
use chorus_types::{Permission, SkillInfo};

pub use choosers::{
    CallConfirmation, CallOutput, CallSettings, ChooserMode, ConfirmCallOutput, ContactChooser,
};
pub use contacts::{Contact, ContactsProvider, StaticContacts};
pub use dialer::{CallTarget, Dialer, LoggingDialer};

/// Slot holding the spoken contact name.
pub const WHO_SLOT: &str = "who";

pub struct TelephoneSkill {
    info: SkillInfo,
    contacts: Arc<dyn ContactsProvider>,
    settings: CallSettings,
    max_results: usize,
}

impl TelephoneSkill {
    pub const ID: &'static str = "telephone";

    pub fn new(
        contacts: Arc<dyn ContactsProvider>,
        settings: CallSettings,
        max_results: usize,
    ) -> Self {
        Self {
            info: SkillInfo::new(Self::ID, "Telephone")
                .with_example("call John")
                .with_icon("call")
                .with_permissions([Permission::ReadContacts, Permission::CallPhone]),
            contacts,
            settings,
            max_results,
        }
    }
}

#[async_trait]
impl Skill for TelephoneSkill {
    fn info(&self) -> &SkillInfo {
        &self.info
    }

    fn section_id(&self) -> Option<&str> {
        Some(Self::ID)
    }

    async fn execute(
        &self,
        slots: &Slots,
        _ctx: &SkillContext,
    ) -> Result<Box<dyn SkillOutput>, SkillError> {
        let who = slots
            .get(WHO_SLOT)
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or_else(|| SkillError::MissingSlot(WHO_SLOT.into()))?;

        let contacts = self.contacts.search(who, self.max_results).await?;
        debug!(query = %who, found = contacts.len(), "contact search");

        Ok(Box::new(TelephoneOutput {
            query: who.to_string(),
            contacts,
            settings: self.settings.clone(),
        }))
    }
}

/// The contacts found for a spoken name.
#[derive(Debug)]
pub struct TelephoneOutput {
    pub query: String,
    pub contacts: Vec<Contact>,
    settings: CallSettings,
}

impl TelephoneOutput {
    /// One target per contact, using its first number.
    fn first_numbers(&self) -> Vec<CallTarget> {
        self.contacts
            .iter()
            .filter_map(|c| c.numbers.first().map(|n| CallTarget::new(&c.name, n)))
            .collect()
    }

    /// One target per (contact, number) pair, in listing order.
    fn all_numbers(&self) -> Vec<CallTarget> {
        self.contacts
            .iter()
            .flat_map(|c| c.numbers.iter().map(|n| CallTarget::new(&c.name, n)))
            .collect()
    }
}

impl SkillOutput for TelephoneOutput {
    fn speech_output(&self, ctx: &SkillContext) -> String {
        match self.contacts.len() {
            0 => localized(
                ctx,
                format!("I could not find any contact named {}", self.query),
                format!("Non ho trovato nessun contatto di nome {}", self.query),
            ),
            1 => localized(
                ctx,
                format!("I found {}, who should I call?", self.contacts[0].name),
                format!("Ho trovato {}, chi devo chiamare?", self.contacts[0].name),
            ),
            n => localized(
                ctx,
                format!("I found {n} contacts, who should I call?"),
                format!("Ho trovato {n} contatti, chi devo chiamare?"),
            ),
        }
    }

    fn next_skills(&self, ctx: &SkillContext) -> Vec<Arc<dyn Skill>> {
        if self.contacts.is_empty() {
            return Vec::new();
        }
        let mut skills: Vec<Arc<dyn Skill>> = vec![Arc::new(ContactChooser::new(
            ChooserMode::Name,
            self.first_numbers(),
            self.settings.clone(),
        ))];
        if ctx.number_parser().is_some() {
            skills.push(Arc::new(ContactChooser::new(
                ChooserMode::Index,
                self.all_numbers(),
                self.settings.clone(),
            )));
        }
        skills
    }

    fn presentation(&self, ctx: &SkillContext) -> Value {
        json!({
            "kind": "telephone",
            "query": self.query,
            "contacts": self.contacts,
            "speech": self.speech_output(ctx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::EnglishNumberParser;
    use chorus_platform::permissions::StaticPermissions;
    use chorus_sentences::SentenceTable;
    use chorus_types::Locale;

    fn ctx(tag: &str) -> SkillContext {
        SkillContext::new(
            Locale::parse(tag).unwrap(),
            Arc::new(SentenceTable::new()),
            Arc::new(StaticPermissions::all()),
        )
    }

    fn skill() -> TelephoneSkill {
        let contacts = StaticContacts::new(vec![
            Contact {
                name: "John".into(),
                numbers: vec!["123".into()],
            },
            Contact {
                name: "Jonathan".into(),
                numbers: vec!["456".into(), "789".into()],
            },
        ]);
        TelephoneSkill::new(
            Arc::new(contacts),
            CallSettings {
                dialer: Arc::new(LoggingDialer),
                confirm_before_call: false,
            },
            5,
        )
    }

    #[tokio::test]
    async fn lists_matches_and_offers_choosers() {
        let slots = Slots::new().with(WHO_SLOT, "john");
        let output = skill().execute(&slots, &ctx("en")).await.unwrap();
        assert_eq!(output.speech_output(&ctx("en")), "I found 2 contacts, who should I call?");

        let plain: Vec<String> = output
            .next_skills(&ctx("en"))
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(plain, vec![ContactChooser::NAME_ID]);

        let with_numbers = ctx("en").with_number_parser(Arc::new(EnglishNumberParser));
        let ids: Vec<String> = output
            .next_skills(&with_numbers)
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids, vec![ContactChooser::NAME_ID, ContactChooser::INDEX_ID]);

        let presentation = output.presentation(&ctx("en"));
        assert_eq!(presentation["contacts"][1]["numbers"][1], "789");
    }

    #[tokio::test]
    async fn unknown_contact_offers_nothing() {
        let slots = Slots::new().with(WHO_SLOT, "peter");
        let output = skill().execute(&slots, &ctx("it")).await.unwrap();
        assert_eq!(
            output.speech_output(&ctx("it")),
            "Non ho trovato nessun contatto di nome peter"
        );
        assert!(output.next_skills(&ctx("it")).is_empty());
    }

    #[tokio::test]
    async fn missing_name_is_an_error() {
        let err = skill().execute(&Slots::new(), &ctx("en")).await.unwrap_err();
        assert!(matches!(err, SkillError::MissingSlot(ref s) if s == WHO_SLOT));
    }

    #[test]
    fn index_targets_flatten_numbers() {
        let output = TelephoneOutput {
            query: "jo".into(),
            contacts: vec![
                Contact {
                    name: "A".into(),
                    numbers: vec!["1".into(), "2".into()],
                },
                Contact {
                    name: "B".into(),
                    numbers: vec!["3".into()],
                },
            ],
            settings: CallSettings {
                dialer: Arc::new(LoggingDialer),
                confirm_before_call: false,
            },
        };
        assert_eq!(output.first_numbers().len(), 2);
        let all = output.all_numbers();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1], CallTarget::new("A", "2"));
    }
}
