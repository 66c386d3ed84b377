//! Per-locale sentence tables.
//!
//! A [`SentenceTable`] maps each [`Locale`] to the sections compiled for
//! it. Lookups walk the locale's fallback chain (`en-us` then `en`), so a
//! regional locale sees its base language's sections. The table is
//! immutable once built and cheap to share: sections are stored behind
//! [`Arc`] and handed out to recognizers without copying.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use chorus_types::Locale;

use crate::model::RecognizerData;

/// Sections compiled for one locale, keyed by section id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleSections {
    sections: BTreeMap<String, Arc<RecognizerData>>,
}

impl LocaleSections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a section, replacing any previous one with the same id.
    pub fn insert(&mut self, data: RecognizerData) -> Option<Arc<RecognizerData>> {
        self.sections.insert(data.section_id.clone(), Arc::new(data))
    }

    pub fn get(&self, section_id: &str) -> Option<&Arc<RecognizerData>> {
        self.sections.get(section_id)
    }

    pub fn contains(&self, section_id: &str) -> bool {
        self.sections.contains_key(section_id)
    }

    /// Section ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<RecognizerData>)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Immutable mapping from locale to compiled sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentenceTable {
    locales: BTreeMap<Locale, LocaleSections>,
}

impl SentenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sections of `locale`.
    pub fn insert_locale(&mut self, locale: Locale, sections: LocaleSections) {
        self.locales.insert(locale, sections);
    }

    /// Locales present in the table, sorted.
    pub fn locales(&self) -> impl Iterator<Item = &Locale> {
        self.locales.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    /// The sections of the first locale in `locale`'s fallback chain that
    /// has an entry, if any.
    pub fn for_locale(&self, locale: &Locale) -> Option<&LocaleSections> {
        locale
            .fallback_chain()
            .iter()
            .find_map(|candidate| self.locales.get(candidate))
    }

    /// Look up one section for `locale`.
    ///
    /// Each step of the fallback chain is searched for the section, so a
    /// regional table that lacks a section still sees the base language's.
    pub fn section(&self, locale: &Locale, section_id: &str) -> Option<Arc<RecognizerData>> {
        locale
            .fallback_chain()
            .iter()
            .filter_map(|candidate| self.locales.get(candidate))
            .find_map(|sections| sections.get(section_id).cloned())
    }

    /// Whether `section_id` resolves for `locale`.
    pub fn is_section_available(&self, locale: &Locale, section_id: &str) -> bool {
        self.section(locale, section_id).is_some()
    }

    /// Union of section ids across all locales, sorted.
    pub fn section_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.locales.values().flat_map(LocaleSections::ids).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Overlay `other` onto this table. Sections in `other` replace
    /// sections with the same locale and id.
    pub fn merge(&mut self, other: SentenceTable) {
        for (locale, sections) in other.locales {
            let target = self.locales.entry(locale).or_default();
            for (id, data) in sections.sections {
                target.sections.insert(id, data);
            }
        }
    }

    /// Serialize the whole table to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a table previously written by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
