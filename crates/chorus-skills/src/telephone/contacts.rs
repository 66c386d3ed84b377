//! Contact lookup with fuzzy name matching.

use async_trait::async_trait;
use serde::Serialize;

use chorus_core::SkillError;
use chorus_types::config::ContactEntry;

/// Largest name distance still considered a match.
pub const MAX_NAME_DISTANCE: usize = 2;

/// Shortest query that may match a name by its prefix.
pub const MIN_PREFIX_QUERY: usize = 3;

/// A contact with one or more phone numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: String,
    pub numbers: Vec<String>,
}

impl From<&ContactEntry> for Contact {
    fn from(entry: &ContactEntry) -> Self {
        Self {
            name: entry.name.clone(),
            numbers: entry.numbers.clone(),
        }
    }
}

/// Looks up contacts by spoken name.
#[async_trait]
pub trait ContactsProvider: Send + Sync {
    /// Contacts matching `query`, best first, at most `limit`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Contact>, SkillError>;
}

/// A fixed contact list, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticContacts {
    contacts: Vec<Contact>,
}

impl StaticContacts {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    pub fn from_entries(entries: &[ContactEntry]) -> Self {
        Self::new(entries.iter().map(Contact::from).collect())
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[async_trait]
impl ContactsProvider for StaticContacts {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Contact>, SkillError> {
        Ok(rank_contacts(query, &self.contacts, limit))
    }
}

/// Contacts within [`MAX_NAME_DISTANCE`] of `query`, sorted by distance
/// then name, capped at `limit`. Contacts without numbers are skipped.
pub fn rank_contacts(query: &str, contacts: &[Contact], limit: usize) -> Vec<Contact> {
    let mut ranked: Vec<(usize, &Contact)> = contacts
        .iter()
        .filter(|c| !c.numbers.is_empty())
        .filter_map(|c| {
            let d = name_distance(query, &c.name);
            (d <= MAX_NAME_DISTANCE).then_some((d, c))
        })
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(&b.1.name)));
    ranked.into_iter().take(limit).map(|(_, c)| c.clone()).collect()
}

/// Distance between a spoken query and a contact name.
///
/// `0` is an exact (case-insensitive) match. Otherwise the query is
/// compared with the whole name and, at one extra cost, with each of its
/// words. Each comparison is the full edit distance, or one more than
/// the distance to a prefix of about the query's length when that
/// prefix is at most one edit away, so "John" ranks "John" before
/// "Jonathan" but still finds both. Queries shorter than
/// [`MIN_PREFIX_QUERY`] characters only match by full edit distance.
pub fn name_distance(query: &str, name: &str) -> usize {
    let query = query.trim().to_lowercase();
    let name = name.trim().to_lowercase();
    if query.is_empty() {
        return usize::MAX;
    }
    if query == name {
        return 0;
    }

    let whole = word_distance(&query, &name);
    let best_word = name
        .split_whitespace()
        .map(|word| word_distance(&query, word).saturating_add(1))
        .min()
        .unwrap_or(usize::MAX);
    whole.min(best_word)
}

fn word_distance(query: &str, target: &str) -> usize {
    let full = levenshtein_distance(query, target);

    let q_len = query.chars().count();
    let t_chars: Vec<char> = target.chars().collect();
    if q_len < MIN_PREFIX_QUERY || t_chars.len() <= q_len {
        return full;
    }

    let prefix = (q_len - 1..=q_len + 1)
        .filter(|&k| k <= t_chars.len())
        .map(|k| {
            let prefix: String = t_chars[..k].iter().collect();
            levenshtein_distance(query, &prefix)
        })
        .min();

    match prefix {
        Some(d) if d <= 1 => full.min(d + 1),
        _ => full,
    }
}

/// Levenshtein edit distance between two strings, by characters.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, numbers: &[&str]) -> Contact {
        Contact {
            name: name.into(),
            numbers: numbers.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
        assert_eq!(levenshtein_distance("àb", "ab"), 1);
    }

    #[test]
    fn name_distance_rules() {
        assert_eq!(name_distance("John", "john"), 0);
        assert_eq!(name_distance("jon", "John"), 1);
        assert_eq!(name_distance("john", "Jonathan"), 2);
        assert_eq!(name_distance("mary", "Mary Ann Smith"), 1);
        assert_eq!(name_distance("smith", "Mary Ann Smith"), 1);
        assert!(name_distance("peter", "John") > MAX_NAME_DISTANCE);
        assert!(name_distance("no", "Jonathan") > MAX_NAME_DISTANCE);
        assert!(name_distance("on", "Jonathan") > MAX_NAME_DISTANCE);
        assert!(name_distance("on", "Antonio") > MAX_NAME_DISTANCE);
        assert_eq!(name_distance("no", "Nora"), 2);
        assert_eq!(name_distance("  ", "John"), usize::MAX);
    }

    #[test]
    fn ranks_by_distance_then_name() {
        let contacts = vec![
            contact("Jonathan", &["456"]),
            contact("John", &["123"]),
            contact("Joan", &["789"]),
            contact("Peter", &["000"]),
            contact("Johnny", &[]),
        ];
        let names: Vec<String> = rank_contacts("John", &contacts, 10)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["John", "Joan", "Jonathan"]);
    }

    #[test]
    fn ranking_respects_limit() {
        let contacts = vec![contact("Ann", &["1"]), contact("Anne", &["2"]), contact("Anna", &["3"])];
        assert_eq!(rank_contacts("ann", &contacts, 2).len(), 2);
    }

    #[tokio::test]
    async fn static_provider_searches() {
        let provider = StaticContacts::from_entries(&[ContactEntry {
            name: "Mario Rossi".into(),
            numbers: vec!["+39 123".into()],
        }]);
        let found = provider.search("mario", 5).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(provider.search("luigi", 5).await.unwrap().is_empty());
    }
}
