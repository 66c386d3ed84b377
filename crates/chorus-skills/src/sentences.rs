//! Sentence files compiled into the binary.

use chorus_sentences::{CompileReport, compile_sources};
use chorus_types::Locale;
use tracing::warn;

/// `(locale, file name, content)` for every embedded sentence file.
pub const EMBEDDED: &[(&str, &str, &str)] = &[
    (
        "en",
        "current_time.sentences",
        include_str!("../sentences/en/current_time.sentences"),
    ),
    (
        "en",
        "telephone.sentences",
        include_str!("../sentences/en/telephone.sentences"),
    ),
    (
        "en",
        "util_yes_no.sentences",
        include_str!("../sentences/en/util_yes_no.sentences"),
    ),
    (
        "it",
        "current_time.sentences",
        include_str!("../sentences/it/current_time.sentences"),
    ),
    (
        "it",
        "telephone.sentences",
        include_str!("../sentences/it/telephone.sentences"),
    ),
    (
        "it",
        "util_yes_no.sentences",
        include_str!("../sentences/it/util_yes_no.sentences"),
    ),
];

/// Compile the embedded sentence files.
///
/// Failures are logged and reported; the files that compiled are still in
/// the returned table.
pub fn builtin_table() -> CompileReport {
    let sources = EMBEDDED.iter().filter_map(|&(tag, name, content)| {
        match Locale::parse(tag) {
            Ok(locale) => Some((locale, name, content)),
            Err(e) => {
                warn!(tag, error = %e, "skipping embedded sentences with bad locale");
                None
            }
        }
    });
    compile_sources(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_sentences_compile_cleanly() {
        let report = builtin_table();
        assert!(report.is_clean(), "{:?}", report.errors);

        let ids = report.table.section_ids();
        for id in ["current_time", "telephone", "util_no", "util_yes"] {
            assert!(ids.contains(&id), "missing section {id}");
        }
    }

    #[test]
    fn every_locale_has_every_section() {
        let report = builtin_table();
        let en = Locale::parse("en").unwrap();
        let it = Locale::parse("it").unwrap();
        let en_ids: Vec<&str> = report.table.for_locale(&en).unwrap().ids().collect();
        let it_ids: Vec<&str> = report.table.for_locale(&it).unwrap().ids().collect();
        assert_eq!(en_ids, it_ids);
    }

    #[test]
    fn builtin_table_is_deterministic() {
        assert_eq!(
            builtin_table().table.to_json().unwrap(),
            builtin_table().table.to_json().unwrap()
        );
    }
}
