//! Sentence file compilation.
//!
//! [`compile_source`] turns the text of one file into its sections. The
//! batch entry points ([`compile_dir`], [`compile_tree`],
//! [`compile_sources`]) compile many files best-effort: a file that fails
//! is reported and excluded, the others still land in the table.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use chorus_types::{CompileError, Locale, Result};

use crate::model::{PatternElement, RecognizerData, Specificity};
use crate::parser::{self, ExpandError};
use crate::table::{LocaleSections, SentenceTable};

/// Maximum number of concrete paths one sentence may expand into.
pub const MAX_ALTERNATIVES: usize = 1024;

/// File extension of sentence files.
pub const SENTENCE_FILE_EXTENSION: &str = "sentences";

/// Outcome of compiling one locale's files.
#[derive(Debug, Clone, Default)]
pub struct LocaleCompilation {
    /// Sections from every file that compiled.
    pub sections: LocaleSections,
    /// One entry per file that failed.
    pub errors: Vec<CompileError>,
    /// Number of files that compiled successfully.
    pub files_compiled: usize,
}

/// Outcome of a batch compilation across locales.
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub table: SentenceTable,
    pub errors: Vec<CompileError>,
}

impl CompileReport {
    /// Whether every file compiled.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

struct SectionBuilder {
    id: String,
    specificity: Specificity,
    sentences: Vec<Vec<PatternElement>>,
    seen: HashSet<Vec<PatternElement>>,
}

impl SectionBuilder {
    fn finish(self, file: &str) -> std::result::Result<RecognizerData, CompileError> {
        if self.sentences.is_empty() {
            return Err(CompileError::Empty {
                file: file.to_string(),
                reason: format!("section '{}' has no sentences", self.id),
            });
        }
        Ok(RecognizerData {
            section_id: self.id,
            specificity: self.specificity,
            sentences: self.sentences,
        })
    }
}

/// Strip a trailing comment and `;`, then surrounding whitespace.
fn clean_line(raw: &str) -> &str {
    let line = raw.split('#').next().unwrap_or("").trim();
    line.strip_suffix(';').map(str::trim_end).unwrap_or(line)
}

/// Compile the text of one sentence file.
///
/// `file` is used only for error messages. Sections are returned in
/// declaration order.
pub fn compile_source(
    file: &str,
    content: &str,
) -> std::result::Result<Vec<RecognizerData>, CompileError> {
    let syntax = |line: usize, reason: String| CompileError::Syntax {
        file: file.to_string(),
        line,
        reason,
    };

    let mut sections: Vec<RecognizerData> = Vec::new();
    let mut declared: HashSet<String> = HashSet::new();
    let mut current: Option<SectionBuilder> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }

        if let Some((id, level)) = line.split_once(':') {
            let id = id.trim();
            if !parser::is_identifier(id) {
                return Err(syntax(line_no, format!("invalid section id '{id}'")));
            }
            let specificity: Specificity = level.trim().parse().map_err(|e| syntax(line_no, e))?;
            if !declared.insert(id.to_string()) {
                return Err(CompileError::DuplicateSection {
                    file: file.to_string(),
                    line: line_no,
                    section: id.to_string(),
                });
            }
            if let Some(done) = current.take() {
                sections.push(done.finish(file)?);
            }
            current = Some(SectionBuilder {
                id: id.to_string(),
                specificity,
                sentences: Vec::new(),
                seen: HashSet::new(),
            });
            continue;
        }

        let Some(section) = current.as_mut() else {
            return Err(syntax(line_no, "sentence before any section header".into()));
        };

        let nodes = parser::parse_sentence(line).map_err(|reason| syntax(line_no, reason))?;
        let paths = parser::expand(&nodes, MAX_ALTERNATIVES).map_err(|e| match e {
            ExpandError::Syntax(reason) => syntax(line_no, reason),
            ExpandError::TooManyAlternatives => CompileError::TooManyAlternatives {
                file: file.to_string(),
                line: line_no,
                limit: MAX_ALTERNATIVES,
            },
        })?;

        for path in paths {
            if section.seen.insert(path.clone()) {
                section.sentences.push(path);
            }
        }
    }

    if let Some(done) = current.take() {
        sections.push(done.finish(file)?);
    }
    if sections.is_empty() {
        return Err(CompileError::Empty {
            file: file.to_string(),
            reason: "no sections declared".into(),
        });
    }
    Ok(sections)
}

/// Compile an ordered list of already-read files for one locale.
///
/// A file whose section id was already defined by an earlier file fails
/// as a whole with [`CompileError::DuplicateSection`].
fn compile_files(
    files: Vec<(String, std::result::Result<String, CompileError>)>,
) -> LocaleCompilation {
    let mut out = LocaleCompilation::default();
    let mut defined: HashSet<String> = HashSet::new();

    for (name, content) in files {
        let result = content.and_then(|text| {
            let sections = compile_source(&name, &text)?;
            if let Some(dup) = sections.iter().find(|s| defined.contains(&s.section_id)) {
                let line = header_line(&text, &dup.section_id).unwrap_or(1);
                return Err(CompileError::DuplicateSection {
                    file: name.clone(),
                    line,
                    section: dup.section_id.clone(),
                });
            }
            Ok(sections)
        });

        match result {
            Ok(sections) => {
                debug!(file = %name, sections = sections.len(), "compiled sentence file");
                for data in sections {
                    defined.insert(data.section_id.clone());
                    out.sections.insert(data);
                }
                out.files_compiled += 1;
            }
            Err(e) => {
                warn!(file = %name, error = %e, "skipping sentence file");
                out.errors.push(e);
            }
        }
    }

    out
}

fn header_line(text: &str, section_id: &str) -> Option<usize> {
    text.lines().enumerate().find_map(|(idx, raw)| {
        let (id, _) = clean_line(raw).split_once(':')?;
        (id.trim() == section_id).then_some(idx + 1)
    })
}

/// Compile every `*.sentences` file in one locale directory.
///
/// Files are processed in name order. `prefix` is prepended to file names
/// in error messages (e.g. the locale directory name).
///
/// # Errors
///
/// Fails only if the directory itself cannot be listed; unreadable or
/// invalid files are reported in [`LocaleCompilation::errors`].
pub fn compile_dir(dir: &Path, prefix: &str) -> Result<LocaleCompilation> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(SENTENCE_FILE_EXTENSION)
        {
            paths.push(path);
        }
    }
    paths.sort();

    let files = paths
        .into_iter()
        .map(|path| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let name = if prefix.is_empty() {
                file_name
            } else {
                format!("{prefix}/{file_name}")
            };
            let content = std::fs::read_to_string(&path).map_err(|e| CompileError::Unreadable {
                file: name.clone(),
                reason: e.to_string(),
            });
            (name, content)
        })
        .collect();

    Ok(compile_files(files))
}

/// Compile a `<root>/<locale>/*.sentences` tree.
///
/// Subdirectories whose name is not a valid locale tag are ignored. A
/// locale none of whose files compiled is left out of the table.
///
/// A locale directory that cannot be listed is reported as an
/// [`CompileError::Unreadable`] for that locale; the others still compile.
///
/// # Errors
///
/// Fails only if `root` itself cannot be listed.
pub fn compile_tree(root: &Path) -> Result<CompileReport> {
    let mut dirs: Vec<(Locale, PathBuf, String)> = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match Locale::parse(&name) {
            Ok(locale) => dirs.push((locale, path, name)),
            Err(_) => warn!(dir = %path.display(), "ignoring directory that is not a locale tag"),
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(compile_locale_dirs(dirs))
}

fn compile_locale_dirs(dirs: Vec<(Locale, PathBuf, String)>) -> CompileReport {
    let mut report = CompileReport::default();
    for (locale, path, name) in dirs {
        let compiled = match compile_dir(&path, &name) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(
                    locale = %locale,
                    dir = %path.display(),
                    error = %e,
                    "cannot list locale directory"
                );
                report.errors.push(CompileError::Unreadable {
                    file: name,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        report.errors.extend(compiled.errors);
        if compiled.files_compiled == 0 {
            warn!(locale = %locale, "no sentence file compiled, skipping locale");
            continue;
        }
        info!(
            locale = %locale,
            files = compiled.files_compiled,
            sections = compiled.sections.len(),
            "compiled locale"
        );
        report.table.insert_locale(locale, compiled.sections);
    }
    report
}

/// Compile in-memory sources given as `(locale, file name, content)`.
///
/// Used for sentence files embedded in the binary. Within a locale, files
/// are compiled in name order regardless of iteration order.
pub fn compile_sources<'a, I>(sources: I) -> CompileReport
where
    I: IntoIterator<Item = (Locale, &'a str, &'a str)>,
{
    let mut by_locale: BTreeMap<Locale, Vec<(String, &'a str)>> = BTreeMap::new();
    for (locale, name, content) in sources {
        let qualified = format!("{locale}/{name}");
        by_locale.entry(locale).or_default().push((qualified, content));
    }

    let mut report = CompileReport::default();
    for (locale, mut files) in by_locale {
        files.sort_by(|a, b| a.0.cmp(&b.0));
        let compiled = compile_files(
            files
                .into_iter()
                .map(|(name, content)| (name, Ok(content.to_string())))
                .collect(),
        );
        report.errors.extend(compiled.errors);
        if compiled.files_compiled > 0 {
            report.table.insert_locale(locale, compiled.sections);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatternElement::{Capture, Word};

    const TELEPHONE: &str = "\
# calling people
telephone: high
(call|phone) .who.
[please] dial .who.;
";

    #[test]
    fn compiles_sections_in_order() {
        let src = "a: low\nfoo\n\nb: high\nbar baz\n";
        let sections = compile_source("x.sentences", src).unwrap();
        let ids: Vec<&str> = sections.iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(sections[1].specificity, Specificity::High);
    }

    #[test]
    fn comments_and_semicolons_stripped() {
        let sections = compile_source("t.sentences", TELEPHONE).unwrap();
        assert_eq!(sections.len(), 1);
        let s = &sections[0].sentences;
        assert_eq!(s.len(), 4);
        assert_eq!(s[0], vec![Word("call".into()), Capture("who".into())]);
        assert_eq!(s[3], vec![Word("dial".into()), Capture("who".into())]);
    }

    #[test]
    fn duplicate_paths_across_sentences_kept_once() {
        let sections = compile_source("d.sentences", "s: low\nhello\n[hi] hello\n").unwrap();
        assert_eq!(sections[0].sentences.len(), 2);
    }

    #[test]
    fn sentence_before_header() {
        let err = compile_source("e.sentences", "hello\ns: low\n").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { line: 1, .. }));
    }

    #[test]
    fn unknown_specificity() {
        let err = compile_source("e.sentences", "s: extreme\nhello\n").unwrap_err();
        assert!(err.to_string().contains("unknown specificity"));
    }

    #[test]
    fn invalid_section_id() {
        let err = compile_source("e.sentences", "Bad Id: low\nhello\n").unwrap_err();
        assert!(err.to_string().contains("invalid section id"));
    }

    #[test]
    fn duplicate_section_in_file() {
        let err = compile_source("e.sentences", "s: low\na\ns: high\nb\n").unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateSection {
                file: "e.sentences".into(),
                line: 3,
                section: "s".into(),
            }
        );
    }

    #[test]
    fn empty_section_and_empty_file() {
        assert!(matches!(
            compile_source("e.sentences", "s: low\nt: low\nhello\n"),
            Err(CompileError::Empty { .. })
        ));
        assert!(matches!(
            compile_source("e.sentences", "# nothing\n"),
            Err(CompileError::Empty { .. })
        ));
    }

    #[test]
    fn too_many_alternatives_reports_line() {
        let src = format!("s: low\nok\n{}\n", "(a|b) ".repeat(11));
        let err = compile_source("big.sentences", &src).unwrap_err();
        assert!(matches!(
            err,
            CompileError::TooManyAlternatives { line: 3, limit: MAX_ALTERNATIVES, .. }
        ));
    }

    #[test]
    fn compile_sources_excludes_failures_and_cross_file_duplicates() {
        let en = Locale::parse("en").unwrap();
        let report = compile_sources([
            (en.clone(), "b.sentences", "time: medium\nwhat time is it\n"),
            (en.clone(), "a.sentences", TELEPHONE),
            (en.clone(), "c.sentences", "time: low\nclock\n"),
            (en.clone(), "d.sentences", "broken: low\n(oops\n"),
        ]);

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].file(), "en/c.sentences");
        assert!(matches!(report.errors[0], CompileError::DuplicateSection { line: 1, .. }));
        assert_eq!(report.errors[1].file(), "en/d.sentences");

        let sections = report.table.for_locale(&en).unwrap();
        assert_eq!(sections.ids().collect::<Vec<_>>(), vec!["telephone", "time"]);
        assert_eq!(sections.get("time").unwrap().specificity, Specificity::Medium);
    }

    #[test]
    fn compile_sources_skips_locale_without_successes() {
        let it = Locale::parse("it").unwrap();
        let report = compile_sources([(it.clone(), "x.sentences", "(")]);
        assert!(!report.is_clean());
        assert!(report.table.for_locale(&it).is_none());
    }

    #[test]
    fn unlistable_locale_dir_is_reported_not_fatal() {
        let root = std::env::temp_dir().join(format!(
            "chorus_sentences_unlistable_{}",
            std::process::id()
        ));
        let en = root.join("en");
        std::fs::create_dir_all(&en).unwrap();
        std::fs::write(en.join("t.sentences"), TELEPHONE).unwrap();

        let report = compile_locale_dirs(vec![
            (Locale::parse("en").unwrap(), en, "en".into()),
            (Locale::parse("it").unwrap(), root.join("it"), "it".into()),
        ]);

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            CompileError::Unreadable { file, .. } if file == "it"
        ));
        assert!(report.table.for_locale(&Locale::parse("en").unwrap()).is_some());

        let _ = std::fs::remove_dir_all(&root);
    }
}
