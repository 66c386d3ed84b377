//! # chorus-sentences
//!
//! Compiles declarative sentence files into [`RecognizerData`] and groups
//! the result into a per-locale [`SentenceTable`].
//!
//! # Sentence file format
//!
//! ```text
//! # comments start with '#'
//! telephone: high
//! (call|phone|dial) .who.
//! [please] give .who. a call
//!
//! current_time: medium
//! what time is it
//! (tell me|what is) the [current] time
//! ```
//!
//! A header line `section_id: specificity` opens a section; every
//! following non-empty line is one sentence, until the next header.
//! Inside a sentence:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `word` | literal word (matched case-insensitively) |
//! | `(a\|b c)` | choice between alternatives |
//! | `(a\|b)?` | optional choice |
//! | `[a b]` | optional group |
//! | `.name.` | capture slot named `name` |
//!
//! Each file compiles independently; [`compile_tree`] keeps going past
//! files that fail and reports them alongside the table.

pub mod compiler;
pub mod model;
mod parser;
pub mod table;

pub use compiler::{
    CompileReport, LocaleCompilation, MAX_ALTERNATIVES, SENTENCE_FILE_EXTENSION, compile_dir,
    compile_source, compile_sources, compile_tree,
};
pub use model::{PatternElement, RecognizerData, Specificity};
pub use table::{LocaleSections, SentenceTable};
