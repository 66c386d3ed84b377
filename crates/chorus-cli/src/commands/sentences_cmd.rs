//! `chorus sentences compile` -- compile a sentence tree to JSON.
//!
//! The directory is laid out as `<dir>/<locale>/*.sentences`. Compilation
//! is best-effort: files with errors are reported on stderr and left out,
//! everything else is written. The output is byte-identical for identical
//! input.
//!
//! # Examples
//!
//! ```text
//! chorus sentences compile ./sentences
//! chorus sentences compile ./sentences --out table.json
//! ```

use std::path::PathBuf;

use comfy_table::{Table, presets};

use chorus_sentences::{CompileReport, SentenceTable, compile_tree};

/// Compile `dir` and write the table to `out`, or stdout when `None`.
pub async fn compile(dir: &str, out: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(dir);
    let report = compile_blocking(root.clone()).await?;

    for error in &report.errors {
        eprintln!("error: {error}");
    }
    if report.table.is_empty() {
        anyhow::bail!("no sentence file under {} compiled", root.display());
    }

    let json = report.table.to_json()?;
    match out {
        Some(path) => {
            tokio::fs::write(path, json.as_bytes())
                .await
                .map_err(|e| anyhow::anyhow!("failed to write {path}: {e}"))?;
            eprintln!("{}", summary(&report.table));
            eprintln!(
                "Wrote {path} ({} file error(s))",
                report.errors.len()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn compile_blocking(root: PathBuf) -> anyhow::Result<CompileReport> {
    let report = tokio::task::spawn_blocking(move || compile_tree(&root))
        .await
        .map_err(|e| anyhow::anyhow!("compile task failed: {e}"))??;
    Ok(report)
}

/// Section ids per locale.
fn summary(table: &SentenceTable) -> Table {
    let mut out = Table::new();
    out.load_preset(presets::UTF8_FULL_CONDENSED);
    out.set_header(["LOCALE", "SECTIONS"]);
    for locale in table.locales() {
        let ids: Vec<&str> = table
            .for_locale(locale)
            .map(|s| s.ids().collect())
            .unwrap_or_default();
        out.add_row([locale.to_string(), ids.join(", ")]);
    }
    out
}
