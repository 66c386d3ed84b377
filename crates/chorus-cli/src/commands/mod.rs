//! CLI command implementations for `chorus`.
//!
//! - [`chat`] -- Interactive or single-utterance conversation.
//! - [`skills_cmd`] -- Skill listing and enablement.
//! - [`sentences_cmd`] -- Sentence compilation.
//! - [`config_cmd`] -- Configuration display.

pub mod chat;
pub mod config_cmd;
pub mod sentences_cmd;
pub mod skills_cmd;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use chorus_core::{DispatchOptions, Dispatcher, EnglishNumberParser, SkillContext, SkillRegistry};
use chorus_platform::Platform;
use chorus_platform::fs::NativeFileSystem;
use chorus_platform::permissions::StaticPermissions;
use chorus_platform::preferences::FileEnablementStore;
use chorus_sentences::compile_tree;
use chorus_skills::{Builtins, FallbackSkill, builtin_table};
use chorus_types::config::Config;

/// Load configuration from the given path override or via auto-discovery.
///
/// If `config_override` is provided, loads from that path. Otherwise,
/// uses the discovery chain:
/// 1. `CHORUS_CONFIG` env var
/// 2. `~/.chorus/config.json`
///
/// Returns a default `Config` if no config file is found.
pub async fn load_config<P: Platform>(
    platform: &P,
    config_override: Option<&str>,
) -> anyhow::Result<Config> {
    chorus_platform::config_loader::load_config(
        platform.fs(),
        platform.env(),
        config_override.map(Path::new),
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))
}

/// Everything a command needs to run turns or inspect skills.
pub struct Engine {
    pub dispatcher: Arc<Dispatcher>,
    pub prefs: Arc<FileEnablementStore>,
    pub ctx: SkillContext,
}

impl Engine {
    pub fn registry(&self) -> &SkillRegistry {
        self.dispatcher.registry()
    }
}

/// Build the engine described by `config`.
///
/// The embedded sentences are compiled first; sections from
/// `sentences.dir` replace built-in sections with the same id. Sentence
/// files that fail to compile are logged and skipped.
pub fn build_engine(config: &Config) -> anyhow::Result<Engine> {
    let locale = config.locale.parsed()?;

    // The compiler logs each file it skips.
    let mut table = builtin_table().table;
    if let Some(dir) = config.sentences.dir_path() {
        match compile_tree(&dir) {
            Ok(extra) => table.merge(extra.table),
            Err(e) => warn!(dir = %dir.display(), error = %e, "skipping sentence directory"),
        }
    }

    let prefs = Arc::new(FileEnablementStore::new(
        Arc::new(NativeFileSystem),
        config.skills.state_path(),
        config.skills.enabled.clone(),
    ));

    let mut registry = SkillRegistry::new();
    Builtins::from_config(&config.telephone).register(&mut registry)?;
    debug!(skills = ?registry.ids(), "registered skills");

    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        prefs.clone(),
        DispatchOptions::from(&config.dispatch),
    )
    .with_fallback(Arc::new(FallbackSkill::new()));

    let permissions = StaticPermissions::new(config.permissions.granted.iter().copied());
    let mut ctx = SkillContext::new(locale, Arc::new(table), Arc::new(permissions));
    if ctx.locale().language() == "en" {
        ctx = ctx.with_number_parser(Arc::new(EnglishNumberParser));
    }

    Ok(Engine {
        dispatcher: Arc::new(dispatcher),
        prefs,
        ctx,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    use chorus_types::config::Config;

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    pub fn temp_dir(prefix: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        std::env::temp_dir().join(format!("chorus_cli_{prefix}_{pid}_{id}"))
    }

    /// A config whose state file lives in a fresh temp dir.
    pub fn isolated_config(prefix: &str) -> Config {
        let mut config = Config::default();
        config.skills.state_file = temp_dir(prefix)
            .join("skills.json")
            .to_string_lossy()
            .into_owned();
        config
    }
}
