//! `chorus skills` -- list skills and toggle their enablement.
//!
//! - `chorus skills list` -- every registered skill with availability and
//!   enablement.
//! - `chorus skills enable <id>` / `chorus skills disable <id>` -- persist
//!   a preference in the skills state file.

use clap::{Args, Subcommand};
use comfy_table::{Table, presets};

use chorus_core::SkillStatus;
use chorus_platform::NativePlatform;
use chorus_types::Permission;

use super::{Engine, build_engine, load_config};

/// Arguments for the `chorus skills` subcommand.
#[derive(Args)]
pub struct SkillsArgs {
    #[command(subcommand)]
    pub action: SkillsAction,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Subcommands for `chorus skills`.
#[derive(Subcommand)]
pub enum SkillsAction {
    /// List all skills.
    List,

    /// Enable a skill.
    Enable {
        /// Skill id.
        id: String,
    },

    /// Disable a skill.
    Disable {
        /// Skill id.
        id: String,
    },
}

/// Run the skills subcommand.
pub async fn run(args: SkillsArgs) -> anyhow::Result<()> {
    let platform = NativePlatform::new();
    let config = load_config(&platform, args.config.as_deref()).await?;
    let engine = build_engine(&config)?;

    match args.action {
        SkillsAction::List => skills_list(&engine).await,
        SkillsAction::Enable { id } => skills_set(&engine, &id, true).await,
        SkillsAction::Disable { id } => skills_set(&engine, &id, false).await,
    }
}

async fn skills_list(engine: &Engine) -> anyhow::Result<()> {
    let statuses = engine
        .registry()
        .statuses(&engine.ctx, engine.prefs.as_ref())
        .await;

    if statuses.is_empty() {
        println!("No skills registered.");
        return Ok(());
    }

    println!("{}", render_table(&statuses));
    println!();
    println!("Total: {} skill(s)", statuses.len());
    println!("Preferences: {}", engine.prefs.path().display());
    Ok(())
}

async fn skills_set(engine: &Engine, id: &str, enabled: bool) -> anyhow::Result<()> {
    engine
        .registry()
        .set_enabled(id, enabled, engine.prefs.as_ref())
        .await
        .map_err(|e| {
            anyhow::anyhow!("{e}\nUse 'chorus skills list' to see registered skills.")
        })?;
    println!(
        "Skill '{id}' {}.",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn render_table(statuses: &[SkillStatus]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(["ID", "NAME", "ENABLED", "AVAILABLE", "PERMISSIONS", "EXAMPLE"]);

    for status in statuses {
        let info = &status.info;
        table.add_row([
            info.id.clone(),
            info.name.clone(),
            yes_no(status.enabled).into(),
            yes_no(status.available).into(),
            permissions_label(&info.needed_permissions),
            info.sentence_example.clone(),
        ]);
    }
    table
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn permissions_label(permissions: &[Permission]) -> String {
    if permissions.is_empty() {
        return "-".into();
    }
    permissions
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
