//! `chorus config` -- display resolved configuration.
//!
//! # Examples
//!
//! ```text
//! chorus config show
//! chorus config show --config ./chorus.json
//! ```

use chorus_types::config::Config;

/// Display the resolved configuration as formatted JSON.
pub fn config_show(config: &Config) {
    match render(config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: failed to serialize config: {e}"),
    }
}

fn render(config: &Config) -> serde_json::Result<String> {
    serde_json::to_string_pretty(config)
}
