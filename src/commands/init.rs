use crate::config::{Config, DEFAULT_CONFIG_FILE};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const REPOS_TEMPLATE: &str = r#"# Repositories to collect from, one per line.
# Format: owner/name (GitHub) or a full clone URL / local path
"#;

const CONFIG_HEADER: &str = "# rtl-collector configuration\n# YOSYS_BINARY in the environment overrides synth.yosys_binary\n\n";

pub fn init_command(dir: &Path) -> Result<()> {
    let config_path = dir.join(DEFAULT_CONFIG_FILE);

    if config_path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first if you want to reinitialize.",
            DEFAULT_CONFIG_FILE
        );
    }

    let config = Config::default();
    let contents = format!("{}{}", CONFIG_HEADER, config.to_toml()?);
    fs::write(&config_path, contents)
        .with_context(|| format!("Failed to create {}", DEFAULT_CONFIG_FILE))?;
    println!("Created {}", DEFAULT_CONFIG_FILE);

    let repos_path = dir.join(&config.repos_file);
    if repos_path.exists() {
        println!("  Keeping existing {}", config.repos_file.display());
    } else {
        fs::write(&repos_path, REPOS_TEMPLATE)
            .with_context(|| format!("Failed to create {}", config.repos_file.display()))?;
        println!("  Created {}", config.repos_file.display());
    }

    println!("\n✓ rtl-collector initialized.");
    println!("Add repositories to {} and run 'rtl-collector collect'.", config.repos_file.display());

    Ok(())
}
