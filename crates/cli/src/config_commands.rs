use std::path::{Path, PathBuf};

use {anyhow::Result, clap::Subcommand, courier_config::ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Load and validate the configuration and report what it resolves to.
    Check,
}

pub fn handle_config(
    action: &ConfigAction,
    config_path: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<()> {
    match action {
        ConfigAction::Check => check(config_path, data_dir),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config_path: Option<&Path>, data_dir: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .or_else(courier_config::find_config_file);

    // Print which file we're checking
    if let Some(ref path) = path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let loaded = match &path {
        Some(path) => courier_config::load_config(path),
        None => courier_config::discover_and_load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("  {BOLD}{RED}error{RESET} {e}");
            std::process::exit(1);
        },
    };

    let mut errors: Vec<ConfigError> = Vec::new();
    if let Err(e) = config.validate() {
        errors.push(e);
    }
    if let Err(e) = config.telegram.require_token() {
        errors.push(e);
    }

    let data_dir: PathBuf = data_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(courier_config::data_dir);
    let token = if config.telegram.has_token() {
        "present"
    } else {
        "missing"
    };
    eprintln!("  {CYAN}store{RESET}        {}", config.store.resolve(&data_dir).display());
    eprintln!("  {CYAN}token{RESET}        {token}");
    eprintln!("  {CYAN}pairing ttl{RESET}  {}s", config.pairing.ttl_secs);
    eprintln!("  {CYAN}relay tag{RESET}    {}", config.relay.tag);
    eprintln!("  {CYAN}auto-claim{RESET}   {}", config.telegram.auto_claim_prefix);
    eprintln!();

    for e in &errors {
        eprintln!("  {BOLD}{RED}error{RESET} {e}");
    }

    if errors.is_empty() {
        eprintln!("No issues found.");
        Ok(())
    } else {
        eprintln!("\n{} error(s)", errors.len());
        std::process::exit(1);
    }
}
