//! Environment overrides and `.env` loading.

use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::debug};

use crate::schema::CourierConfig;

/// Variables that carry the bot token, highest precedence first.
pub const TOKEN_ENV_VARS: &[&str] = &["COURIER_TELEGRAM_TOKEN", "TOKEN"];

/// Overrides `store.path` when set.
pub const STORE_PATH_ENV_VAR: &str = "COURIER_STORE_PATH";

/// Dotenv files loaded by [`load_dotenv`], in order. A variable set by an
/// earlier file (or by the real environment) is not overwritten.
const DOTENV_FILES: &[&str] = &[".token/token.env", ".env"];

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut CourierConfig) {
    apply_env_overrides_with(config, |key| std::env::var(key).ok());
}

/// Apply overrides using `lookup` to read variables.
pub fn apply_env_overrides_with(
    config: &mut CourierConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let token = TOKEN_ENV_VARS.iter().find_map(|key| {
        lookup(key)
            .filter(|v| !v.trim().is_empty())
            .map(|v| (*key, v))
    });
    if let Some((key, value)) = token {
        debug!(var = key, "telegram token taken from environment");
        config.telegram.token = Secret::new(value.trim().to_string());
    }

    if let Some(path) = lookup(STORE_PATH_ENV_VAR).filter(|v| !v.trim().is_empty()) {
        config.store.path = Some(PathBuf::from(path));
    }
}

/// Load dotenv files relative to the working directory.
///
/// Returns the files that were read.
pub fn load_dotenv() -> Vec<PathBuf> {
    load_dotenv_in(Path::new("."))
}

fn load_dotenv_in(base: &Path) -> Vec<PathBuf> {
    DOTENV_FILES
        .iter()
        .map(|name| base.join(name))
        .filter(|path| match dotenvy::from_path(path) {
            Ok(()) => {
                debug!(path = %path.display(), "loaded dotenv file");
                true
            },
            Err(_) => false,
        })
        .collect()
}
