//! Configuration loading, env overrides, and validation.
//!
//! Config files: `courier.toml`, `courier.yaml`, `courier.yml` or
//! `courier.json`, searched in `./` then `~/.config/courier/`.
//!
//! The bot token may also come from `COURIER_TELEGRAM_TOKEN` or `TOKEN`,
//! including values set in `.token/token.env` or `.env`.

pub mod env;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    env::{
        STORE_PATH_ENV_VAR, TOKEN_ENV_VARS, apply_env_overrides, apply_env_overrides_with,
        load_dotenv,
    },
    error::{ConfigError, Result},
    loader::{config_dir, data_dir, discover_and_load, find_config_file, load_config},
    schema::{CourierConfig, PairingConfig, RelayConfig, StoreConfig, TelegramConfig},
};
