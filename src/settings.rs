// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::rpc::parse_commitment;
use config::{Config, ConfigError, File};
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, metadata, File as FsFile};
use std::io::Write;
use std::path::{Path, PathBuf};
use struct_field_names_as_array::FieldNamesAsArray;

pub const DEFAULT_TOKEN_PRICE_SOL: f64 = 0.000045;

const ENV_PREFIX: &str = "shibartum";

/// Plain deployment variables, mapped to settings keys.
///
/// Client side (`VITE_`) names come first so that the server side names win
/// when both are set.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("VITE_OWNER_PUBLIC_KEY", "presale.owner_public_key"),
    ("VITE_TOKEN_PRICE_SOL", "presale.token_price_sol"),
    ("VITE_SOLANA_NETWORK", "presale.network_name"),
    ("VITE_TOKEN_SYMBOL", "presale.token_symbol"),
    ("VITE_TOKEN_NAME", "presale.token_name"),
    ("VITE_TOTAL_SUPPLY", "presale.total_supply"),
    ("VITE_API_BASE_URL", "client.api_base_url"),
    ("OWNER_PUBLIC_KEY", "presale.owner_public_key"),
    ("TOKEN_MINT_ADDRESS", "presale.token_mint_address"),
    ("TOKEN_PRICE_SOL", "presale.token_price_sol"),
    ("SOLANA_NETWORK", "presale.network_name"),
    ("PORT", "network.port"),
];

const NETWORK_NAMES: &[&str] = &["mainnet", "testnet", "devnet"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, FieldNamesAsArray)]
pub struct Settings {
    /// HTTP server settings.
    pub network: Network,

    /// Presale parameters shared by the server and the client.
    pub presale: Presale,

    /// Purchase client settings.
    pub client: Client,
}

impl Settings {
    /// Loads settings from the configuration file and the process environment,
    /// creating the configuration file with defaults if it does not exist.
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = config_file_path();

        if let Some(path) = config_path.as_deref() {
            write_default_config(path);
        }

        Self::load(config_path.as_deref(), std::env::vars())
    }

    /// Layers, lowest precedence first: defaults, `config_file`, legacy
    /// environment variables, `SHIBARTUM_<SECTION>_<KEY>` overrides.
    pub fn load<I>(config_file: Option<&Path>, env_vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env_source: HashMap<String, String> = env_vars.into_iter().collect();
        let default_settings = Settings::default();
        let mut s = Config::builder();

        if let Some(path) = config_file {
            s = s.add_source(File::from(path).required(false));
        }

        // Set defaults
        let defaults: HashMap<String, HashMap<String, DynamicConfVal>> = serde_yaml::to_value(
            &default_settings,
        )
        .and_then(serde_yaml::from_value)
        .map_err(|err| ConfigError::Message(err.to_string()))?;

        for (k1, inner) in &defaults {
            for (k2, v) in inner {
                let key = format!("{k1}.{k2}");

                match v {
                    DynamicConfVal::String(v) => {
                        s = s.set_default(key, v.as_str())?;
                    }

                    DynamicConfVal::Option(v) => {
                        if let Some(v) = v {
                            s = s.set_default(key, v.as_str())?;
                        }
                    }

                    DynamicConfVal::Bool(v) => {
                        s = s.set_default(key, v.to_string())?;
                    }

                    DynamicConfVal::U16(v) => {
                        s = s.set_default(key, v.to_string())?;
                    }

                    DynamicConfVal::U64(v) => {
                        s = s.set_default(key, v.to_string())?;
                    }

                    DynamicConfVal::F64(v) => {
                        s = s.set_default(key, v.to_string())?;
                    }
                }
            }
        }

        for (env_key, key) in LEGACY_ENV_KEYS {
            if let Some(v) = env_source.get(*env_key) {
                if legacy_value_usable(key, v) {
                    s = s.set_override(*key, v.as_str())?;
                }
            }
        }

        // Make sure to list these in order
        let settings_modules: Vec<&[&str]> = vec![
            &Network::FIELD_NAMES_AS_ARRAY[..],
            &Presale::FIELD_NAMES_AS_ARRAY[..],
            &Client::FIELD_NAMES_AS_ARRAY[..],
        ];

        // Gather all possible settings keys
        let possible_keys: HashMap<String, String> = Settings::FIELD_NAMES_AS_ARRAY
            .iter()
            .enumerate()
            .flat_map(|(i, section)| {
                settings_modules[i].iter().map(move |nested| {
                    (
                        format!("{}_{}_{}", ENV_PREFIX, section, nested.replace('_', "")),
                        format!("{section}.{nested}"),
                    )
                })
            })
            .collect();

        // Parse env vars manually and set overrides if they exist as the
        // config package `Environment` module seems to behave poorly.
        for (k, v) in &env_source {
            if let Some(key) = possible_keys.get(&k.to_lowercase()) {
                // Filter empty values
                if v.is_empty() {
                    continue;
                }

                s = s.set_override(key.as_str(), v.as_str())?;
            }
        }

        s.build()?.try_deserialize()
    }

    /// Returns a list of configuration problems. An empty list means the
    /// settings are usable for taking purchases.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if !self.presale.owner_key_configured() {
            errors.push("OWNER_PUBLIC_KEY is not configured".to_owned());
        }

        if self.presale.token_price_sol <= 0.0 {
            errors.push("TOKEN_PRICE_SOL must be greater than 0".to_owned());
        }

        if !NETWORK_NAMES.contains(&self.presale.network_name.as_str()) {
            errors.push(format!(
                "Invalid network name: {}",
                self.presale.network_name
            ));
        }

        if parse_commitment(&self.client.commitment).is_err() {
            errors.push(format!("Invalid commitment: {}", self.client.commitment));
        }

        errors
    }
}

fn config_file_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("Shibartum");
    path.push("config.toml");
    Some(path)
}

fn write_default_config(path: &Path) {
    if metadata(path).is_ok() {
        return;
    }

    let settings_str = match toml::ser::to_string_pretty(&Settings::default()) {
        Ok(settings_str) => settings_str,
        Err(err) => {
            error!("Failed to serialize default configuration! Reason: {:#?}", err);
            return;
        }
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap_or(());
    }

    // Create configuration file
    match FsFile::create(path) {
        Ok(mut file) => {
            file.write_all(settings_str.as_bytes()).unwrap_or(());
        }
        Err(err) => {
            // If this fails, do nothing and fall back to envionment variables
            error!("Failed to create configuration! Reason: {:#?}", err);
        }
    }
}

/// Numeric variables that do not parse to a non-zero value fall back to the default.
fn legacy_value_usable(key: &str, value: &str) -> bool {
    match key {
        "presale.token_price_sol" => value
            .trim()
            .parse::<f64>()
            .map(|v| v.is_finite() && v != 0.0)
            .unwrap_or(false),
        "presale.total_supply" => value.trim().parse::<u64>().map(|v| v != 0).unwrap_or(false),
        "network.port" => value.trim().parse::<u16>().map(|v| v != 0).unwrap_or(false),
        _ => !value.is_empty(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Network {
    /// HTTP listen address.
    pub listen_addr: String,

    /// HTTP listen port.
    pub port: u16,

    /// Directory holding the built front-end. Files are served for every
    /// non API route, falling back to `index.html`.
    pub static_dir: Option<String>,

    /// Number of runtime worker threads.
    ///
    /// Default is 0 which means the number of cores of the system
    pub worker_threads: u16,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_owned(),
            port: 8080,
            static_dir: Some("frontend/dist".to_owned()),
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Presale {
    /// Account receiving purchase payments.
    pub owner_public_key: String,

    /// Mint of the presale token.
    pub token_mint_address: String,

    /// Price of one token in SOL.
    pub token_price_sol: f64,

    /// Cluster name. One of `mainnet`, `testnet` or `devnet`.
    pub network_name: String,

    pub token_symbol: String,

    pub token_name: String,

    pub total_supply: u64,

    /// Active pricing stage, see [`crate::pricing`].
    pub current_stage: u8,
}

impl Presale {
    /// Placeholder keys shipped in example environments contain `REPLACE`.
    pub fn owner_key_configured(&self) -> bool {
        !self.owner_public_key.is_empty() && !self.owner_public_key.contains("REPLACE")
    }
}

impl Default for Presale {
    fn default() -> Self {
        Self {
            owner_public_key: String::new(),
            token_mint_address: String::new(),
            token_price_sol: DEFAULT_TOKEN_PRICE_SOL,
            network_name: "devnet".to_owned(),
            token_symbol: "SBT".to_owned(),
            token_name: "Shibartum".to_owned(),
            total_supply: 1_000_000_000,
            current_stage: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Client {
    /// Base url of the presale backend.
    pub api_base_url: String,

    /// Blockchain RPC endpoint. Derived from the network name when not set.
    pub rpc_url: Option<String>,

    /// Commitment level awaited after submitting a payment.
    pub commitment: String,

    /// Delay between two signature status queries.
    pub confirm_poll_interval_ms: u64,

    /// Status queries performed before a confirmation is given up.
    pub confirm_max_attempts: u16,

    /// Keypair file of the paying wallet.
    pub keypair_path: String,

    /// Local purchase history file.
    pub history_file: String,
}

impl Client {
    pub fn rpc_url(&self, network_name: &str) -> String {
        match self.rpc_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_owned(),
            _ => default_rpc_url(network_name).to_owned(),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        let mut keypair_path = dirs::home_dir().unwrap_or_default();
        keypair_path.push(".config");
        keypair_path.push("solana");
        keypair_path.push("id.json");

        let mut history_file = dirs::data_dir().unwrap_or_default();
        history_file.push("Shibartum");
        history_file.push("transaction_history.json");

        Self {
            api_base_url: "http://localhost:8080".to_owned(),
            rpc_url: None,
            commitment: "confirmed".to_owned(),
            confirm_poll_interval_ms: 500,
            confirm_max_attempts: 60,
            keypair_path: keypair_path.to_string_lossy().into_owned(),
            history_file: history_file.to_string_lossy().into_owned(),
        }
    }
}

pub fn default_rpc_url(network_name: &str) -> &'static str {
    match network_name {
        "mainnet" => "https://api.mainnet-beta.solana.com",
        "testnet" => "https://api.testnet.solana.com",
        _ => "https://api.devnet.solana.com",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DynamicConfVal {
    String(String),
    Option(Option<String>),
    Bool(bool),
    U16(u16),
    U64(u64),
    F64(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn it_loads_defaults() {
        let settings = Settings::load(None, vec![]).unwrap();

        assert_eq!(settings.network.port, 8080);
        assert_eq!(settings.presale.token_price_sol, DEFAULT_TOKEN_PRICE_SOL);
        assert_eq!(settings.presale.network_name, "devnet");
        assert_eq!(settings.presale.total_supply, 1_000_000_000);
        assert_eq!(settings.presale.token_symbol, "SBT");
        assert_eq!(settings.client.confirm_max_attempts, 60);
        assert!(settings.client.rpc_url.is_none());
        assert!(!settings.presale.owner_key_configured());
    }

    #[test]
    fn legacy_variables_override_defaults() {
        let settings = Settings::load(
            None,
            vars(&[
                ("OWNER_PUBLIC_KEY", "11111111111111111111111111111112"),
                ("TOKEN_MINT_ADDRESS", "So11111111111111111111111111111111111111112"),
                ("TOKEN_PRICE_SOL", "0.0001"),
                ("PORT", "9000"),
                ("VITE_TOKEN_SYMBOL", "XSBT"),
            ]),
        )
        .unwrap();

        assert_eq!(
            settings.presale.owner_public_key,
            "11111111111111111111111111111112"
        );
        assert_eq!(
            settings.presale.token_mint_address,
            "So11111111111111111111111111111111111111112"
        );
        assert_eq!(settings.presale.token_price_sol, 0.0001);
        assert_eq!(settings.network.port, 9000);
        assert_eq!(settings.presale.token_symbol, "XSBT");
    }

    #[test]
    fn unusable_price_falls_back_to_default() {
        for price in ["abc", "0", ""] {
            let settings = Settings::load(None, vars(&[("TOKEN_PRICE_SOL", price)])).unwrap();
            assert_eq!(settings.presale.token_price_sol, DEFAULT_TOKEN_PRICE_SOL);
        }
    }

    #[test]
    fn server_variables_win_over_client_variables() {
        let settings = Settings::load(
            None,
            vars(&[
                ("VITE_OWNER_PUBLIC_KEY", "client-key"),
                ("OWNER_PUBLIC_KEY", "server-key"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.presale.owner_public_key, "server-key");
    }

    #[test]
    fn prefixed_variables_have_highest_precedence() {
        let settings = Settings::load(
            None,
            vars(&[
                ("TOKEN_PRICE_SOL", "0.0001"),
                ("SHIBARTUM_PRESALE_TOKENPRICESOL", "0.0002"),
                ("SHIBARTUM_NETWORK_LISTENADDR", "127.0.0.1"),
                ("shibartum_client_rpcurl", "http://localhost:8899"),
                ("SHIBARTUM_PRESALE_TOKENNAME", ""),
            ]),
        )
        .unwrap();

        assert_eq!(settings.presale.token_price_sol, 0.0002);
        assert_eq!(settings.network.listen_addr, "127.0.0.1");
        assert_eq!(settings.client.rpc_url(&settings.presale.network_name), "http://localhost:8899");
        assert_eq!(settings.presale.token_name, "Shibartum");
    }

    #[test]
    fn it_reads_config_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("shibartum-settings-{}.toml", rand::random::<u64>()));
        fs::write(
            &path,
            "[presale]\ntoken_symbol = \"FILE\"\ncurrent_stage = 3\n\n[network]\nport = 8181\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path), vars(&[("PORT", "8282")])).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(settings.presale.token_symbol, "FILE");
        assert_eq!(settings.presale.current_stage, 3);
        assert_eq!(settings.network.port, 8282);
        assert_eq!(settings.presale.token_name, "Shibartum");
    }

    #[test]
    fn missing_config_file_is_ignored() {
        let path = std::env::temp_dir().join("shibartum-does-not-exist.toml");
        let settings = Settings::load(Some(&path), vec![]).unwrap();
        assert_eq!(settings.network.port, 8080);
    }

    #[test]
    fn validate_reports_problems() {
        let mut settings = Settings::default();
        settings.presale.owner_public_key = "REPLACE_WITH_OWNER_PUBLIC_KEY".to_owned();
        settings.presale.token_price_sol = 0.0;
        settings.presale.network_name = "localnet".to_owned();

        assert_eq!(
            settings.validate(),
            vec![
                "OWNER_PUBLIC_KEY is not configured".to_owned(),
                "TOKEN_PRICE_SOL must be greater than 0".to_owned(),
                "Invalid network name: localnet".to_owned(),
            ]
        );

        settings.presale.owner_public_key = "11111111111111111111111111111112".to_owned();
        settings.presale.token_price_sol = DEFAULT_TOKEN_PRICE_SOL;
        settings.presale.network_name = "devnet".to_owned();
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn rpc_url_follows_network() {
        let client = Client::default();
        assert_eq!(client.rpc_url("mainnet"), "https://api.mainnet-beta.solana.com");
        assert_eq!(client.rpc_url("testnet"), "https://api.testnet.solana.com");
        assert_eq!(client.rpc_url("anything"), "https://api.devnet.solana.com");
    }

    #[test]
    #[serial]
    fn it_reads_process_environment() {
        std::env::set_var("SOLANA_NETWORK", "testnet");
        let settings = Settings::load(None, std::env::vars()).unwrap();
        std::env::remove_var("SOLANA_NETWORK");

        assert_eq!(settings.presale.network_name, "testnet");
    }

    #[test]
    fn default_settings_serialize_to_toml() {
        let s = toml::ser::to_string_pretty(&Settings::default()).unwrap();
        assert!(s.contains("[presale]"));
        assert!(s.contains("token_price_sol"));
    }
}
