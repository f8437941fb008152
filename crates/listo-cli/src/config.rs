use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug)]
pub struct Config {
    /// Directory holding the persisted state file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Layered configuration: `listo.toml` in the working directory,
    /// overridden by `LISTO_*` environment variables.
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("listo.toml"))
            .merge(Env::prefixed("LISTO_"))
            .extract()
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".listo"))
        .unwrap_or_else(|| PathBuf::from(".listo"))
}
