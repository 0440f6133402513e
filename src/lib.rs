use serde::Deserialize;
use std::net::SocketAddr;

pub mod auth;
pub mod environment;
pub mod extractor;
pub mod handler;
pub mod server;
pub mod store;

pub use environment::{Auth0Config, EnvironmentConfig, Profile};

/// Run-time server settings, read from `COFFEE_SHOP_*` variables.
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    /// Overrides the address taken from `apiServerUrl`.
    #[serde(default)]
    pub bind: Option<SocketAddr>,
    /// Start with the house drink in the table.
    #[serde(default = "default_seed")]
    pub seed: bool,
}

fn default_seed() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_from_env_vars() {
        let settings: Settings = envy::prefixed("COFFEE_SHOP_")
            .from_iter(vec![
                ("COFFEE_SHOP_BIND".to_owned(), "0.0.0.0:8080".to_owned()),
                ("COFFEE_SHOP_SEED".to_owned(), "false".to_owned()),
            ])
            .unwrap();

        assert_eq!(settings.bind, Some(SocketAddr::from(([0, 0, 0, 0], 8080))));
        assert!(!settings.seed);
    }

    #[test]
    fn settings_defaults() {
        let settings: Settings = envy::prefixed("COFFEE_SHOP_")
            .from_iter(Vec::<(String, String)>::new())
            .unwrap();

        assert_eq!(settings.bind, None);
        assert!(settings.seed);
    }
}
