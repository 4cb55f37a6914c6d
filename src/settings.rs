use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub listen: String,
}

#[derive(Debug, Deserialize)]
pub struct Otp {
    pub ttl_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub lock_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Services {
    pub channel_capacity: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub otp: Otp,
    pub store: Store,
    pub services: Services,
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.listen", "0.0.0.0:8080")?
            .set_default("otp.ttl_seconds", 300)?
            .set_default("store.lock_timeout_ms", 2000)?
            .set_default("services.channel_capacity", 512)?
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("QR_REWARDS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_defaults_and_catalog_from_file() {
        let dir = std::env::temp_dir().join(format!("qr-rewards-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[otp]
ttl_seconds = 60

[[catalog]]
code = "1AAAICP0166JM16PHE5PQNM988JS7260"

[[catalog]]
code = "2BBBICP0166JM16PHE5PQNM988JS7251"
active = false
"#
        )
        .unwrap();

        let settings = Settings::new(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.otp.ttl_seconds, 60);
        assert_eq!(settings.store.lock_timeout_ms, 2000);
        assert_eq!(settings.services.channel_capacity, 512);
        assert_eq!(settings.catalog.len(), 2);
        assert!(settings.catalog[0].active);
        assert!(!settings.catalog[1].active);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let path = std::env::temp_dir()
            .join(format!("qr-rewards-{}", uuid::Uuid::new_v4()))
            .join("missing.toml");

        assert!(Settings::new(path.to_str().unwrap()).is_err());
    }
}
