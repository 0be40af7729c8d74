//! Settings for the `bursar` binary, read from `settings.toml` (or any
//! format `config` understands) and overridden by `BURSAR__*` variables,
//! e.g. `BURSAR__SERVER__PORT=8080`.
use config::{Config, ConfigError, Environment, File};
use engine::Currency;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub currency: Currency,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub database: Database,
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

fn default_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("BURSAR").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn reads_a_sqlite_deployment() {
        let settings = parse(
            r#"
            [app]
            level = "debug"
            currency = "USD"

            [server]
            database = { sqlite = "bursar.db" }
            port = 3000
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.app.currency, Currency::Usd);
        assert!(matches!(settings.server.database, Database::Sqlite(ref path) if path == "bursar.db"));
        assert_eq!(settings.server.bind, None);
    }

    #[test]
    fn app_section_has_defaults() {
        let settings = parse(
            r#"
            [app]

            [server]
            database = "memory"
            port = 3000
            "#,
        );
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.app.currency, Currency::Omr);
        assert!(matches!(settings.server.database, Database::Memory));
    }
}
