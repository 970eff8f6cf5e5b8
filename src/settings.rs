use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub debug: bool,
    pub enable_swagger: bool,
    pub port: u16,
    pub admin_username: String,
    pub admin_password: String,
    pub seed_defaults: bool,
    /// IANA zone used for timed iCalendar events.
    pub timezone: String,
    pub public_url: Url,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_PORT, APP_ADMIN_PASSWORD, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("debug", false)?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("admin_username", "admin")?
            .set_default("admin_password", "password")?
            .set_default("seed_defaults", true)?
            .set_default("timezone", "Europe/London")?
            .set_default("public_url", "http://localhost:8080/")?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.tz()?;
        Ok(settings)
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| ConfigError::Message(format!("invalid timezone {}: {err}", self.timezone)))
    }
}
