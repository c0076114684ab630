use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

/// Settings of one invocation, read from `.env`, an optional `oj-report.{toml,yaml,json}`
/// file in the working directory, and `OJ_`-prefixed environment variables.
#[derive(serde::Deserialize, Debug)]
pub struct Settings {
    /// Base URL of the OnlineJudge deployment, e.g. `https://oj.example.edu`.
    pub site: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Points for a problem accepted on the first attempt.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub full_points: f64,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // A missing .env file is fine, the variables may be set in the environment
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let mut builder = config::Config::builder().set_default("full_points", 100.)?;
    // `SITE` is accepted as a fallback for `OJ_SITE`
    if let Ok(site) = std::env::var("SITE") {
        builder = builder.set_default("site", site)?;
    }
    builder
        .add_source(config::File::with_name("oj-report").required(false))
        .add_source(config::Environment::with_prefix("OJ"))
        .build()?
        .try_deserialize()
}
