use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;

/// Load a layered configuration: `.env`, then an optional `<file_stem>.{toml,yaml,json}`
/// file, then `<ENV_PREFIX>__SECTION__KEY` environment variables.
pub fn load_layered<T: DeserializeOwned>(file_stem: &str, env_prefix: &str) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::with_name(file_stem).required(false))
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
