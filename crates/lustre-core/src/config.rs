use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `.env` templates with blank values work.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = optional("DATABASE_URL");
    let env = parse_environment(&or_default("LUSTRE_ENV", "development"))?;

    let bind_addr = parse("LUSTRE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("LUSTRE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("LUSTRE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("LUSTRE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("LUSTRE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let admin_password = optional("LUSTRE_ADMIN_PASSWORD");
    let session_secret = optional("LUSTRE_SESSION_SECRET");
    if admin_password.is_some() && session_secret.is_none() && env != Environment::Development
    {
        return Err(ConfigError::MissingEnvVar(
            "LUSTRE_SESSION_SECRET".to_string(),
        ));
    }

    let storage_url = optional("LUSTRE_STORAGE_URL").map(|u| u.trim_end_matches('/').to_string());
    let shipping_rates_path = PathBuf::from(or_default(
        "LUSTRE_SHIPPING_RATES_PATH",
        "./config/shipping_rates.yaml",
    ));
    let local_state_dir = PathBuf::from(or_default("LUSTRE_LOCAL_STATE_DIR", "./.lustre"));

    let llm_api_key = optional("LUSTRE_LLM_API_KEY");
    let llm_base_url = or_default("LUSTRE_LLM_BASE_URL", "https://api.openai.com/v1");
    let llm_model = or_default("LUSTRE_LLM_MODEL", "gpt-4o-mini");
    let llm_timeout_secs = parse_u64("LUSTRE_LLM_TIMEOUT_SECS", "30")?;

    let import_concurrency = parse_usize("LUSTRE_IMPORT_CONCURRENCY", "4")?;
    if import_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "LUSTRE_IMPORT_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        admin_password,
        session_secret,
        storage_url,
        shipping_rates_path,
        local_state_dir,
        llm_api_key,
        llm_base_url,
        llm_model,
        llm_timeout_secs,
        import_concurrency,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LUSTRE_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
