use std::env;
use tracing::warn;

const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .ok()
                .and_then(|raw| match raw.parse::<i64>() {
                    Ok(hours) if hours > 0 => Some(hours),
                    _ => {
                        warn!("JWT_EXPIRY_HOURS '{}' is not a positive integer, using default", raw);
                        None
                    }
                })
                .unwrap_or(DEFAULT_JWT_EXPIRY_HOURS),
            port: env::var("PORT")
                .ok()
                .and_then(|raw| match raw.parse::<u16>() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        warn!("PORT '{}' is not a valid port, using default", raw);
                        None
                    }
                })
                .unwrap_or(DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, key: &str, secret: &str) -> AppConfig {
        AppConfig {
            supabase_url: url.to_string(),
            supabase_service_key: key.to_string(),
            jwt_secret: secret.to_string(),
            jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
            port: DEFAULT_PORT,
        }
    }

    #[test]
    fn test_is_configured_requires_database_and_secret() {
        assert!(config("http://localhost:54321", "key", "secret").is_configured());
        assert!(!config("", "key", "secret").is_configured());
        assert!(!config("http://localhost:54321", "", "secret").is_configured());
        assert!(!config("http://localhost:54321", "key", "").is_configured());
    }
}
