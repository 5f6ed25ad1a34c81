use std::net::SocketAddr;

use crate::payment::PaymentEnvironment;

/// Application-level constants
pub const APP_NAME: &str = "Healthbook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND: &str = "0.0.0.0:8080";
/// Lifetime of a signed video room token.
pub const ROOM_TOKEN_TTL_SECS: i64 = 2 * 60 * 60;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "healthbook=info,tower_http=info"
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
}

#[derive(Clone)]
pub struct PaymentConfig {
    pub client_id: String,
    pub client_secret: String,
    pub environment: PaymentEnvironment,
}

#[derive(Clone)]
pub struct VideoConfig {
    pub app_id: u32,
    pub server_secret: String,
}

/// Direct-upload target handed to clients; documents never pass through us.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    pub payment: PaymentConfig,
    pub video: VideoConfig,
    pub uploads: UploadConfig,
    pub public_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &'static str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| {
                    tracing::info!("{key} not set, using default: {default}");
                    default.to_string()
                })
        };

        let bind_addr: SocketAddr = optional("HEALTHBOOK_BIND", DEFAULT_BIND)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "HEALTHBOOK_BIND",
                reason: e.to_string(),
            })?;

        let environment: PaymentEnvironment = optional("CASHFREE_ENV", "sandbox")
            .parse()
            .map_err(|reason| ConfigError::Invalid {
                key: "CASHFREE_ENV",
                reason,
            })?;

        let app_id: u32 = required("ZEGO_APP_ID")?
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "ZEGO_APP_ID",
                reason: e.to_string(),
            })?;

        let server_secret = required("ZEGO_SERVER_SECRET")?;
        if server_secret.len() != 32 {
            return Err(ConfigError::Invalid {
                key: "ZEGO_SERVER_SECRET",
                reason: format!("expected 32 characters, got {}", server_secret.len()),
            });
        }

        let public_base_url = required("PUBLIC_BASE_URL")?;
        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "PUBLIC_BASE_URL",
                reason: "must start with http:// or https://".into(),
            });
        }

        Ok(Self {
            bind_addr,
            store: StoreConfig {
                url: required("SUPABASE_URL")?,
                anon_key: required("SUPABASE_ANON_KEY")?,
                service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            },
            payment: PaymentConfig {
                client_id: required("CASHFREE_CLIENT_ID")?,
                client_secret: required("CASHFREE_CLIENT_SECRET")?,
                environment,
            },
            video: VideoConfig {
                app_id,
                server_secret,
            },
            uploads: UploadConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                upload_preset: required("CLOUDINARY_UPLOAD_PRESET")?,
            },
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        [
            ("SUPABASE_URL", "https://xyz.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("CASHFREE_CLIENT_ID", "cf-id"),
            ("CASHFREE_CLIENT_SECRET", "cf-secret"),
            ("ZEGO_APP_ID", "123456789"),
            ("ZEGO_SERVER_SECRET", "0123456789abcdef0123456789abcdef"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_UPLOAD_PRESET", "reports"),
            ("PUBLIC_BASE_URL", "https://book.example.com/"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn loads_with_defaults() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.payment.environment, PaymentEnvironment::Sandbox);
        assert_eq!(config.video.app_id, 123456789);
        assert_eq!(config.public_base_url, "https://book.example.com");
    }

    #[test]
    fn missing_required_variable_is_named() {
        let mut env = full_env();
        env.remove("SUPABASE_SERVICE_ROLE_KEY");
        assert_eq!(
            load(&env).err(),
            Some(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))
        );
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("CASHFREE_CLIENT_ID", "   ".into());
        assert_eq!(load(&env).err(), Some(ConfigError::Missing("CASHFREE_CLIENT_ID")));
    }

    #[test]
    fn rejects_short_video_secret() {
        let mut env = full_env();
        env.insert("ZEGO_SERVER_SECRET", "tooshort".into());
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid { key: "ZEGO_SERVER_SECRET", .. })
        ));
    }

    #[test]
    fn rejects_unknown_payment_environment() {
        let mut env = full_env();
        env.insert("CASHFREE_ENV", "staging".into());
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid { key: "CASHFREE_ENV", .. })
        ));
    }

    #[test]
    fn app_name_is_healthbook() {
        assert_eq!(APP_NAME, "Healthbook");
    }
}
