use std::env;

/// Per-IP request limits for the browser-facing endpoints. 0 disables a tier.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub strict_rpm: u32,
    pub standard_rpm: u32,
    pub relaxed_rpm: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strict_rpm: 30,
            standard_rpm: 60,
            relaxed_rpm: 120,
        }
    }
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self {
            strict_rpm: 0,
            standard_rpm: 0,
            relaxed_rpm: 0,
        }
    }

    fn from_env() -> Self {
        let defaults = Self::default();
        let rpm = |name: &str, default: u32| {
            env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            strict_rpm: rpm("RATE_LIMIT_STRICT_RPM", defaults.strict_rpm),
            standard_rpm: rpm("RATE_LIMIT_STANDARD_RPM", defaults.standard_rpm),
            relaxed_rpm: rpm("RATE_LIMIT_RELAXED_RPM", defaults.relaxed_rpm),
        }
    }
}

/// Secrets and policy for verifying requests signed by the platform.
#[derive(Clone)]
pub struct SigningConfig {
    /// App client secret. Signs OAuth-style query-string requests.
    pub client_secret: Option<String>,
    /// Webhook secret. Signs callback bodies; falls back to the client secret.
    pub webhook_secret: Option<String>,
    pub timestamp_tolerance_secs: i64,
    /// Allows flagged demo traffic through. Only ever true in dev mode.
    pub allow_demo_bypass: bool,
}

impl SigningConfig {
    pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.client_secret())
    }
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &Option<String>| s.as_ref().map(|_| "<redacted>");
        f.debug_struct("SigningConfig")
            .field("client_secret", &redact(&self.client_secret))
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("timestamp_tolerance_secs", &self.timestamp_tolerance_secs)
            .field("allow_demo_bypass", &self.allow_demo_bypass)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub dev_mode: bool,
    pub signing: SigningConfig,
    pub rate_limit: RateLimitConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("ITEM_PROTECTION_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let signing = SigningConfig {
            client_secret: env::var("SHOPLAZZA_CLIENT_SECRET").ok(),
            webhook_secret: env::var("SHOPLAZZA_WEBHOOK_SECRET").ok(),
            timestamp_tolerance_secs: env::var("HMAC_TIMESTAMP_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(SigningConfig::DEFAULT_TOLERANCE_SECS),
            allow_demo_bypass: dev_mode,
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "item_protection.db".to_string()),
            base_url,
            dev_mode,
            signing,
            rate_limit: RateLimitConfig::from_env(),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
