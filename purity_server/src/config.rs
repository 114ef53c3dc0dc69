use std::{env, time::Duration};

use log::*;
use purity_common::{parse_duration_secs, Secret};
use purity_engine::{payment_flow_api::DEFAULT_MIN_GATEWAY_AMOUNT, traits::GatewayCredentials};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_TP_HOST: &str = "127.0.0.1";
const DEFAULT_TP_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/orders.db";
const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_RAZORPAY_TIMEOUT: Duration = Duration::from_secs(60);
/// Seven days.
const DEFAULT_JWT_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Redirect targets and emailed links are built on this base, e.g. `https://truepurity.in`.
    pub frontend_base: String,
    pub auth: AuthConfig,
    /// `None` when the gateway credentials are not configured. Gateway payments are then disabled.
    pub razorpay: Option<RazorpayConfig>,
    /// The Google OAuth client id. Google sign-in is disabled without it.
    pub google_client_id: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TP_HOST.to_string(),
            port: DEFAULT_TP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            frontend_base: format!("http://localhost:{DEFAULT_TP_PORT}"),
            auth: AuthConfig::default(),
            razorpay: None,
            google_client_id: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, frontend_base: format!("http://localhost:{port}"), ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TP_HOST").ok().unwrap_or_else(|| DEFAULT_TP_HOST.into());
        let port = env::var("TP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for TP_PORT. {e} Using the default, {DEFAULT_TP_PORT}, instead.");
                    DEFAULT_TP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TP_PORT);
        let database_url = env::var("TP_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ TP_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let frontend_base = env::var("TP_FRONTEND_BASE")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                let base = format!("http://localhost:{port}");
                info!("🪛️ TP_FRONTEND_BASE is not set. Redirects will point to {base}.");
                base
            });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let razorpay = RazorpayConfig::from_env();
        let google_client_id = env::var("TP_GOOGLE_CLIENT_ID").ok().filter(|s| !s.trim().is_empty());
        if google_client_id.is_none() {
            info!("🪛️ TP_GOOGLE_CLIENT_ID is not set. Google sign-in is disabled.");
        }
        Self { host, port, database_url, frontend_base, auth, razorpay, google_client_id }
    }

    pub fn options(&self) -> ServerOptions {
        ServerOptions::from_config(self)
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret that session tokens are signed with.
    pub jwt_secret: Secret<String>,
    /// How long a session token remains valid.
    pub jwt_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT operate \
             in production like this, since every restart will log all your customers out. Set TP_JWT_SECRET \
             instead. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret), jwt_expiry: Duration::from_secs(DEFAULT_JWT_EXPIRY_SECS) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, expiry: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), jwt_expiry: expiry }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("TP_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [TP_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("TP_JWT_SECRET is empty".to_string()));
        }
        let jwt_expiry = match env::var("TP_JWT_EXPIRES") {
            Ok(s) => parse_duration_secs(&s).map(Duration::from_secs).unwrap_or_else(|| {
                warn!("🪛️ Invalid configuration value for TP_JWT_EXPIRES ({s}). Using the default of 7 days.");
                Duration::from_secs(DEFAULT_JWT_EXPIRY_SECS)
            }),
            Err(_) => Duration::from_secs(DEFAULT_JWT_EXPIRY_SECS),
        };
        Ok(Self { jwt_secret: Secret::new(secret), jwt_expiry })
    }
}

//-------------------------------------------------  RazorpayConfig  ---------------------------------------------------
#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub api_url: String,
    pub timeout: Duration,
    /// The smallest order amount, in paise, that the gateway accepts.
    pub min_amount: i64,
}

impl RazorpayConfig {
    pub fn new<K: Into<String>, S: Into<String>>(key_id: K, key_secret: S) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: Secret::new(key_secret.into()),
            api_url: DEFAULT_RAZORPAY_API_URL.to_string(),
            timeout: DEFAULT_RAZORPAY_TIMEOUT,
            min_amount: DEFAULT_MIN_GATEWAY_AMOUNT,
        }
    }

    /// Returns `None`, and logs why, unless both the key id and the key secret are set.
    pub fn from_env() -> Option<Self> {
        let key_id = env::var("TP_RAZORPAY_KEY_ID").ok().filter(|s| !s.trim().is_empty());
        let key_secret = env::var("TP_RAZORPAY_KEY_SECRET").ok().filter(|s| !s.trim().is_empty());
        let (key_id, key_secret) = match (key_id, key_secret) {
            (Some(id), Some(secret)) => (id, secret),
            (None, None) => {
                warn!("🪛️ Razorpay credentials are not set. Online payments are disabled.");
                return None;
            },
            _ => {
                warn!(
                    "🪛️ Only one of TP_RAZORPAY_KEY_ID and TP_RAZORPAY_KEY_SECRET is set. Both are required, so \
                     online payments are disabled."
                );
                return None;
            },
        };
        let mut config = Self::new(key_id, key_secret);
        if let Ok(url) = env::var("TP_RAZORPAY_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(s) = env::var("TP_RAZORPAY_TIMEOUT") {
            match s.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!("🪛️ Invalid configuration value for TP_RAZORPAY_TIMEOUT ({s}). Using the default."),
            }
        }
        if let Ok(s) = env::var("TP_MIN_GATEWAY_AMOUNT") {
            match s.parse::<i64>() {
                Ok(min) if min > 0 => config.min_amount = min,
                _ => warn!("🪛️ Invalid configuration value for TP_MIN_GATEWAY_AMOUNT ({s}). Using the default."),
            }
        }
        info!("🪛️ Razorpay is enabled with key {}", Secret::new(config.key_id.clone()).masked());
        Some(config)
    }

    pub fn credentials(&self) -> GatewayCredentials {
        GatewayCredentials::new(self.key_id.clone(), self.key_secret.reveal().clone())
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers need. Generally we try to keep this as small as possible,
/// and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub frontend_base: String,
    pub google_client_id: Option<String>,
    pub gateway_enabled: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            frontend_base: config.frontend_base.clone(),
            google_client_id: config.google_client_id.clone(),
            gateway_enabled: config.razorpay.is_some(),
        }
    }

    pub fn review_page(&self, order_id: i64) -> String {
        format!("{}/review.html?id={order_id}", self.frontend_base)
    }

    pub fn failed_page(&self) -> String {
        format!("{}/order.html?failed=1", self.frontend_base)
    }

    pub fn unknown_page(&self) -> String {
        format!("{}/order.html?unknown=1", self.frontend_base)
    }

    pub fn verify_email_page(&self, token: &str) -> String {
        format!("{}/verify.html?token={token}", self.frontend_base)
    }

    pub fn reset_password_page(&self, token: &str) -> String {
        format!("{}/reset.html?token={token}", self.frontend_base)
    }
}
