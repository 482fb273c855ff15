use crate::api::client::DEFAULT_BASE_URL;

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub bind_addr: String,
    /// Adds the `Secure` attribute to the session cookie.
    pub secure_cookies: bool,
    /// Browser origin allowed to call with credentials.
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| {
            let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let secure_cookies = match lookup("COOKIE_SECURE").as_deref() {
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            _ => ["RAILWAY_ENVIRONMENT", "RENDER", "FLY_APP_NAME", "PRODUCTION"]
                .iter()
                .any(|key| lookup(key).is_some()),
        };

        let cors_origin = lookup("CORS_ORIGIN").filter(|v| !v.trim().is_empty());

        Self {
            api_base_url,
            bind_addr,
            secure_cookies,
            cors_origin,
        }
    }
}
