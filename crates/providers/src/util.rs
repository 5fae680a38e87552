//! Shared utility functions for provider adapters.

use bargein_domain::config::AuthConfig;
use bargein_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence: `env` (preferred) then the plaintext `key` field.
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref env_var) = auth.env {
        return std::env::var(env_var).map_err(|_| {
            Error::Auth(format!(
                "environment variable '{}' not set or not valid UTF-8",
                env_var
            ))
        });
    }

    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key' — prefer 'env' instead"
        );
        return Ok(key.clone());
    }

    Err(Error::Auth(
        "no API key configured: set 'env' or 'key' in AuthConfig".into(),
    ))
}

/// Build the `(header_name, header_value)` pair used to authenticate a
/// request, applying `auth.header`/`auth.prefix` overrides with the usual
/// `Authorization: Bearer <key>` default.
pub fn auth_header(auth: &AuthConfig, key: &str) -> (String, String) {
    let header = auth.header.clone().unwrap_or_else(|| "Authorization".into());
    let prefix = auth.prefix.clone().unwrap_or_else(|| "Bearer ".into());
    (header, format!("{prefix}{key}"))
}

/// Retry a fallible call up to `max_retries` additional times on transient
/// errors (`Error::Timeout`/`Error::Http`), with a short linear backoff.
/// Non-transient errors (auth, config, a provider's own error body) return
/// immediately without consuming a retry.
pub(crate) async fn retry_transient<F, Fut, T>(max_retries: u32, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e @ (Error::Timeout(_) | Error::Http(_))) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(attempt, max_retries, error = %e, "transient provider error, retrying");
                tokio::time::sleep(std::time::Duration::from_millis(200 * attempt as u64)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_api_key_env_takes_precedence_over_key() {
        let var_name = "BARGEIN_TEST_RESOLVE_ENV_KEY_1234";
        std::env::set_var(var_name, "env-secret-value");
        let auth = AuthConfig {
            env: Some(var_name.into()),
            key: Some("should-not-win".into()),
            ..Default::default()
        };
        let result = resolve_api_key(&auth).unwrap();
        assert_eq!(result, "env-secret-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_plaintext_fallback() {
        let auth = AuthConfig {
            key: Some("sk-test-123".into()),
            ..Default::default()
        };
        let result = resolve_api_key(&auth).unwrap();
        assert_eq!(result, "sk-test-123");
    }

    #[test]
    fn resolve_api_key_env_var_missing() {
        let auth = AuthConfig {
            env: Some("BARGEIN_TEST_NONEXISTENT_VAR_8888".into()),
            ..Default::default()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("BARGEIN_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn resolve_api_key_no_config() {
        let auth = AuthConfig::default();
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(err.to_string().contains("no API key configured"));
    }

    #[test]
    fn auth_header_default_is_bearer() {
        let auth = AuthConfig::default();
        let (name, value) = auth_header(&auth, "abc");
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer abc");
    }

    #[test]
    fn auth_header_respects_overrides() {
        let auth = AuthConfig {
            header: Some("api-key".into()),
            prefix: Some(String::new()),
            ..Default::default()
        };
        let (name, value) = auth_header(&auth, "abc");
        assert_eq!(name, "api-key");
        assert_eq!(value, "abc");
    }
}
