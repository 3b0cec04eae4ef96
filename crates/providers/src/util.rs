//! Shared utility functions for provider adapters.

use rw_domain::config::AuthConfig;
use rw_domain::error::{Error, Result};

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
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `service` + `account` → OS keychain via `keyring`
/// 3. `env` field (reads environment variable)
/// 4. Fallback for keychain setups: env var `{SERVICE}_{ACCOUNT}` uppercased
/// 5. [`Error::MissingCredential`]
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; \
             prefer 'env' or keychain 'service'+'account'"
        );
        return non_empty(key.clone());
    }

    if let (Some(ref service), Some(ref account)) = (&auth.service, &auth.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) => return non_empty(secret),
            Err(e) => {
                tracing::warn!(
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(ref env_var) = auth.env {
        if let Ok(val) = std::env::var(env_var) {
            return non_empty(val);
        }
        tracing::debug!(env_var = %env_var, "API key env var not set");
    }

    if let (Some(ref service), Some(ref account)) = (&auth.service, &auth.account) {
        let fallback_var = keychain_fallback_env_name(service, account);
        if let Ok(val) = std::env::var(&fallback_var) {
            tracing::info!(
                env_var = %fallback_var,
                "API key resolved from keychain headless fallback env var"
            );
            return non_empty(val);
        }
    }

    Err(Error::MissingCredential)
}

fn non_empty(key: String) -> Result<String> {
    let key = key.trim().to_string();
    if key.is_empty() {
        Err(Error::MissingCredential)
    } else {
        Ok(key)
    }
}

/// OpenAI keys start with `sk-`.
pub fn validate_openai_key(key: &str) -> Result<()> {
    if key.starts_with("sk-") {
        Ok(())
    } else {
        Err(Error::InvalidCredential(
            "OpenAI API keys start with 'sk-'".into(),
        ))
    }
}

/// Try to read a secret from the OS keychain.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Config(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Config(format!("keyring get_password failed: {e}")))
}

/// Build the headless fallback env var name for a keychain service/account.
///
/// Example: `("reportwright", "openai-api-key")` → `"REPORTWRIGHT_OPENAI_API_KEY"`.
pub fn keychain_fallback_env_name(service: &str, account: &str) -> String {
    format!(
        "{}_{}",
        service.to_uppercase().replace('-', "_"),
        account.to_uppercase().replace('-', "_"),
    )
}
