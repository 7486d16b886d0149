//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JERSEY_SHOP_BACKEND_URL` - Base URL of the hosted backend
//! - `JERSEY_SHOP_BACKEND_ANON_KEY` - Anonymous API key (high entropy)
//!
//! ## Optional
//! - `JERSEY_SHOP_SESSION_FILE` - Durable session file (default: jersey-shop-session.json)
//! - `JERSEY_SHOP_CART_KEY_POLICY` - `product` (default) or `product-size`
//! - `JERSEY_SHOP_BACKEND_TIMEOUT_SECS` - Per-request timeout; unset means none

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::models::CartKeyPolicy;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Hosted backend configuration.
    pub backend: BackendConfig,
    /// Path of the durable session file.
    pub session_file: PathBuf,
    /// Cart line identity policy.
    pub cart_key_policy: CartKeyPolicy,
}

/// Hosted backend configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the backend (data and auth APIs hang off this).
    pub base_url: String,
    /// Anonymous API key sent with every request.
    pub anon_key: SecretString,
    /// Optional per-request timeout.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("anon_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = BackendConfig::from_env()?;

        let session_file = get_env_or_default("JERSEY_SHOP_SESSION_FILE", "jersey-shop-session.json");

        let cart_key_policy =
            parse_cart_key_policy(get_optional_env("JERSEY_SHOP_CART_KEY_POLICY").as_deref())?;

        Ok(Self {
            backend,
            session_file: PathBuf::from(session_file),
            cart_key_policy,
        })
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("JERSEY_SHOP_BACKEND_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("JERSEY_SHOP_BACKEND_URL".to_string(), e.to_string())
        })?;

        let anon_key = get_validated_secret("JERSEY_SHOP_BACKEND_ANON_KEY")?;

        let timeout = match get_optional_env("JERSEY_SHOP_BACKEND_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "JERSEY_SHOP_BACKEND_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            base_url,
            anon_key,
            timeout,
        })
    }
}

/// Parse the cart identity policy setting.
fn parse_cart_key_policy(raw: Option<&str>) -> Result<CartKeyPolicy, ConfigError> {
    match raw {
        None | Some("product") => Ok(CartKeyPolicy::ProductOnly),
        Some("product-size") => Ok(CartKeyPolicy::ProductAndSize),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            "JERSEY_SHOP_CART_KEY_POLICY".to_string(),
            format!("expected 'product' or 'product-size', got '{other}'"),
        )),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the backend."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_cart_key_policy() {
        assert_eq!(
            parse_cart_key_policy(None).unwrap(),
            CartKeyPolicy::ProductOnly
        );
        assert_eq!(
            parse_cart_key_policy(Some("product")).unwrap(),
            CartKeyPolicy::ProductOnly
        );
        assert_eq!(
            parse_cart_key_policy(Some("product-size")).unwrap(),
            CartKeyPolicy::ProductAndSize
        );
        assert!(parse_cart_key_policy(Some("by-sku")).is_err());
    }

    #[test]
    fn test_backend_config_debug_redacts_key() {
        let config = BackendConfig {
            base_url: "https://backend.example.com".to_string(),
            anon_key: SecretString::from("super_secret_anon_key"),
            timeout: Some(Duration::from_secs(10)),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://backend.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_anon_key"));
    }
}
