//! LCD chain client configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Where the DCA contract lives and how to reach it.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// LCD REST endpoint, e.g. `https://lcd.terra.dev`.
    #[serde(default = "default_lcd_url")]
    pub lcd_url: String,
    /// DCA contract address.
    #[serde(default)]
    pub dca_address: String,
    /// Exchange factory; taken from the DCA config when unset.
    #[serde(default)]
    pub factory_address: Option<String>,
    /// Exchange router; taken from the DCA config when unset.
    #[serde(default)]
    pub router_address: Option<String>,
    /// Relay that signs and broadcasts execute messages.
    #[serde(default)]
    pub signer_url: Option<String>,
    /// Log purchases instead of submitting them.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_lcd_url() -> String {
    "http://localhost:1317".into()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            lcd_url: default_lcd_url(),
            dca_address: String::new(),
            factory_address: None,
            router_address: None,
            signer_url: None,
            dry_run: false,
            http: HttpConfig::default(),
        }
    }
}

impl ChainConfig {
    /// # Errors
    /// Returns an error when a required address is missing or a URL does not
    /// parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dca_address.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "chain.dca_address",
            });
        }
        url::Url::parse(&self.lcd_url).map_err(|e| ConfigError::InvalidValue {
            field: "chain.lcd_url",
            reason: e.to_string(),
        })?;
        match &self.signer_url {
            Some(signer) => {
                url::Url::parse(signer).map_err(|e| ConfigError::InvalidValue {
                    field: "chain.signer_url",
                    reason: e.to_string(),
                })?;
            }
            None if !self.dry_run => {
                return Err(ConfigError::MissingField {
                    field: "chain.signer_url",
                });
            }
            None => {}
        }
        if self.http.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chain.http.timeout_ms",
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_http_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Attempts for queries that fail on timeout or connect errors.
    #[serde(default = "default_http_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_http_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

const fn default_http_timeout_ms() -> u64 {
    10_000
}

const fn default_http_connect_timeout_ms() -> u64 {
    2000
}

const fn default_http_retry_max_attempts() -> u32 {
    3
}

const fn default_http_retry_backoff_ms() -> u64 {
    500
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            connect_timeout_ms: default_http_connect_timeout_ms(),
            retry_max_attempts: default_http_retry_max_attempts(),
            retry_backoff_ms: default_http_retry_backoff_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChainConfig {
        ChainConfig {
            dca_address: "terra1dca".into(),
            signer_url: Some("http://localhost:8080/sign".into()),
            ..ChainConfig::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn dca_address_required() {
        let config = ChainConfig {
            dca_address: " ".into(),
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { field: "chain.dca_address" })
        ));
    }

    #[test]
    fn signer_required_unless_dry_run() {
        let mut config = ChainConfig {
            signer_url: None,
            ..config()
        };
        assert!(config.validate().is_err());
        config.dry_run = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_lcd_url_rejected() {
        let config = ChainConfig {
            lcd_url: "not a url".into(),
            ..config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "chain.lcd_url", .. })
        ));
    }
}
