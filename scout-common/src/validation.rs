//! Configuration validation for scout services.
//!
//! Checks that required values are present and within valid ranges before
//! a browser is ever launched.

use thiserror::Error;

use crate::config::{
    BotConfig, Config, GainersSourceConfig, LeverageSourceConfig, ObservabilityConfig,
    OutputConfig,
};

/// Upper bound on detail pages visited per run.
pub const MAX_ROW_CAP: usize = 100;

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the sections the scrape pipeline depends on.
    pub fn validate(&self) -> ValidationResult<()> {
        let sections: [&dyn Validate; 4] = [
            &self.observability,
            &self.leverage,
            &self.gainers,
            &self.output,
        ];
        collect_errors(sections.iter().map(|s| s.validate()))
    }

    /// Load, apply environment overrides, and validate.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load_with_env()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

fn collect_errors(results: impl Iterator<Item = ValidationResult<()>>) -> ValidationResult<()> {
    let mut errors: Vec<ValidationError> = results.filter_map(Result::err).collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn validate_url(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
    let parsed = url::Url::parse(value).map_err(|e| ValidationError::InvalidValue {
        field: field.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https" | "file") {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField {
            field: field.to_string(),
        })
    } else {
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: "must be 'json' or 'pretty'".into(),
            });
        }
        Ok(())
    }
}

impl Validate for LeverageSourceConfig {
    fn validate(&self) -> ValidationResult<()> {
        collect_errors(
            [
                validate_url("leverage.url", &self.url),
                require_non_empty("leverage.row_selector", &self.row_selector),
                require_non_empty("leverage.code_attribute", &self.code_attribute),
                require_non_empty("leverage.multiplier_attribute", &self.multiplier_attribute),
            ]
            .into_iter(),
        )
    }
}

impl Validate for GainersSourceConfig {
    fn validate(&self) -> ValidationResult<()> {
        let row_cap = if self.row_cap == 0 || self.row_cap > MAX_ROW_CAP {
            Err(ValidationError::InvalidValue {
                field: "gainers.row_cap".into(),
                reason: format!("must be between 1 and {MAX_ROW_CAP}"),
            })
        } else {
            Ok(())
        };

        collect_errors(
            [
                validate_url("gainers.url", &self.url),
                row_cap,
                require_non_empty("gainers.row_selector", &self.row_selector),
                require_non_empty("gainers.link_selector", &self.link_selector),
                require_non_empty("gainers.exchange_label", &self.exchange_label),
            ]
            .into_iter(),
        )
    }
}

impl Validate for OutputConfig {
    fn validate(&self) -> ValidationResult<()> {
        collect_errors(
            [
                require_non_empty("output.target_multiplier", &self.target_multiplier),
                require_non_empty("output.prefix", &self.prefix),
            ]
            .into_iter(),
        )
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> ValidationResult<()> {
        match self.bot_token.as_deref() {
            Some(token) if !token.trim().is_empty() => {}
            _ => {
                return Err(ValidationError::MissingField {
                    field: "bot.bot_token".into(),
                })
            }
        }
        if self.job_timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "bot.job_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        validate_url("bot.api_base_url", &self.api_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_row_cap_bounds() {
        let mut gainers = GainersSourceConfig::default();
        gainers.row_cap = 0;
        assert!(gainers.validate().is_err());
        gainers.row_cap = 101;
        assert!(gainers.validate().is_err());
        gainers.row_cap = 100;
        assert!(gainers.validate().is_ok());
    }

    #[test]
    fn test_bad_url_rejected() {
        let mut leverage = LeverageSourceConfig::default();
        leverage.url = "not a url".into();
        let err = leverage.validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "leverage.url"));
    }

    #[test]
    fn test_multiple_errors_aggregated() {
        let mut config = Config::default();
        config.output.target_multiplier = " ".into();
        config.observability.log_format = "xml".into();
        match config.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_bot_requires_token() {
        let mut bot = BotConfig::default();
        assert!(matches!(
            bot.validate(),
            Err(ValidationError::MissingField { .. })
        ));
        bot.bot_token = Some("123:abc".into());
        assert!(bot.validate().is_ok());
        bot.job_timeout_secs = 0;
        assert!(bot.validate().is_err());
    }
}
