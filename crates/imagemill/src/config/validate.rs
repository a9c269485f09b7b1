//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.allowed_mime_types.is_empty() {
            return Err(ConfigError::ValidationError(
                "uploads.allowed_mime_types must not be empty".into(),
            ));
        }
        if self.uploads.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "uploads.max_upload_mb must be > 0".into(),
            ));
        }
        if self.uploads.max_cover_mb == 0 {
            return Err(ConfigError::ValidationError(
                "uploads.max_cover_mb must be > 0".into(),
            ));
        }
        if self.derivatives.quality == 0 || self.derivatives.quality > 100 {
            return Err(ConfigError::ValidationError(
                "derivatives.quality must be between 1 and 100".into(),
            ));
        }
        if self.derivatives.thumbnail_quality == 0 || self.derivatives.thumbnail_quality > 100 {
            return Err(ConfigError::ValidationError(
                "derivatives.thumbnail_quality must be between 1 and 100".into(),
            ));
        }
        if self.derivatives.max_width == 0 || self.derivatives.max_height == 0 {
            return Err(ConfigError::ValidationError(
                "derivatives.max_width and max_height must be > 0".into(),
            ));
        }
        if self.derivatives.thumbnail_size == 0 {
            return Err(ConfigError::ValidationError(
                "derivatives.thumbnail_size must be > 0".into(),
            ));
        }
        if self.derivatives.variants.responsive {
            if self.derivatives.breakpoints.is_empty() {
                return Err(ConfigError::ValidationError(
                    "derivatives.breakpoints must not be empty when responsive variants are enabled"
                        .into(),
                ));
            }
            if self.derivatives.breakpoints.iter().any(|&w| w == 0) {
                return Err(ConfigError::ValidationError(
                    "derivatives.breakpoints must all be > 0".into(),
                ));
            }
        }
        if !self.derivatives.variants.any_enabled() {
            return Err(ConfigError::ValidationError(
                "at least one variant kind must be enabled".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if let Some(0) = self.limits.pipeline_timeout_ms {
            return Err(ConfigError::ValidationError(
                "limits.pipeline_timeout_ms must be > 0 when set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_quality() {
        let mut config = Config::default();
        config.derivatives.quality = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));

        config.derivatives.quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn test_validate_rejects_zero_thumbnail_size() {
        let mut config = Config::default();
        config.derivatives.thumbnail_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("thumbnail_size"));
    }

    #[test]
    fn test_validate_rejects_empty_breakpoints() {
        let mut config = Config::default();
        config.derivatives.breakpoints.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("breakpoints"));

        // Empty breakpoints are fine if responsive variants are off
        config.derivatives.variants.responsive = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_all_variants_disabled() {
        let mut config = Config::default();
        config.derivatives.variants = crate::config::VariantToggles {
            optimized: false,
            web_codec: false,
            thumbnail: false,
            responsive: false,
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("variant"));
    }

    #[test]
    fn test_validate_rejects_zero_pipeline_timeout() {
        let mut config = Config::default();
        config.limits.pipeline_timeout_ms = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pipeline_timeout_ms"));
    }
}
