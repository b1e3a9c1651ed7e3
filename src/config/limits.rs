//! Request size limits

use serde::Deserialize;

use super::error::ValidationError;

const MAX_ALLOWED_IMAGE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest decoded image accepted, in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_image_bytes == 0 || self.max_image_bytes > MAX_ALLOWED_IMAGE_BYTES {
            return Err(ValidationError::InvalidImageLimit);
        }
        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}
