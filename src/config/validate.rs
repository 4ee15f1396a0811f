// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{Result, VipserError};

pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    if let Some(path) = &cfg.executable.path {
        if path.as_os_str().is_empty() {
            return Err(VipserError::Config(
                "[executable].path must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}
