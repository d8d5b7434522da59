use crate::config::types::CrawlSettings;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads crawler settings from a TOML file
///
/// Keys use kebab-case and every key is optional; missing keys keep their
/// defaults. The settings are not validated until they are combined with a
/// seed URL in [`crate::config::CrawlConfig::new`].
///
/// # Arguments
///
/// * `path` - Path to the TOML settings file
///
/// # Returns
///
/// * `Ok(CrawlSettings)` - Successfully loaded settings
/// * `Err(ConfigError)` - Failed to read or parse the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use page_harvest::config::load_settings;
///
/// let settings = load_settings(Path::new("harvest.toml")).unwrap();
/// println!("Max depth: {}", settings.max_depth);
/// ```
pub fn load_settings(path: &Path) -> Result<CrawlSettings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parses crawler settings from TOML text
pub fn parse_settings(content: &str) -> Result<CrawlSettings, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Computes a SHA-256 fingerprint of the settings file content
///
/// Logged at crawl start so exported data can be traced back to the exact
/// settings that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads settings and returns both the settings and their fingerprint
pub fn load_settings_with_hash(path: &Path) -> Result<(CrawlSettings, String), ConfigError> {
    let settings = load_settings(path)?;
    let hash = compute_config_hash(path)?;
    Ok((settings, hash))
}
