use serde::{Deserialize, Serialize};

/// Wire-protocol constants for the target service, loaded from TOML.
///
/// The defaults match the service this harness was written against; a
/// config file only needs to name the fields it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Login endpoint path, appended to the host URL.
    pub login_path: String,
    /// Session validation endpoint path.
    pub validate_path: String,
    /// Name of the XSRF cookie sent with every request.
    pub xsrf_cookie: String,
    /// Name of the XSRF header sent with every request.
    pub xsrf_header: String,
    /// Name of the session cookie the login response hands back.
    pub session_cookie: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            login_path: "/api/v2/login".to_string(),
            validate_path: "/api/v2/users/current".to_string(),
            xsrf_cookie: "XSRF-TOKEN".to_string(),
            xsrf_header: "X-XSRF-TOKEN".to_string(),
            session_cookie: "_d".to_string(),
        }
    }
}

impl ProtocolConfig {
    /// Load protocol overrides from a TOML file path.
    ///
    /// Unlike an implicit config search, the path here was given explicitly
    /// on the command line, so a missing file is an error.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?;
        Ok(config)
    }
}

/// Errors that can occur when loading protocol config.
#[derive(Debug)]
pub enum ConfigError {
    ReadFailed(std::path::PathBuf, std::io::Error),
    ParseFailed(std::path::PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed(path, e) => {
                write!(f, "Failed to read config {}: {}", path.display(), e)
            }
            Self::ParseFailed(path, e) => {
                write!(f, "Failed to parse config {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
