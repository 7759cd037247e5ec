//! Listener and route configuration

use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;

/// Paths served regardless of configuration
pub const RESERVED_PATHS: [&str; 2] = ["/health", "/metrics"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub host: String,
    pub port: u16,
    pub register_path: String,
    pub unregister_path: String,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            register_path: "/register".to_string(),
            unregister_path: "/unregister".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl RegistrationConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check that both paths are routable and distinct
    pub fn validate(&self) -> Result<(), RegistrationError> {
        for (name, path) in [
            ("register_path", &self.register_path),
            ("unregister_path", &self.unregister_path),
        ] {
            if !path.starts_with('/') || path.len() < 2 {
                return Err(RegistrationError::Config(format!(
                    "{name} {path:?} must start with '/' and name a resource"
                )));
            }
            if path.contains(['{', '}', '*', ':']) {
                return Err(RegistrationError::Config(format!(
                    "{name} {path:?} must be a literal path"
                )));
            }
            if RESERVED_PATHS.contains(&path.as_str()) {
                return Err(RegistrationError::Config(format!(
                    "{name} {path:?} is reserved"
                )));
            }
        }
        if self.register_path == self.unregister_path {
            return Err(RegistrationError::Config(
                "register_path and unregister_path must differ".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(RegistrationError::Config("host must not be empty".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(RegistrationError::Config(
                "max_body_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RegistrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_rejects_bad_paths() {
        let cases = [
            ("register", "/unregister"),
            ("/", "/unregister"),
            ("/same", "/same"),
            ("/health", "/unregister"),
            ("/register", "/metrics"),
            ("/users/:id", "/unregister"),
        ];
        for (register_path, unregister_path) in cases {
            let config = RegistrationConfig {
                register_path: register_path.to_string(),
                unregister_path: unregister_path.to_string(),
                ..RegistrationConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(RegistrationError::Config(_))),
                "{} / {} should be rejected",
                register_path,
                unregister_path
            );
        }
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RegistrationConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.register_path, "/register");
    }
}
