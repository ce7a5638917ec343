use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConsoleError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub admin_users: Vec<String>,
    #[serde(default = "default_user_header")]
    pub user_header: String,
    #[serde(default)]
    pub anonymous_is_admin: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_users: Vec::new(),
            user_header: default_user_header(),
            anonymous_is_admin: false,
        }
    }
}

fn default_listen_port() -> u16 {
    9090
}

fn default_refresh_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_header() -> String {
    "X-Forwarded-User".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConsoleError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConsoleError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, ConsoleError> {
        let mut cfg: Config = serde_yaml::from_str(data)?;

        cfg.backend.base_url = cfg.backend.base_url.trim_end_matches('/').to_string();
        if cfg.backend.base_url.is_empty() {
            return Err(ConsoleError::InvalidConfig(
                "backend.base_url must be set".to_string(),
            ));
        }
        if cfg.backend.refresh_secs == 0 {
            return Err(ConsoleError::InvalidConfig(
                "backend.refresh_secs must be at least 1".to_string(),
            ));
        }

        Ok(cfg)
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.backend.refresh_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Whether the requesting user may approve or cancel manual deployments.
    pub fn is_admin(&self, user: Option<&str>) -> bool {
        match user {
            Some(u) if !u.is_empty() => self.auth.admin_users.iter().any(|a| a == u),
            _ => self.auth.anonymous_is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let cfg = Config::parse("backend:\n  base_url: http://webui:8080/\n").unwrap();
        assert_eq!(cfg.listen_port, 9090);
        assert_eq!(cfg.backend.base_url, "http://webui:8080");
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(10));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.auth.user_header, "X-Forwarded-User");
        assert!(!cfg.auth.anonymous_is_admin);
        assert_eq!(cfg.listen_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn missing_backend_is_a_parse_error() {
        let err = Config::parse("listen_port: 8000\n").unwrap_err();
        assert!(matches!(err, ConsoleError::ConfigParse(_)));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let err = Config::parse("backend:\n  base_url: \"\"\n").unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidConfig(_)));
    }

    #[test]
    fn zero_refresh_is_rejected() {
        let err = Config::parse("backend:\n  base_url: http://x\n  refresh_secs: 0\n").unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidConfig(_)));
    }

    #[test]
    fn admin_resolution() {
        let cfg = Config::parse(
            "backend:\n  base_url: http://x\nauth:\n  admin_users: [alice]\n",
        )
        .unwrap();
        assert!(cfg.is_admin(Some("alice")));
        assert!(!cfg.is_admin(Some("bob")));
        assert!(!cfg.is_admin(None));
        assert!(!cfg.is_admin(Some("")));

        let open = Config::parse(
            "backend:\n  base_url: http://x\nauth:\n  anonymous_is_admin: true\n",
        )
        .unwrap();
        assert!(open.is_admin(None));
        assert!(!open.is_admin(Some("bob")));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/kluctl-console.yaml")).unwrap_err();
        assert!(matches!(err, ConsoleError::ConfigRead { .. }));
    }
}
