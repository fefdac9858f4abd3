use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/devconnect.json";
const DEFAULT_API_URL: &str = "http://localhost:7777";
const LOCAL_SOCKET_PATH: &str = "/socket.io";
const HOSTED_SOCKET_PATH: &str = "/api/socket.io";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    /// Origin of the live chat socket. Defaults to the API origin.
    pub socket_url: Option<String>,
    /// Socket.IO path. Defaults depend on whether the API is local.
    pub socket_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            socket_url: None,
            socket_path: None,
        }
    }
}

impl AppConfig {
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(api_url) = value("DEVCONNECT_API_URL") {
            self.api_url = api_url;
        }
        if let Some(socket_url) = value("DEVCONNECT_SOCKET_URL") {
            self.socket_url = Some(socket_url);
        }
        if let Some(socket_path) = value("DEVCONNECT_SOCKET_PATH") {
            self.socket_path = Some(socket_path);
        }
    }

    /// WebSocket endpoint of the live chat channel, without query.
    ///
    /// A local API serves the socket at its own origin under `/socket.io`;
    /// a hosted deployment serves it behind the `/api` prefix.
    pub fn socket_endpoint(&self) -> String {
        let (scheme, authority) = split_origin(self.socket_url.as_deref().unwrap_or(&self.api_url));
        let host = authority.split(':').next().unwrap_or_default();

        let path = self.socket_path.clone().unwrap_or_else(|| {
            if host == "localhost" {
                LOCAL_SOCKET_PATH.to_string()
            } else {
                HOSTED_SOCKET_PATH.to_string()
            }
        });

        let ws_scheme = match scheme {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        format!("{ws_scheme}://{authority}/{}", path.trim_start_matches('/'))
    }
}

fn split_origin(url: &str) -> (&str, &str) {
    let (scheme, rest) = url.split_once("://").unwrap_or(("http", url));
    let authority = rest.split('/').next().unwrap_or_default();
    (scheme, authority)
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("devconnect-{}-{name}", std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn local_api_uses_default_socket_path() {
        let config = AppConfig::default();
        assert_eq!(config.socket_endpoint(), "ws://localhost:7777/socket.io");
    }

    #[test]
    fn hosted_api_uses_prefixed_socket_path() {
        let config = AppConfig {
            api_url: "https://devconnect.app/api".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.socket_endpoint(), "wss://devconnect.app/api/socket.io");
    }

    #[test]
    fn explicit_socket_settings_win() {
        let config = AppConfig {
            api_url: "https://devconnect.app/api".to_string(),
            socket_url: Some("http://10.0.0.5:9000".to_string()),
            socket_path: Some("chat".to_string()),
        };
        assert_eq!(config.socket_endpoint(), "ws://10.0.0.5:9000/chat");
    }

    #[test]
    fn env_overrides_replace_non_empty_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DEVCONNECT_API_URL", "http://api.internal:8080"),
            ("DEVCONNECT_SOCKET_PATH", "  "),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|name| env.get(name).map(|value| value.to_string()));

        assert_eq!(config.api_url, "http://api.internal:8080");
        assert_eq!(config.socket_path, None);
    }

    #[test]
    fn invalid_or_missing_file_falls_back_to_defaults() {
        let path = temp_path("invalid.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AppConfig::default());
        fs::remove_file(&path).ok();

        assert_eq!(load_config(&temp_path("missing.json")), AppConfig::default());
    }

    #[test]
    fn saved_config_round_trips_partial_files() {
        let path = temp_path("saved.json");
        let config = AppConfig {
            api_url: "https://devconnect.app/api".to_string(),
            ..AppConfig::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
        fs::remove_file(&path).ok();

        fs::write(&path, r#"{"api_url": "http://localhost:3000"}"#).unwrap();
        assert_eq!(load_config(&path).api_url, "http://localhost:3000");
        fs::remove_file(&path).ok();
    }
}
