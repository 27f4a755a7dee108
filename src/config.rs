use crate::error::ConfigError;
use crate::utils::{normalize_path, normalize_url};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_HISTORY_LIMIT: u32 = 1000;

/// Connection settings for the conversation service.
///
/// Built once at startup: defaults, then the TOML file, then environment,
/// then command-line overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub send_path: String,
    pub profiles_path: String,
    pub set_profile_path: String,
    /// `{id}` is replaced by the conversation id.
    pub history_path: String,
    pub history_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            send_path: "/chat".into(),
            profiles_path: "/profiles".into(),
            set_profile_path: "/conversations/profile".into(),
            history_path: "/conversations/{id}/history".into(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "example", "debate-chat")
    }

    pub fn default_path() -> Option<PathBuf> {
        Some(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        toml::from_str::<Settings>(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        fs::write(path, text).map_err(|e| ConfigError::Write(e.to_string()))
    }

    /// Apply `DEBATE_*` overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DEBATE_API_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("DEBATE_API_SEND_PATH") {
            self.send_path = v;
        }
        if let Some(v) = lookup("DEBATE_PROFILES_PATH") {
            self.profiles_path = v;
        }
        if let Some(v) = lookup("DEBATE_SET_PROFILE_PATH") {
            self.set_profile_path = v;
        }
        if let Some(v) = lookup("DEBATE_HISTORY_PATH") {
            self.history_path = v;
        }
        if let Some(v) = lookup("DEBATE_HISTORY_LIMIT") {
            self.history_limit = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "DEBATE_HISTORY_LIMIT".into(),
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    /// Canonicalize URL and paths; rejects a base URL that does not parse.
    pub fn normalized(mut self) -> Result<Self, ConfigError> {
        self.base_url = normalize_url(&self.base_url);
        if self.base_url.is_empty() {
            log::warn!("base_url is not set; configure it in config.toml or DEBATE_API_BASE_URL");
        } else {
            Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
                url: self.base_url.clone(),
                message: e.to_string(),
            })?;
        }
        self.send_path = normalize_path(&self.send_path);
        self.profiles_path = normalize_path(&self.profiles_path);
        self.set_profile_path = normalize_path(&self.set_profile_path);
        self.history_path = normalize_path(&self.history_path);
        if self.history_limit == 0 {
            self.history_limit = DEFAULT_HISTORY_LIMIT;
        }
        Ok(self)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// History URL with `{id}` replaced inside its path segment; the id is
    /// percent-encoded so `/`, `?` and `#` stay part of the segment.
    pub fn history_endpoint(&self, conversation_id: &str) -> Result<Url, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            message,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| invalid("cannot be a base".into()))?;
            segments.pop_if_empty();
            for part in self.history_path.trim_start_matches('/').split('/') {
                segments.push(&part.replace("{id}", conversation_id));
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = \"api.example.com\"\nsend_path = \"/ask\"\n").unwrap();
        let s = Settings::load_from(&path).unwrap().normalized().unwrap();
        assert_eq!(s.base_url, "https://api.example.com");
        assert_eq!(s.send_path, "/ask");
        assert_eq!(s.profiles_path, "/profiles");
        assert_eq!(s.history_limit, 1000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let s = Settings {
            base_url: "http://localhost:9000".into(),
            ..Settings::default()
        };
        s.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), s);
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("DEBATE_API_BASE_URL", "http://127.0.0.1:8000/"),
            ("DEBATE_API_SEND_PATH", "ask"),
            ("DEBATE_HISTORY_LIMIT", "50"),
        ]
        .into_iter()
        .collect();
        let mut s = Settings::default();
        s.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();
        let s = s.normalized().unwrap();
        assert_eq!(s.base_url, "http://127.0.0.1:8000");
        assert_eq!(s.send_path, "/ask");
        assert_eq!(s.history_limit, 50);
        assert_eq!(
            s.history_endpoint("abc").unwrap().as_str(),
            "http://127.0.0.1:8000/conversations/abc/history"
        );
    }

    #[test]
    fn history_id_is_escaped_as_one_segment() {
        let s = Settings {
            base_url: "http://h".into(),
            ..Settings::default()
        };
        assert_eq!(
            s.history_endpoint("a/b?x#y").unwrap().as_str(),
            "http://h/conversations/a%2Fb%3Fx%23y/history"
        );
    }

    #[test]
    fn history_endpoint_keeps_base_path() {
        let s = Settings {
            base_url: "https://api.example.com/v2".into(),
            history_path: "/history/{id}".into(),
            ..Settings::default()
        };
        assert_eq!(
            s.history_endpoint("c 1").unwrap().as_str(),
            "https://api.example.com/v2/history/c%201"
        );
    }

    #[test]
    fn history_endpoint_needs_a_base_url() {
        let s = Settings::default();
        assert!(matches!(
            s.history_endpoint("abc"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn bad_history_limit_is_rejected() {
        let mut s = Settings::default();
        let res = s.apply_env(|k| (k == "DEBATE_HISTORY_LIMIT").then(|| "lots".to_string()));
        assert!(matches!(res, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn unparsable_base_url_is_rejected() {
        let s = Settings {
            base_url: "http://exa mple.com".into(),
            ..Settings::default()
        };
        assert!(matches!(s.normalized(), Err(ConfigError::InvalidUrl { .. })));
    }
}
