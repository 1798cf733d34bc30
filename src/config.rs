//! Daemon configuration
//!
//! One TOML file per camera, with a `[stream]` and a `[capture]` table.
//! Every key is optional; missing keys keep their defaults, so a minimal
//! deployment needs no file at all.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capture::CaptureConfig;
use crate::error::{Error, Result};
use crate::server::StreamConfig;

/// Combined per-camera configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Streaming options
    pub stream: StreamConfig,
    /// Capture options
    pub capture: CaptureConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [stream]
            port = 8100
            localhost_only = false
            max_rate = 10
            limit = 500
            quality = 80

            [capture]
            frame_rate = 30
            max_consecutive_failures = 5
            "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.stream.port, 8100);
        assert!(!config.stream.localhost_only);
        assert_eq!(config.stream.max_rate, Some(10));
        assert_eq!(config.stream.limit, Some(500));
        assert_eq!(config.stream.quality, 80);
        assert_eq!(config.capture.frame_rate, 30);
        assert_eq!(config.capture.max_consecutive_failures, 5);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.stream.port, StreamConfig::default().port);
        assert_eq!(config.capture.frame_rate, CaptureConfig::default().frame_rate);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Config::load("/nonexistent/camera.toml").unwrap_err();
        match err {
            Error::ConfigRead { path, .. } => {
                assert_eq!(path.to_str().unwrap(), "/nonexistent/camera.toml")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[stream]\nport = \"not a number\"").unwrap();

        match Config::load(file.path()) {
            Err(Error::ConfigParse { .. }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
