//! Stream server configuration

use serde::{Deserialize, Serialize};

/// Default maximum simultaneous viewers per camera
pub const DEFAULT_MAX_CLIENTS: usize = 10;

/// Listen backlog for viewers queued behind the accept cap
pub const LISTEN_BACKLOG: u32 = 10;

/// Per-camera streaming options
///
/// Zero-valued `max_rate`/`limit` keep their historical meaning of
/// "unconstrained"; use [`StreamConfig::effective_max_rate`] and
/// [`StreamConfig::effective_limit`] to read them normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// TCP port to listen on (0 = ephemeral, useful for tests)
    pub port: u16,

    /// Accept connections from loopback only
    pub localhost_only: bool,

    /// Bind a dual-stack IPv6 socket instead of IPv4
    pub ipv6: bool,

    /// Maximum simultaneous viewers; further connections wait in the
    /// OS accept queue
    pub max_clients: usize,

    /// Per-viewer delivery cap in frames per second
    /// (`None` or `Some(0)` = deliver every captured frame)
    pub max_rate: Option<u32>,

    /// Disconnect a viewer after this many delivered frames
    /// (`None` or `Some(0)` = unlimited)
    pub limit: Option<u64>,

    /// JPEG quality, 1–100
    pub quality: u8,

    /// Disable Nagle's algorithm on viewer sockets
    pub tcp_nodelay: bool,

    /// Value for an `Access-Control-Allow-Origin` header in the stream
    /// preamble, for streams embedded cross-origin
    pub cors_allow_origin: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            localhost_only: true,
            ipv6: false,
            max_clients: DEFAULT_MAX_CLIENTS,
            max_rate: Some(1),
            limit: None,
            quality: 50,
            tcp_nodelay: true, // important for low latency
            cors_allow_origin: None,
        }
    }
}

impl StreamConfig {
    /// Create a config listening on the given port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Restrict or open the listen address
    pub fn localhost_only(mut self, localhost_only: bool) -> Self {
        self.localhost_only = localhost_only;
        self
    }

    /// Bind dual-stack IPv6
    pub fn ipv6(mut self, ipv6: bool) -> Self {
        self.ipv6 = ipv6;
        self
    }

    /// Set the viewer cap
    pub fn max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }

    /// Set the per-viewer frame rate cap
    pub fn max_rate(mut self, rate: Option<u32>) -> Self {
        self.max_rate = rate;
        self
    }

    /// Set the per-viewer total frame cap
    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Set the JPEG quality
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the CORS allow-origin header value
    pub fn cors_allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_allow_origin = Some(origin.into());
        self
    }

    /// Frame rate cap with the zero sentinel folded into `None`
    pub fn effective_max_rate(&self) -> Option<u32> {
        self.max_rate.filter(|rate| *rate > 0)
    }

    /// Frame count cap with the zero sentinel folded into `None`
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|limit| *limit > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();

        assert_eq!(config.port, 8081);
        assert!(config.localhost_only);
        assert!(!config.ipv6);
        assert_eq!(config.max_clients, DEFAULT_MAX_CLIENTS);
        assert_eq!(config.max_rate, Some(1));
        assert_eq!(config.limit, None);
        assert_eq!(config.quality, 50);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_builder_chaining() {
        let config = StreamConfig::with_port(9090)
            .localhost_only(false)
            .max_clients(50)
            .max_rate(Some(15))
            .limit(Some(1000))
            .quality(80)
            .cors_allow_origin("*");

        assert_eq!(config.port, 9090);
        assert!(!config.localhost_only);
        assert_eq!(config.max_clients, 50);
        assert_eq!(config.max_rate, Some(15));
        assert_eq!(config.limit, Some(1000));
        assert_eq!(config.quality, 80);
        assert_eq!(config.cors_allow_origin.as_deref(), Some("*"));
    }

    #[test]
    fn test_zero_sentinels_mean_unconstrained() {
        let config = StreamConfig::default().max_rate(Some(0)).limit(Some(0));

        assert_eq!(config.effective_max_rate(), None);
        assert_eq!(config.effective_limit(), None);

        let config = config.max_rate(Some(5)).limit(Some(100));
        assert_eq!(config.effective_max_rate(), Some(5));
        assert_eq!(config.effective_limit(), Some(100));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: StreamConfig = toml::from_str(
            r#"
            port = 8100
            localhost_only = false
            max_rate = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8100);
        assert!(!config.localhost_only);
        assert_eq!(config.max_rate, Some(5));
        // untouched fields keep their defaults
        assert_eq!(config.quality, 50);
        assert_eq!(config.limit, None);
    }
}
