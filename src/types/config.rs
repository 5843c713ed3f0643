use std::net::IpAddr;
use std::time::Duration;

/// Configuration for mesh behavior
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// Display name announced for the local device
    pub device_name: String,

    /// Model identifier announced for the local device
    pub device_model: String,

    /// API key used when registering the device in the cloud
    pub api_key: Option<String>,

    /// Local network address reported to the cloud
    pub local_address: Option<IpAddr>,

    /// Timeout for JSON-RPC requests to peers (default: 15 seconds)
    pub request_timeout: Duration,

    /// Period of the playback progress tick (default: 1 second)
    pub tick_interval: Duration,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            device_name: "audiomesh device".to_string(),
            device_model: "audiomesh".to_string(),
            api_key: None,
            local_address: None,
            request_timeout: Duration::from_secs(15),
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl MeshConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> MeshConfigBuilder {
        MeshConfigBuilder::default()
    }
}

/// Builder for [`MeshConfig`]
#[derive(Debug, Clone, Default)]
pub struct MeshConfigBuilder {
    config: MeshConfig,
}

impl MeshConfigBuilder {
    /// Set the announced device name
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.config.device_name = name.into();
        self
    }

    /// Set the announced device model
    #[must_use]
    pub fn device_model(mut self, model: impl Into<String>) -> Self {
        self.config.device_model = model.into();
        self
    }

    /// Set the cloud registration API key
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the local address reported to the cloud
    #[must_use]
    pub fn local_address(mut self, address: IpAddr) -> Self {
        self.config.local_address = Some(address);
        self
    }

    /// Set the peer request timeout
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the playback tick period
    #[must_use]
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = interval;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> MeshConfig {
        self.config
    }
}
