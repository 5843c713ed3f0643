//! Cloud and content collaborator seams
//!
//! The cloud REST clients themselves are out of scope; the core consumes
//! them through these traits. Failures surface as
//! [`MeshError::Unauthorized`], [`MeshError::Service`] or
//! [`MeshError::Timeout`].

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{MeshError, Result};
use crate::types::{DeviceIdentity, QueueItem, ServiceInfo, StreamingRef, UserInfo};

/// Request payload for registering the local device in the cloud
#[derive(Debug, Clone)]
pub struct RegisterDeviceRequest {
    /// Device model identifier
    pub model: String,

    /// Device display name
    pub name: String,

    /// Local network address of the device
    pub address: Option<IpAddr>,

    /// Application API key
    pub api_key: Option<String>,

    /// Hardware identity, when registration should be idempotent per device
    pub hardware_id: Option<String>,
}

/// Cloud device/user service
#[async_trait]
pub trait CloudService: Send + Sync {
    /// Fetch the account's current user
    ///
    /// # Errors
    ///
    /// [`MeshError::Unauthorized`] for an invalid token, otherwise
    /// [`MeshError::Service`] or [`MeshError::Timeout`].
    async fn get_current_user(&self) -> Result<UserInfo>;

    /// Register the local device, returning its cloud identity
    ///
    /// # Errors
    ///
    /// Same kinds as [`CloudService::get_current_user`].
    async fn register_device(&self, request: RegisterDeviceRequest) -> Result<DeviceIdentity>;

    /// Update the device's network address, returning its cloud identity
    ///
    /// # Errors
    ///
    /// Same kinds as [`CloudService::get_current_user`].
    async fn set_device_address(&self, address: IpAddr) -> Result<DeviceIdentity>;

    /// List devices registered for the account
    ///
    /// # Errors
    ///
    /// Same kinds as [`CloudService::get_current_user`].
    async fn find_devices(&self) -> Result<Vec<DeviceIdentity>>;
}

/// Content-access service, local or online
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Fetch metadata about the service
    ///
    /// # Errors
    ///
    /// [`MeshError::MetadataFetch`] or [`MeshError::Timeout`].
    async fn get_service_information(&self) -> Result<ServiceInfo>;

    /// Request a streaming reference for a content item
    ///
    /// # Errors
    ///
    /// [`MeshError::StreamingResolution`] or [`MeshError::Timeout`].
    async fn get_item_streaming_ref(&self, item_id: &str) -> Result<StreamingRef>;
}

/// Lookup of content services by service identity
///
/// Used at play-time to resolve `"<service>:<rest>"` item ids.
pub trait ContentProvider: Send + Sync {
    /// The content service with the given identity, if one is known
    fn content_service(&self, service_id: &str) -> Option<Arc<dyn ContentService>>;
}

/// Resolution of `service://` indirections to base URLs
pub trait ServiceUrlResolver: Send + Sync {
    /// The base URL of the named service, if known
    fn service_url(&self, service_id: &str) -> Option<String>;
}

/// Scrobble/play-history collaborator
#[async_trait]
pub trait ScrobbleSink: Send + Sync {
    /// Report an item as played at the given millisecond timestamp
    ///
    /// # Errors
    ///
    /// [`MeshError::ScrobbleReport`]; callers log and otherwise ignore it.
    async fn report_played(&self, item: QueueItem, timestamp_millis: u64) -> Result<()>;
}

/// Convenience helper mapping a service error into the cloud taxonomy
#[must_use]
pub fn service_error(code: i32, message: impl Into<String>) -> MeshError {
    MeshError::Service {
        code,
        message: message.into(),
    }
}
