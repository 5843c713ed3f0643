//! Mock implementations of the external collaborator seams
//!
//! Useful for unit tests and for embedding the library without a real
//! network or cloud backend.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::cloud::{
    CloudService, ContentProvider, ContentService, RegisterDeviceRequest, ScrobbleSink,
    ServiceUrlResolver,
};
use crate::display::{DisplaySink, MeshSnapshot};
use crate::error::{MeshError, Result};
use crate::rpc::RpcEnvelope;
use crate::transport::MessageTransport;
use crate::types::{Capability, DeviceIdentity, PeerId, QueueItem, ServiceInfo, StreamingRef, UserInfo};

/// A message captured by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Addressed peer, `None` for broadcast
    pub target: Option<PeerId>,

    /// Addressed capability role
    pub capability: Capability,

    /// Raw payload bytes
    pub payload: Bytes,
}

impl SentMessage {
    /// Decode the payload as a JSON-RPC envelope
    ///
    /// # Panics
    ///
    /// Panics when the payload is not a valid envelope; mock payloads
    /// always are.
    #[must_use]
    pub fn envelope(&self) -> RpcEnvelope {
        RpcEnvelope::decode(&self.payload).expect("mock payload is a valid envelope")
    }
}

/// Transport that captures outbound messages instead of sending them
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl MockTransport {
    /// Create a transport that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of all captured messages
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Drain and return all captured messages
    pub fn take_sent(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Number of captured messages
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(
        &self,
        target: Option<&PeerId>,
        target_capability: Capability,
        payload: Bytes,
    ) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MeshError::Transport {
                message: "mock transport failure".to_string(),
                source: None,
            });
        }
        self.sent.lock().unwrap().push(SentMessage {
            target: target.cloned(),
            capability: target_capability,
            payload,
        });
        Ok(())
    }
}

/// Cloud service with scripted responses
#[derive(Debug)]
pub struct MockCloud {
    user: Mutex<UserInfo>,
    devices: Mutex<Vec<DeviceIdentity>>,
    issued_token: Mutex<Option<String>>,
    unauthorized: AtomicBool,
    register_requests: Mutex<Vec<RegisterDeviceRequest>>,
    address_updates: Mutex<Vec<IpAddr>>,
}

impl Default for MockCloud {
    fn default() -> Self {
        Self {
            user: Mutex::new(UserInfo {
                id: "user-1".to_string(),
                name: "Test User".to_string(),
            }),
            devices: Mutex::new(Vec::new()),
            issued_token: Mutex::new(Some("token-1".to_string())),
            unauthorized: AtomicBool::new(false),
            register_requests: Mutex::new(Vec::new()),
            address_updates: Mutex::new(Vec::new()),
        }
    }
}

impl MockCloud {
    /// Create a cloud that accepts every call
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail as unauthorized
    pub fn set_unauthorized(&self, unauthorized: bool) {
        self.unauthorized.store(unauthorized, Ordering::SeqCst);
    }

    /// Replace the device list returned by `find_devices`
    pub fn set_devices(&self, devices: Vec<DeviceIdentity>) {
        *self.devices.lock().unwrap() = devices;
    }

    /// Registration requests received so far
    #[must_use]
    pub fn register_requests(&self) -> Vec<RegisterDeviceRequest> {
        self.register_requests.lock().unwrap().clone()
    }

    /// Address updates received so far
    #[must_use]
    pub fn address_updates(&self) -> Vec<IpAddr> {
        self.address_updates.lock().unwrap().clone()
    }

    fn check_token(&self) -> Result<()> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(MeshError::Unauthorized {
                message: "mock token rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CloudService for MockCloud {
    async fn get_current_user(&self) -> Result<UserInfo> {
        self.check_token()?;
        Ok(self.user.lock().unwrap().clone())
    }

    async fn register_device(&self, request: RegisterDeviceRequest) -> Result<DeviceIdentity> {
        self.check_token()?;
        let name = request.name.clone();
        self.register_requests.lock().unwrap().push(request);
        Ok(DeviceIdentity {
            id: "device-1".to_string(),
            name,
            access_token: self.issued_token.lock().unwrap().clone(),
        })
    }

    async fn set_device_address(&self, address: IpAddr) -> Result<DeviceIdentity> {
        self.check_token()?;
        self.address_updates.lock().unwrap().push(address);
        Ok(DeviceIdentity {
            id: "device-1".to_string(),
            name: "Mock Device".to_string(),
            access_token: self.issued_token.lock().unwrap().clone(),
        })
    }

    async fn find_devices(&self) -> Result<Vec<DeviceIdentity>> {
        self.check_token()?;
        Ok(self.devices.lock().unwrap().clone())
    }
}

/// Content service backed by in-memory maps
#[derive(Debug)]
pub struct MockContentService {
    info: ServiceInfo,
    refs: Mutex<HashMap<String, StreamingRef>>,
    requested: Mutex<Vec<String>>,
}

impl MockContentService {
    /// Create a service with the given identity
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            info: ServiceInfo {
                id: id.clone(),
                name: name.into(),
                service_url: Some(format!("http://{id}.example.com")),
            },
            refs: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Register a streaming reference for an item id
    pub fn add_ref(&self, item_id: impl Into<String>, streaming_ref: StreamingRef) {
        self.refs.lock().unwrap().insert(item_id.into(), streaming_ref);
    }

    /// Item ids requested so far
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentService for MockContentService {
    async fn get_service_information(&self) -> Result<ServiceInfo> {
        Ok(self.info.clone())
    }

    async fn get_item_streaming_ref(&self, item_id: &str) -> Result<StreamingRef> {
        self.requested.lock().unwrap().push(item_id.to_string());
        self.refs
            .lock()
            .unwrap()
            .get(item_id)
            .cloned()
            .ok_or_else(|| MeshError::StreamingResolution {
                message: format!("no streaming ref for {item_id}"),
            })
    }
}

/// Content provider and service-URL resolver backed by in-memory maps
#[derive(Default)]
pub struct MockContentProvider {
    services: Mutex<HashMap<String, Arc<dyn ContentService>>>,
    urls: Mutex<HashMap<String, String>>,
}

impl MockContentProvider {
    /// Create an empty provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a content service under an identity
    pub fn add_service(&self, id: impl Into<String>, service: Arc<dyn ContentService>) {
        self.services.lock().unwrap().insert(id.into(), service);
    }

    /// Register a base URL for `service://` resolution
    pub fn add_url(&self, id: impl Into<String>, url: impl Into<String>) {
        self.urls.lock().unwrap().insert(id.into(), url.into());
    }
}

impl ContentProvider for MockContentProvider {
    fn content_service(&self, service_id: &str) -> Option<Arc<dyn ContentService>> {
        self.services.lock().unwrap().get(service_id).cloned()
    }
}

impl ServiceUrlResolver for MockContentProvider {
    fn service_url(&self, service_id: &str) -> Option<String> {
        self.urls.lock().unwrap().get(service_id).cloned()
    }
}

impl std::fmt::Debug for MockContentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockContentProvider").finish_non_exhaustive()
    }
}

/// Scrobble sink that records reports
#[derive(Debug, Default)]
pub struct MockScrobble {
    reports: Mutex<Vec<(QueueItem, u64)>>,
    failing: AtomicBool,
}

impl MockScrobble {
    /// Create a sink that accepts every report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reports fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reports received so far
    #[must_use]
    pub fn reports(&self) -> Vec<(QueueItem, u64)> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScrobbleSink for MockScrobble {
    async fn report_played(&self, item: QueueItem, timestamp_millis: u64) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MeshError::ScrobbleReport {
                message: "mock scrobble failure".to_string(),
            });
        }
        self.reports.lock().unwrap().push((item, timestamp_millis));
        Ok(())
    }
}

/// Display sink that records snapshots
#[derive(Debug, Default)]
pub struct MockDisplay {
    snapshots: Mutex<Vec<MeshSnapshot>>,
}

impl MockDisplay {
    /// Create an empty display
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent snapshot, if any
    #[must_use]
    pub fn last_snapshot(&self) -> Option<MeshSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    /// Number of refreshes received
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }
}

impl DisplaySink for MockDisplay {
    fn refresh(&self, snapshot: MeshSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}
