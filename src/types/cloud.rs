use serde::{Deserialize, Serialize};

/// Information about the cloud account's current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Cloud user identity
    pub id: String,

    /// Display name of the user
    pub name: String,
}

/// A device registered in the cloud account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    /// Cloud device identity; matches the peer id on the local network
    pub id: String,

    /// Registered device name
    pub name: String,

    /// Device access token, present after registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Metadata describing a content-access service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    /// Service identity
    pub id: String,

    /// Display name of the service
    pub name: String,

    /// Base URL used to resolve `service://` streaming references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

/// Configuration reported by a player peer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Player display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,

    /// Player model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_model: Option<String>,

    /// Hardware identity of the device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_id: Option<String>,

    /// Cloud endpoint URL the player is configured against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_core_url: Option<String>,
}
