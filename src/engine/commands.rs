use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::rpc::{RpcEnvelope, codes};
use crate::settings::{SettingsStore, keys};
use crate::types::{CloudCoreStatus, PlayerConfig, QueueItem, QueueMode};

use super::PlaybackEngine;
use super::notify::status_params;

/// The JSON-RPC method surface of the local player
///
/// The router hands it every request addressed to our PLAYER role.
/// Unknown methods produce a `-32601` error response; malformed
/// parameters `-32602`.
pub struct PlayerCommandService {
    engine: Arc<PlaybackEngine>,
    settings: Arc<dyn SettingsStore>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayParams {
    playing: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeParams {
    volume_level: Option<f64>,
    muted: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeekParams {
    playback_queue_pos: usize,
    seek_pos: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueModeParams {
    playback_queue_mode: QueueMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracksParams {
    playback_queue_id: Option<String>,
    playback_queue_name: Option<String>,
    #[serde(default)]
    items: Vec<QueueItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurationParams {
    player_name: Option<String>,
    cloud_core_url: Option<String>,
}

impl PlayerCommandService {
    /// Create a command service driving the given engine
    #[must_use]
    pub fn new(engine: Arc<PlaybackEngine>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { engine, settings }
    }

    /// Handle one inbound envelope addressed to the player
    ///
    /// Requests produce a response envelope for the router to send back;
    /// notifications are executed without one. Responses are not ours to
    /// handle and are ignored.
    pub async fn handle(&self, envelope: &RpcEnvelope) -> Option<RpcEnvelope> {
        let method = envelope.method.as_deref()?;
        debug!(method, "dispatching player command");
        let outcome = self.dispatch(method, envelope.params.clone()).await;

        let id = envelope.id.clone()?;
        Some(match outcome {
            Ok(result) => RpcEnvelope::response(id, result),
            Err(MeshError::InvalidParameter { name, message }) => {
                RpcEnvelope::error_response(id, codes::INVALID_PARAMS, format!("{name}: {message}"))
            }
            Err(MeshError::Rpc { code, message }) => RpcEnvelope::error_response(id, code, message),
            Err(e) => RpcEnvelope::error_response(id, codes::INTERNAL_ERROR, e.to_string()),
        })
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value> {
        match method {
            "getPlayerConfiguration" => Ok(serde_json::to_value(self.configuration()).unwrap_or(Value::Null)),
            "setPlayerConfiguration" => self.set_configuration(parse_params(params)?),
            "getPlayerStatus" => Ok(self.player_status()),
            "play" => Ok(self.play(parse_optional_params(params)?).await),
            "setVolume" => self.set_volume(parse_params(params)?),
            "setSeekPosition" => self.set_seek(parse_params(params)?),
            "setPlaybackQueueMode" => Ok(self.set_queue_mode(parse_params(params)?).await),
            "setTracks" => Ok(self.set_tracks(parse_params(params)?).await),
            "addTracks" => Ok(self.add_tracks(parse_params(params)?).await),
            other => Err(MeshError::Rpc {
                code: codes::METHOD_NOT_FOUND,
                message: format!("unknown method {other}"),
            }),
        }
    }

    fn configuration(&self) -> PlayerConfig {
        PlayerConfig {
            player_name: self.settings.get(keys::PLAYER_NAME),
            player_model: self.settings.get(keys::PLAYER_MODEL),
            hardware_id: None,
            cloud_core_url: self.settings.get(keys::CLOUD_CORE_URL),
        }
    }

    fn set_configuration(&self, params: ConfigurationParams) -> Result<Value> {
        if let Some(name) = params.player_name {
            self.settings.set(keys::PLAYER_NAME, &name);
        }
        if let Some(url) = params.cloud_core_url {
            self.settings.set_cloud_core_url(&url);
        }
        Ok(serde_json::to_value(self.configuration()).unwrap_or(Value::Null))
    }

    fn player_status(&self) -> Value {
        let status = self.engine.status();
        let cloud = if self.settings.has_access_token() {
            CloudCoreStatus::Registered
        } else {
            CloudCoreStatus::Unregistered
        };
        status_params(&status, cloud, self.settings.get(keys::USER_ID))
    }

    async fn play(&self, params: PlayParams) -> Value {
        let playing = if params.playing.unwrap_or(true) {
            self.engine.play().await
        } else {
            self.engine.pause().await;
            false
        };
        json!({ "playing": playing })
    }

    fn set_volume(&self, params: VolumeParams) -> Result<Value> {
        let volume = match params.volume_level {
            Some(level) => self.engine.set_volume(level),
            None => self.engine.status().volume,
        };
        if let Some(muted) = params.muted {
            self.engine.set_muted(muted);
        }
        Ok(json!({
            "volumeLevel": volume,
            "muted": self.engine.status().muted,
        }))
    }

    fn set_seek(&self, params: SeekParams) -> Result<Value> {
        let position = params.seek_pos.unwrap_or(0.0);
        self.engine.set_seek(params.playback_queue_pos, position)?;
        Ok(json!({
            "playbackQueuePos": params.playback_queue_pos,
            "seekPos": position,
        }))
    }

    async fn set_queue_mode(&self, params: QueueModeParams) -> Value {
        self.engine.set_queue_mode(params.playback_queue_mode).await;
        json!({ "playbackQueueMode": params.playback_queue_mode })
    }

    async fn set_tracks(&self, params: TracksParams) -> Value {
        let count = self
            .engine
            .replace_queue(params.playback_queue_id, params.playback_queue_name, params.items)
            .await;
        json!({ "result": true, "countAll": count })
    }

    async fn add_tracks(&self, params: TracksParams) -> Value {
        let count = self.engine.append_tracks(params.items).await;
        json!({ "result": true, "countAll": count })
    }
}

impl std::fmt::Debug for PlayerCommandService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCommandService").finish_non_exhaustive()
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let value = params.unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| MeshError::InvalidParameter {
        name: "params".to_string(),
        message: e.to_string(),
    })
}

fn parse_optional_params<T: serde::de::DeserializeOwned + Default>(
    params: Option<Value>,
) -> Result<T> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| MeshError::InvalidParameter {
            name: "params".to_string(),
            message: e.to_string(),
        }),
    }
}
