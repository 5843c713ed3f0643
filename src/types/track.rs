use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reference to streamable audio content
///
/// References either carry a direct URL or a deferred indirection
/// (`service://<service>/<path>`) that is resolved against a discovered
/// service's base URL at play-time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireStreamingRef", into = "WireStreamingRef")]
pub enum StreamingRef {
    /// Directly playable URL
    Direct {
        /// The URL of the audio stream
        url: String,
        /// Stream format identifier, if known
        format: Option<String>,
    },
    /// Indirection resolved through a service-address lookup
    Deferred {
        /// Identity of the service that hosts the content
        service: String,
        /// Path (including query/fragment) below the service base URL
        path: String,
        /// Stream format identifier, if known
        format: Option<String>,
    },
}

impl StreamingRef {
    /// Build a reference from a raw URL string
    ///
    /// URLs with the `service` scheme become [`StreamingRef::Deferred`];
    /// anything else is taken as a direct address.
    #[must_use]
    pub fn from_url(url: impl Into<String>, format: Option<String>) -> Self {
        let url = url.into();
        if let Some(rest) = url.strip_prefix("service://") {
            let (service, path) = match rest.find('/') {
                Some(pos) => (rest[..pos].to_string(), rest[pos..].to_string()),
                None => (rest.to_string(), String::new()),
            };
            Self::Deferred {
                service,
                path,
                format,
            }
        } else {
            Self::Direct { url, format }
        }
    }

    /// The directly playable URL, if this reference has one
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Direct { url, .. } => Some(url),
            Self::Deferred { .. } => None,
        }
    }

    /// The stream format identifier, if known
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        match self {
            Self::Direct { format, .. } | Self::Deferred { format, .. } => format.as_deref(),
        }
    }
}

/// Wire shape of a streaming reference: a URL plus optional format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireStreamingRef {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

impl From<WireStreamingRef> for StreamingRef {
    fn from(wire: WireStreamingRef) -> Self {
        Self::from_url(wire.url, wire.format)
    }
}

impl From<StreamingRef> for WireStreamingRef {
    fn from(r: StreamingRef) -> Self {
        match r {
            StreamingRef::Direct { url, format } => Self { url, format },
            StreamingRef::Deferred {
                service,
                path,
                format,
            } => Self {
                url: format!("service://{service}{path}"),
                format,
            },
        }
    }
}

/// An item in the playback queue
///
/// Immutable once placed in the queue, except for attribute refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    /// Content identity, `"<service>:<rest>"` for service-hosted items
    pub id: String,

    /// Display text (title and artist)
    pub text: String,

    /// Image reference for display, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Content type tag (e.g. "track", "stream")
    #[serde(rename = "type")]
    pub type_tag: String,

    /// Ordered streaming references, possibly empty until resolved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streaming_refs: Vec<StreamingRef>,

    /// Opaque attributes blob (duration lives here)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub item_attributes: Value,
}

impl QueueItem {
    /// Create a new queue item with required fields
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            image: None,
            type_tag: "track".to_string(),
            streaming_refs: Vec::new(),
            item_attributes: Value::Null,
        }
    }

    /// Builder method to set a direct streaming reference
    #[must_use]
    pub fn with_streaming_url(mut self, url: impl Into<String>) -> Self {
        self.streaming_refs.push(StreamingRef::Direct {
            url: url.into(),
            format: None,
        });
        self
    }

    /// Builder method to set the duration attribute (seconds)
    #[must_use]
    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.item_attributes = serde_json::json!({ "duration": duration_secs });
        self
    }

    /// The service prefix of the item id, if the id has one
    #[must_use]
    pub fn service_prefix(&self) -> Option<&str> {
        self.id.split_once(':').map(|(service, _)| service)
    }

    /// Parse the attributes blob into track attributes
    ///
    /// Returns `None` when the blob is absent or does not parse.
    #[must_use]
    pub fn attributes(&self) -> Option<TrackAttributes> {
        if self.item_attributes.is_null() {
            return None;
        }
        serde_json::from_value(self.item_attributes.clone()).ok()
    }
}

/// Typed view of the attributes blob
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAttributes {
    /// Track duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Album name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Artist name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}
