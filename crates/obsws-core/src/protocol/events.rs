//! Typed events.
//!
//! The server tags every event with its `update-type`.  The [`Event`] trait
//! ties a struct to that name so the client's event registry can look up a
//! handler by name and decode the payload into the right type in one step.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::protocol::requests::SceneItem;

/// An event the server can push.
pub trait Event: DeserializeOwned + Send + 'static {
    /// The `update-type` the server tags this event with.
    const NAME: &'static str;
}

/// Timecodes the server attaches to events while streaming or recording.
///
/// Format is `HH:MM:SS.mmm`; absent when the output is inactive.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Timecodes {
    #[serde(rename = "stream-timecode", default)]
    pub stream: Option<String>,
    #[serde(rename = "rec-timecode", default)]
    pub recording: Option<String>,
}

/// Program output switched to another scene.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SwitchScenesEvent {
    #[serde(rename = "scene-name")]
    pub scene_name: String,
    #[serde(default)]
    pub sources: Vec<SceneItem>,
    #[serde(flatten)]
    pub timecodes: Timecodes,
}

impl Event for SwitchScenesEvent {
    const NAME: &'static str = "SwitchScenes";
}

/// Periodic "I am alive" event, enabled with `SetHeartbeat`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HeartbeatEvent {
    /// Toggles on every heartbeat.
    pub pulse: bool,
    #[serde(rename = "current-profile", default)]
    pub current_profile: Option<String>,
    #[serde(rename = "current-scene", default)]
    pub current_scene: Option<String>,
    #[serde(default)]
    pub streaming: Option<bool>,
    #[serde(default)]
    pub recording: Option<bool>,
    #[serde(rename = "total-stream-time", default)]
    pub total_stream_time: Option<u64>,
    #[serde(rename = "total-record-time", default)]
    pub total_record_time: Option<u64>,
    #[serde(flatten)]
    pub timecodes: Timecodes,
}

impl Event for HeartbeatEvent {
    const NAME: &'static str = "Heartbeat";
}

/// Streaming started successfully.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StreamStartedEvent {
    #[serde(flatten)]
    pub timecodes: Timecodes,
}

impl Event for StreamStartedEvent {
    const NAME: &'static str = "StreamStarted";
}

/// Streaming stopped successfully.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StreamStoppedEvent {
    #[serde(flatten)]
    pub timecodes: Timecodes,
}

impl Event for StreamStoppedEvent {
    const NAME: &'static str = "StreamStopped";
}

/// OBS is shutting down.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExitingEvent {
    #[serde(flatten)]
    pub timecodes: Timecodes,
}

impl Event for ExitingEvent {
    const NAME: &'static str = "Exiting";
}

/// A custom message sent by another client through `BroadcastCustomMessage`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BroadcastCustomMessageEvent {
    pub realm: String,
    pub data: Value,
    #[serde(flatten)]
    pub timecodes: Timecodes,
}

impl Event for BroadcastCustomMessageEvent {
    const NAME: &'static str = "BroadcastCustomMessage";
}
