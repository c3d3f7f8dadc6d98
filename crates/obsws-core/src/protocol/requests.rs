//! Typed requests.
//!
//! Each request is a plain struct whose fields are the request parameters.  The
//! [`Request`] trait ties it to its wire name and its response type so the
//! client can offer one generic `call` instead of one method per request.
//!
//! Only a representative subset of the protocol lives here: the two requests
//! the connection handshake needs plus a handful of everyday ones.  Anything
//! else can be issued untyped through the client's raw call.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthChallenge;

/// A request that can be sent to the server.
///
/// # Examples
///
/// ```rust
/// use obsws_core::Request;
/// use obsws_core::protocol::requests::SetHeartbeat;
///
/// assert_eq!(SetHeartbeat::NAME, "SetHeartbeat");
/// ```
pub trait Request: Serialize {
    /// The `request-type` sent on the wire.
    const NAME: &'static str;

    /// The typed shape of a successful reply.
    type Response: DeserializeOwned;
}

/// Reply type for requests whose success carries no fields.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EmptyResponse {}

// ── Handshake ────────────────────────────────────────────────────────────────

/// Asks whether the server requires authentication.  Always allowed, even
/// before authenticating.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetAuthRequired {}

/// Reply to [`GetAuthRequired`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GetAuthRequiredResponse {
    #[serde(rename = "authRequired")]
    pub auth_required: bool,
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub salt: String,
}

impl GetAuthRequiredResponse {
    /// The challenge to answer, or `None` when no authentication is needed.
    pub fn challenge(&self) -> Option<AuthChallenge> {
        self.auth_required.then(|| AuthChallenge {
            challenge: self.challenge.clone(),
            salt: self.salt.clone(),
        })
    }
}

/// Submits the answer to the authentication challenge.
#[derive(Debug, Clone, Serialize)]
pub struct Authenticate {
    /// Token computed by [`crate::auth::auth_response`].
    pub auth: String,
}

impl Request for GetAuthRequired {
    const NAME: &'static str = "GetAuthRequired";
    type Response = GetAuthRequiredResponse;
}

impl Request for Authenticate {
    const NAME: &'static str = "Authenticate";
    type Response = EmptyResponse;
}

// ── General ──────────────────────────────────────────────────────────────────

/// Returns the server and plugin versions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetVersion {}

/// Reply to [`GetVersion`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GetVersionResponse {
    /// OBSRemote compatible API version, fixed to 1.1.
    pub version: f64,
    #[serde(rename = "obs-websocket-version")]
    pub obs_websocket_version: String,
    #[serde(rename = "obs-studio-version")]
    pub obs_studio_version: String,
    /// Comma-separated list of request names the server supports.
    #[serde(rename = "available-requests", default)]
    pub available_requests: String,
    #[serde(rename = "supported-image-export-formats", default)]
    pub supported_image_export_formats: String,
}

impl GetVersionResponse {
    /// Iterates over the request names listed in `available-requests`.
    pub fn available_requests(&self) -> impl Iterator<Item = &str> {
        self.available_requests
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

impl Request for GetVersion {
    const NAME: &'static str = "GetVersion";
    type Response = GetVersionResponse;
}

/// Enables or disables the periodic `Heartbeat` event.
#[derive(Debug, Clone, Serialize)]
pub struct SetHeartbeat {
    pub enable: bool,
}

impl Request for SetHeartbeat {
    const NAME: &'static str = "SetHeartbeat";
    type Response = EmptyResponse;
}

/// Broadcasts a custom message to every connected websocket client.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastCustomMessage {
    /// Identifier chosen by the sender so receivers can filter.
    pub realm: String,
    /// Arbitrary JSON object.
    pub data: Value,
}

impl Request for BroadcastCustomMessage {
    const NAME: &'static str = "BroadcastCustomMessage";
    type Response = EmptyResponse;
}

// ── Scenes ───────────────────────────────────────────────────────────────────

/// A source placed in a scene.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneItem {
    pub name: String,
    pub id: i64,
    /// `"input"`, `"filter"`, `"transition"`, `"scene"` or `"unknown"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub render: bool,
    pub muted: bool,
    pub locked: bool,
}

/// Returns the scene currently shown on program output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetCurrentScene {}

/// Reply to [`GetCurrentScene`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GetCurrentSceneResponse {
    pub name: String,
    #[serde(default)]
    pub sources: Vec<SceneItem>,
}

impl Request for GetCurrentScene {
    const NAME: &'static str = "GetCurrentScene";
    type Response = GetCurrentSceneResponse;
}

/// Switches program output to another scene.
#[derive(Debug, Clone, Serialize)]
pub struct SetCurrentScene {
    #[serde(rename = "scene-name")]
    pub scene_name: String,
}

impl Request for SetCurrentScene {
    const NAME: &'static str = "SetCurrentScene";
    type Response = EmptyResponse;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::{decode_payload, encode_params};
    use serde_json::json;

    #[test]
    fn test_parameterless_request_encodes_to_empty_object() {
        assert_eq!(encode_params(&GetAuthRequired::default()).unwrap(), json!({}));
        assert_eq!(encode_params(&GetVersion::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_set_current_scene_uses_hyphenated_key() {
        let params = encode_params(&SetCurrentScene {
            scene_name: "Live".to_string(),
        })
        .unwrap();
        assert_eq!(params, json!({ "scene-name": "Live" }));
    }

    #[test]
    fn test_auth_required_response_yields_challenge() {
        // Arrange
        let payload = json!({
            "message-id": "1", "status": "ok",
            "authRequired": true, "challenge": "c1", "salt": "s1"
        });

        // Act
        let reply: GetAuthRequiredResponse = decode_payload(&payload).unwrap();

        // Assert
        assert_eq!(
            reply.challenge(),
            Some(AuthChallenge {
                challenge: "c1".to_string(),
                salt: "s1".to_string()
            })
        );
    }

    #[test]
    fn test_auth_not_required_response_has_no_challenge() {
        let payload = json!({ "message-id": "1", "status": "ok", "authRequired": false });
        let reply: GetAuthRequiredResponse = decode_payload(&payload).unwrap();
        assert!(!reply.auth_required);
        assert_eq!(reply.challenge(), None);
    }

    #[test]
    fn test_empty_response_accepts_any_object() {
        let payload = json!({ "message-id": "1", "status": "ok", "extra": [1, 2] });
        assert_eq!(decode_payload::<EmptyResponse>(&payload).unwrap(), EmptyResponse {});
    }

    #[test]
    fn test_get_version_available_requests_are_split() {
        let payload = json!({
            "version": 1.1,
            "obs-websocket-version": "4.9.1",
            "obs-studio-version": "27.0.0",
            "available-requests": "GetVersion, SetHeartbeat,,GetCurrentScene"
        });
        let reply: GetVersionResponse = decode_payload(&payload).unwrap();
        let names: Vec<&str> = reply.available_requests().collect();
        assert_eq!(names, ["GetVersion", "SetHeartbeat", "GetCurrentScene"]);
    }

    #[test]
    fn test_get_current_scene_decodes_scene_items() {
        let payload = json!({
            "name": "Live",
            "sources": [{ "name": "Camera", "id": 3, "type": "input", "render": true }]
        });
        let reply: GetCurrentSceneResponse = decode_payload(&payload).unwrap();
        assert_eq!(reply.name, "Live");
        assert_eq!(reply.sources[0].kind, "input");
        assert!(reply.sources[0].render);
        assert!(!reply.sources[0].muted);
    }
}
