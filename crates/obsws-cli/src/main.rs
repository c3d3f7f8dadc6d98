//! obsws: command-line remote control for OBS Studio.
//!
//! Connects to an obs-websocket server, authenticates if the server asks for
//! it, issues one request, and prints the reply as JSON.  With `--watch` it
//! then stays connected and prints the named events until Ctrl+C.
//!
//! # Usage
//!
//! ```text
//! obsws [OPTIONS] [REQUEST] [PARAMS]
//!
//! Arguments:
//!   [REQUEST]  Request type to issue [default: GetVersion]
//!   [PARAMS]   Request parameters as a JSON object
//!
//! Options:
//!   --address <ADDR>          host:port or ws:// URL of the server
//!   --password <PASSWORD>     Server password
//!   --config <PATH>           TOML configuration file
//!   --request-timeout <SECS>  Per-request deadline, 0 disables it
//!   --watch <EVENT>           Print events of this type (repeatable)
//! ```
//!
//! # Examples
//!
//! ```text
//! obsws GetCurrentScene
//! obsws SetCurrentScene '{"scene-name":"Intermission"}'
//! obsws --watch SwitchScenes --watch StreamStopped
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable         | Description                                  |
//! |------------------|----------------------------------------------|
//! | `OBSWS_ADDRESS`  | Server address (see `--address`)             |
//! | `OBSWS_PASSWORD` | Server password (see `--password`)           |
//! | `RUST_LOG`       | Log filter, e.g. `debug` (default: `info`)   |
//!
//! Command-line values win over the config file, which wins over the
//! built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use obsws_client::{Client, ClientConfig, ConnectionEvent};
use obsws_core::protocol::requests::GetVersion;
use obsws_core::Request;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line remote control for OBS Studio over obs-websocket.
#[derive(Debug, Parser)]
#[command(
    name = "obsws",
    about = "Command-line remote control for OBS Studio over obs-websocket",
    version
)]
struct Cli {
    /// Server address: `host:port` or a full `ws://` URL.
    ///
    /// Defaults to the config file value, then `127.0.0.1:4444`.
    #[arg(long, env = "OBSWS_ADDRESS")]
    address: Option<String>,

    /// Server password, used only when the server requires authentication.
    #[arg(long, env = "OBSWS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// TOML configuration file (address, password, timeouts).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-request deadline in seconds; 0 waits indefinitely.
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Event type to print after the request completes.  May be repeated.
    #[arg(long = "watch", value_name = "EVENT")]
    watch: Vec<String>,

    /// Request type to issue.
    #[arg(default_value = GetVersion::NAME)]
    request: String,

    /// Request parameters as a JSON object.
    params: Option<String>,
}

impl Cli {
    /// Parses the `PARAMS` argument.  Absent parameters become `{}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or not a JSON object.
    fn request_params(&self) -> anyhow::Result<Value> {
        let Some(text) = self.params.as_deref() else {
            return Ok(Value::Object(Default::default()));
        };
        let params: Value = serde_json::from_str(text)
            .with_context(|| format!("request parameters are not valid JSON: '{text}'"))?;
        if !params.is_object() {
            bail!("request parameters must be a JSON object, got '{text}'");
        }
        Ok(params)
    }

    /// Builds the [`ClientConfig`]: defaults, then the config file, then the
    /// command-line and environment values.
    ///
    /// # Errors
    ///
    /// Returns an error if `--config` names a file that cannot be read or
    /// parsed.
    fn into_client_config(self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(password) = self.password.filter(|p| !p.is_empty()) {
            config.password = Some(password);
        }
        if let Some(secs) = self.request_timeout {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Removes the envelope keys from a reply so only the payload is printed.
fn strip_envelope(mut reply: Value) -> Value {
    if let Some(fields) = reply.as_object_mut() {
        fields.remove("message-id");
        fields.remove("status");
    }
    reply
}

// ── Watching ──────────────────────────────────────────────────────────────────

/// Waits for Ctrl+C or for the connection to end, logging server notices.
async fn watch_until_shutdown(notices: &mut mpsc::UnboundedReceiver<ConnectionEvent>) {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                match signal {
                    Ok(()) => info!("received Ctrl+C; closing"),
                    Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
                }
                return;
            }
            notice = notices.recv() => match notice {
                Some(ConnectionEvent::ServerError(message)) => warn!("server error: {message}"),
                Some(ConnectionEvent::Lost(e)) => {
                    error!("connection lost: {e}");
                    return;
                }
                None => return,
            },
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. Logging is initialised from `RUST_LOG` (default `info`).
/// 2. Arguments are parsed and merged with the optional config file.
/// 3. The client connects and authenticates with the configured password.
/// 4. The request is issued and its reply printed to stdout.
/// 5. With `--watch`, events are printed until Ctrl+C or disconnect.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let request = cli.request.clone();
    let params = cli.request_params()?;
    let watch = cli.watch.clone();
    let config = cli.into_client_config()?;
    let address = config.address.clone();

    info!("obsws starting: server={address}");

    let client = Client::new(config);
    for event_type in &watch {
        let label = event_type.clone();
        client.set_raw_event_handler(event_type.clone(), move |payload| {
            println!("{label}: {payload}");
        });
    }

    let mut outcome = client
        .connect_from_config()
        .await
        .with_context(|| format!("failed to connect to {address}"))?;
    if !client.is_ready() {
        bail!("server requires a password; pass --password or set OBSWS_PASSWORD");
    }

    let reply = client
        .call_raw(&request, params)
        .await
        .with_context(|| format!("{request} failed"))?;
    println!("{}", serde_json::to_string_pretty(&strip_envelope(reply))?);

    if !watch.is_empty() {
        info!("watching {} event type(s); press Ctrl+C to stop", watch.len());
        watch_until_shutdown(&mut outcome.notices).await;
    }

    if client.is_connected() {
        client.close().await?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cli() -> Cli {
        Cli {
            address: None,
            password: None,
            config: None,
            request_timeout: None,
            watch: Vec::new(),
            request: GetVersion::NAME.to_string(),
            params: None,
        }
    }

    #[test]
    fn test_cli_default_request_is_get_version() {
        let cli = Cli::parse_from(["obsws"]);
        assert_eq!(cli.request, "GetVersion");
        assert_eq!(cli.params, None);
    }

    #[test]
    fn test_cli_positional_request_and_params() {
        // Arrange / Act
        let cli = Cli::parse_from(["obsws", "SetCurrentScene", r#"{"scene-name":"Live"}"#]);

        // Assert
        assert_eq!(cli.request, "SetCurrentScene");
        assert_eq!(cli.request_params().unwrap(), json!({ "scene-name": "Live" }));
    }

    #[test]
    fn test_cli_watch_is_repeatable() {
        let cli = Cli::parse_from(["obsws", "--watch", "SwitchScenes", "--watch", "Exiting"]);
        assert_eq!(cli.watch, ["SwitchScenes", "Exiting"]);
    }

    #[test]
    fn test_cli_address_override() {
        let cli = Cli::parse_from(["obsws", "--address", "10.0.0.5:4455"]);
        assert_eq!(cli.address.as_deref(), Some("10.0.0.5:4455"));
    }

    #[test]
    fn test_request_params_default_to_empty_object() {
        assert_eq!(cli().request_params().unwrap(), json!({}));
    }

    #[test]
    fn test_request_params_reject_invalid_json() {
        let cli = Cli {
            params: Some("{not json".to_string()),
            ..cli()
        };
        assert!(cli.request_params().is_err());
    }

    #[test]
    fn test_request_params_reject_non_object() {
        let cli = Cli {
            params: Some("[1, 2, 3]".to_string()),
            ..cli()
        };
        assert!(cli.request_params().is_err());
    }

    #[test]
    fn test_into_client_config_defaults() {
        let config = cli().into_client_config().unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_into_client_config_overrides() {
        // Arrange
        let cli = Cli {
            address: Some("obs.local:4455".to_string()),
            password: Some("hunter2".to_string()),
            request_timeout: Some(3),
            ..cli()
        };

        // Act
        let config = cli.into_client_config().unwrap();

        // Assert
        assert_eq!(config.address, "obs.local:4455");
        assert_eq!(config.password.as_deref(), Some("hunter2"));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_into_client_config_zero_timeout_disables_deadline() {
        let cli = Cli {
            request_timeout: Some(0),
            ..cli()
        };
        assert_eq!(cli.into_client_config().unwrap().request_timeout, None);
    }

    #[test]
    fn test_into_client_config_empty_password_is_ignored() {
        let cli = Cli {
            password: Some(String::new()),
            ..cli()
        };
        assert_eq!(cli.into_client_config().unwrap().password, None);
    }

    #[test]
    fn test_into_client_config_flags_win_over_file() {
        // Arrange: a config file with an address and password.
        let path = std::env::temp_dir().join(format!("obsws-cli-test-{}.toml", std::process::id()));
        std::fs::write(&path, "address = \"file:4444\"\npassword = \"from-file\"\n").unwrap();
        let cli = Cli {
            config: Some(path.clone()),
            address: Some("flag:4444".to_string()),
            ..cli()
        };

        // Act
        let config = cli.into_client_config();
        let _ = std::fs::remove_file(&path);

        // Assert
        let config = config.unwrap();
        assert_eq!(config.address, "flag:4444");
        assert_eq!(config.password.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_into_client_config_missing_file_returns_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/obsws.toml")),
            ..cli()
        };
        assert!(cli.into_client_config().is_err());
    }

    #[test]
    fn test_strip_envelope_keeps_payload_only() {
        let reply = json!({ "message-id": "1", "status": "ok", "name": "Live" });
        assert_eq!(strip_envelope(reply), json!({ "name": "Live" }));
    }

    #[test]
    fn test_strip_envelope_leaves_non_objects_alone() {
        assert_eq!(strip_envelope(json!(null)), json!(null));
    }
}
