use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::{SinkExt, TryStreamExt};
use reqwest::Client;
use reqwest_websocket::{Message, RequestBuilderExt, WebSocket};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::CliConfig;
use crate::error::{ApiError, check_response};

/// Authenticated access to the API: JSON over HTTP plus the websocket
/// endpoints handed out by the `execute` and `logs` actions.
pub struct ApiClient<'a> {
    http: Client,
    config: &'a CliConfig,
}

impl<'a> ApiClient<'a> {
    pub fn new(http: Client, config: &'a CliConfig) -> Self {
        ApiClient { http, config }
    }

    pub fn config(&self) -> &CliConfig {
        self.config
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        log::debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .basic_auth(self.config.access_key(), Some(self.config.secret_key()))
            .send()
            .await?;
        Ok(check_response(response, "GET").await?.json().await?)
    }

    /// POST `body` as JSON. Without a body an empty payload is sent.
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        log::debug!("POST {url}");
        let request = self
            .http
            .post(url)
            .basic_auth(self.config.access_key(), Some(self.config.secret_key()));
        let request = match body {
            Some(body) => request.json(body),
            None => request.body(""),
        };

        let response = check_response(request.send().await?, "POST").await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn connect(&self, url: &str) -> Result<WebSocket, ApiError> {
        log::debug!("Opening websocket {url}");
        let response = self
            .http
            .get(url)
            .basic_auth(self.config.access_key(), Some(self.config.secret_key()))
            .upgrade()
            .send()
            .await
            .map_err(socket_error)?;

        response
            .into_websocket()
            .await
            .map_err(|e| ApiError::Socket(format!("failed to upgrade to websocket: {e}")))
    }

    /// Read a single base64 encoded frame and close the socket.
    pub async fn read_socket(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let mut ws = self.connect(url).await?;

        let frame = loop {
            match ws.try_next().await.map_err(socket_error)? {
                Some(Message::Text(text)) => break text.as_bytes().to_vec(),
                Some(Message::Binary(bytes)) => break bytes.to_vec(),
                Some(Message::Close { .. }) | None => {
                    return Err(ApiError::Socket(
                        "connection closed before any data was received".to_string(),
                    ));
                }
                Some(_) => continue,
            }
        };

        if let Err(e) = SinkExt::close(&mut ws).await {
            log::debug!("Closing websocket failed: {e}");
        }

        decode_frame(&frame)
    }

    /// Hand every data frame to `on_frame` until the remote side closes.
    pub async fn stream_frames(
        &self,
        url: &str,
        mut on_frame: impl FnMut(&str),
    ) -> Result<(), ApiError> {
        let mut ws = self.connect(url).await?;

        loop {
            match ws.try_next().await.map_err(socket_error)? {
                Some(Message::Text(text)) => on_frame(&text),
                Some(Message::Binary(bytes)) => on_frame(&String::from_utf8_lossy(&bytes)),
                Some(Message::Close { .. }) | None => break,
                Some(_) => {}
            }
        }
        log::debug!("Websocket closed by remote");
        Ok(())
    }
}

fn socket_error(e: reqwest_websocket::Error) -> ApiError {
    ApiError::Socket(e.to_string())
}

pub fn decode_frame(frame: &[u8]) -> Result<Vec<u8>, ApiError> {
    STANDARD
        .decode(frame.trim_ascii())
        .map_err(|e| ApiError::Socket(format!("frame is not valid base64: {e}")))
}
