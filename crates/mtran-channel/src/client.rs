use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::errors::ChannelError;
use crate::messages::{
    ComputeRequest, ComputeResponse, PoweroffRequest, PoweroffResponse, PoweronRequest,
    PoweronResponse, ReadyResponse, RebootRequest, RebootResponse, WsRequest, WsResponse,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const POWEROFF_ACCEPTED_DRAINING: i64 = 1101;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Persistent, single-flighted, request/response connection to one worker.
pub struct ChannelClient {
    url: String,
    timeout: Duration,
    stream: Mutex<Option<WsStream>>,
}

impl ChannelClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            stream: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn connect(&self) -> Result<(), ChannelError> {
        let mut slot = self.stream.lock().await;
        if slot.is_some() {
            return Ok(());
        }
        let (stream, _response) = connect_async(&self.url)
            .await
            .map_err(|err| ChannelError::Transport(err.to_string()))?;
        *slot = Some(stream);
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.stream.lock().await.is_some()
    }

    /// Idempotent; safe to call on an already-closed or never-connected client.
    pub async fn close(&self) {
        let mut slot = self.stream.lock().await;
        if let Some(mut stream) = slot.take() {
            let _ = stream.close(None).await;
        }
    }

    async fn send<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        op: &'static str,
        data: Req,
    ) -> Result<Resp, ChannelError> {
        let response = self.send_raw(op, data).await?;
        if response.code != 200 {
            return Err(ChannelError::Protocol {
                code: response.code,
                msg: response.msg,
            });
        }
        match response.data {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| ChannelError::Transport(err.to_string())),
            None => serde_json::from_value(serde_json::Value::Object(Default::default()))
                .map_err(|err| ChannelError::Transport(err.to_string())),
        }
    }

    async fn send_raw<Req: Serialize>(
        &self,
        op: &'static str,
        data: Req,
    ) -> Result<WsResponse, ChannelError> {
        let mut slot = self.stream.lock().await;
        let stream = slot.as_mut().ok_or(ChannelError::NotConnected)?;

        let request = WsRequest { op, data };
        let text = serde_json::to_string(&request)
            .map_err(|err| ChannelError::Transport(err.to_string()))?;

        let result = tokio::time::timeout(self.timeout, async {
            stream
                .send(Message::Text(text.into()))
                .await
                .map_err(|err| ChannelError::Transport(err.to_string()))?;

            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return serde_json::from_str::<WsResponse>(&text)
                            .map_err(|err| ChannelError::Transport(err.to_string()));
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => return Err(ChannelError::Transport(err.to_string())),
                    None => return Err(ChannelError::Transport("connection closed".to_string())),
                }
            }
        })
        .await;

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                *slot = None;
                Err(err)
            }
            Err(_) => {
                *slot = None;
                Err(ChannelError::Timeout)
            }
        }
    }

    pub async fn poweron(&self, req: PoweronRequest) -> Result<PoweronResponse, ChannelError> {
        self.send("poweron", req).await
    }

    /// `code == 1101` ("accepted, draining") is treated as success, same as `200`.
    pub async fn poweroff(&self, req: PoweroffRequest) -> Result<PoweroffResponse, ChannelError> {
        let response = self.send_raw("poweroff", req).await?;
        if response.code != 200 && response.code != POWEROFF_ACCEPTED_DRAINING {
            return Err(ChannelError::Protocol {
                code: response.code,
                msg: response.msg,
            });
        }
        match response.data {
            Some(value) => serde_json::from_value(value)
                .map_err(|err| ChannelError::Transport(err.to_string())),
            None => Ok(PoweroffResponse {
                message: response.msg,
            }),
        }
    }

    pub async fn reboot(&self, req: RebootRequest) -> Result<RebootResponse, ChannelError> {
        self.send("reboot", req).await
    }

    pub async fn ready(&self) -> Result<bool, ChannelError> {
        let response: ReadyResponse = self.send("ready", serde_json::json!({})).await?;
        Ok(response.ready)
    }

    pub async fn compute(&self, text: String, html: bool) -> Result<String, ChannelError> {
        let response: ComputeResponse = self.send("compute", ComputeRequest { text, html }).await?;
        Ok(response.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn operations_fail_not_connected_before_connect() {
        let client = ChannelClient::new("ws://127.0.0.1:1/ws");
        assert!(!client.is_connected().await);
        let err = client.ready().await.unwrap_err();
        assert!(matches!(err, ChannelError::NotConnected));
    }

    #[tokio::test]
    async fn close_is_idempotent_without_a_connection() {
        let client = ChannelClient::new("ws://127.0.0.1:1/ws");
        client.close().await;
        client.close().await;
        assert!(!client.is_connected().await);
    }
}
