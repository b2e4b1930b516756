use serde::{Deserialize, Serialize};

/// One outbound wire frame: `{ "type": <op>, "data": <op-specific object> }`.
#[derive(Debug, Clone, Serialize)]
pub struct WsRequest<T> {
    #[serde(rename = "type")]
    pub op: &'static str,
    pub data: T,
}

/// One inbound wire frame: `{ "type", "code", "msg", "data"? }`.
#[derive(Debug, Clone, Deserialize)]
pub struct WsResponse {
    #[serde(rename = "type")]
    pub op: String,
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PoweronRequest {
    pub model_path: String,
    pub lexical_shortlist_path: String,
    pub vocabulary_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PoweronResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PoweroffRequest {
    pub time: i64,
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PoweroffResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RebootRequest {
    pub time: i64,
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RebootResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReadyResponse {
    #[serde(default)]
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComputeRequest {
    pub text: String,
    pub html: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ComputeResponse {
    #[serde(default)]
    pub translated_text: String,
}
