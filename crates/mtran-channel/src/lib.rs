//! Persistent, single-flighted WebSocket connection to one worker process,
//! carrying `poweron`/`poweroff`/`reboot`/`ready`/`compute` request-response
//! pairs.

pub mod client;
pub mod errors;
pub mod messages;

pub use client::ChannelClient;
pub use errors::ChannelError;
pub use messages::{
    ComputeRequest, ComputeResponse, PoweroffRequest, PoweroffResponse, PoweronRequest,
    PoweronResponse, ReadyResponse, RebootRequest, RebootResponse, WsRequest, WsResponse,
};
