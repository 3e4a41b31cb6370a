//! Socket transport behind the realtime channel.
//!
//! The channel only needs "open a socket, read text frames, write text
//! frames"; [`Connector`] captures that so tests can swap in a scripted
//! socket.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::connection::RealtimeError;

/// Inbound frame as the channel sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Close,
}

pub type FrameSink = Pin<Box<dyn Sink<String, Error = RealtimeError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, RealtimeError>> + Send>>;

/// An open socket, split into its write and read halves.
pub struct Socket {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Socket, RealtimeError>;
}

/// Production connector using tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Socket, RealtimeError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| RealtimeError::Connect(e.to_string()))?;

        let (write, read) = ws_stream.split();

        let sink = write
            .with(|text: String| {
                future::ready(Ok::<_, tokio_tungstenite::tungstenite::Error>(Message::Text(
                    text.into(),
                )))
            })
            .sink_map_err(|e| RealtimeError::Io(e.to_string()));

        let stream = read.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.to_string()))),
                Ok(Message::Close(_)) => Some(Ok(Frame::Close)),
                Ok(Message::Ping(data)) => {
                    // Pong is handled automatically by tungstenite
                    crate::log_debug!("Received ping: {:?}", data);
                    None
                }
                // Ignore binary, pong, etc.
                Ok(_) => None,
                Err(e) => Some(Err(RealtimeError::Io(e.to_string()))),
            })
        });

        Ok(Socket {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
