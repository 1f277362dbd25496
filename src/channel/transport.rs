// WAF Monitor - Push Transport
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Persistent websocket connection to the backend.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};

/// Source of raw push frames.
///
/// Returns `None` only when the transport is shut down for good.
#[async_trait]
pub trait PushTransport: Send {
    async fn next_frame(&mut self) -> Option<String>;
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket transport that reconnects on its own.
///
/// Frames sent by the backend while the socket is down are lost.
pub struct WsTransport {
    url: String,
    reconnect_delay: Duration,
    socket: Option<Socket>,
}

impl WsTransport {
    pub fn new(url: &str, reconnect_delay: Duration) -> Self {
        Self {
            url: url.to_string(),
            reconnect_delay,
            socket: None,
        }
    }

    async fn connect(&mut self) {
        match connect_async(self.url.as_str()).await {
            Ok((socket, _)) => {
                info!("Push channel connected to {}", self.url);
                self.socket = Some(socket);
            }
            Err(e) => {
                debug!("Push channel connect failed: {}", e);
                tokio::time::sleep(self.reconnect_delay).await;
            }
        }
    }

    async fn drop_connection(&mut self) {
        self.socket = None;
        tokio::time::sleep(self.reconnect_delay).await;
    }
}

#[async_trait]
impl PushTransport for WsTransport {
    async fn next_frame(&mut self) -> Option<String> {
        loop {
            let Some(socket) = self.socket.as_mut() else {
                self.connect().await;
                continue;
            };

            match socket.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(text),
                    Err(_) => debug!("Ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("Push channel disconnected, reconnecting");
                    self.drop_connection().await;
                }
                Some(Ok(other)) => trace!("Ignoring control frame: {:?}", other),
                Some(Err(e)) => {
                    debug!("Push channel error: {}", e);
                    self.drop_connection().await;
                }
            }
        }
    }
}
