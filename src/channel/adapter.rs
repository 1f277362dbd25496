// WAF Monitor - Notification Channel Adapter
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Topic-based dispatch of inbound push frames.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::transport::PushTransport;
use super::{Notification, Topic};
use crate::error::SyncError;

type Handler = Box<dyn Fn(Notification) + Send + Sync>;
type ErrorHandler = Box<dyn Fn(&SyncError) + Send + Sync>;

/// One inbound text frame: `{"topic": "...", "data": ...}`.
#[derive(Debug, Deserialize)]
struct Frame {
    topic: String,
    #[serde(default)]
    data: Value,
}

/// Routes decoded push messages to the handlers subscribed to their topic.
///
/// Handlers run synchronously, in arrival order, once per message.
#[derive(Default)]
pub struct NotificationChannel {
    handlers: HashMap<Topic, Vec<Handler>>,
    error_handlers: Vec<ErrorHandler>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every message on `topic`.
    pub fn subscribe<F>(&mut self, topic: Topic, handler: F)
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        self.handlers.entry(topic).or_default().push(Box::new(handler));
    }

    /// Register `handler` for frames that could not be decoded.
    pub fn on_error<F>(&mut self, handler: F)
    where
        F: Fn(&SyncError) + Send + Sync + 'static,
    {
        self.error_handlers.push(Box::new(handler));
    }

    /// Decode one frame and hand it to its subscribers.
    ///
    /// Returns the number of handlers invoked. Frames on unknown topics are
    /// ignored. Decode failures go to the error handlers before being
    /// returned.
    pub fn dispatch(&self, frame: &str) -> Result<usize, SyncError> {
        let result = self.route(frame);
        if let Err(e) = &result {
            for handler in &self.error_handlers {
                handler(e);
            }
        }
        result
    }

    fn route(&self, frame: &str) -> Result<usize, SyncError> {
        let frame: Frame =
            serde_json::from_str(frame).map_err(|e| SyncError::decode("push frame", e))?;

        let topic = match frame.topic.parse::<Topic>() {
            Ok(topic) => topic,
            Err(e) => {
                debug!("Ignoring push frame: {}", e);
                return Ok(0);
            }
        };

        let handlers = match self.handlers.get(&topic) {
            Some(handlers) if !handlers.is_empty() => handlers,
            _ => return Ok(0),
        };

        let notification = Notification::decode(topic, frame.data)?;
        for handler in handlers {
            handler(notification.clone());
        }
        Ok(handlers.len())
    }

    /// Pump frames from `transport` until it closes for good.
    ///
    /// Bad frames are logged and skipped; they never stop the loop.
    pub async fn run<T: PushTransport>(self, mut transport: T) {
        info!("Notification channel listening");
        while let Some(frame) = transport.next_frame().await {
            if let Err(e) = self.dispatch(&frame) {
                warn!("Dropping push frame: {}", e);
            }
        }
        info!("Notification channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedTransport {
        frames: VecDeque<String>,
    }

    #[async_trait]
    impl PushTransport for ScriptedTransport {
        async fn next_frame(&mut self) -> Option<String> {
            self.frames.pop_front()
        }
    }

    fn recording_channel(topics: &[Topic]) -> (NotificationChannel, Arc<Mutex<Vec<Notification>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut channel = NotificationChannel::new();
        for topic in topics {
            let seen = seen.clone();
            channel.subscribe(*topic, move |n| seen.lock().unwrap().push(n));
        }
        (channel, seen)
    }

    #[test]
    fn test_dispatch_routes_by_topic() {
        let (channel, seen) = recording_channel(&[Topic::AccessLogUpdate]);

        assert_eq!(channel.dispatch(r#"{"topic": "access_log_update", "data": null}"#).unwrap(), 1);
        assert_eq!(channel.dispatch(r#"{"topic": "tunnel_disconnection"}"#).unwrap(), 0);
        assert_eq!(channel.dispatch(r#"{"topic": "cluster_update", "data": 1}"#).unwrap(), 0);

        assert_eq!(*seen.lock().unwrap(), vec![Notification::AccessLogUpdated]);
    }

    #[test]
    fn test_every_subscriber_is_called_once() {
        let (mut channel, seen) = recording_channel(&[Topic::TunnelDisconnection]);
        let seen2 = seen.clone();
        channel.subscribe(Topic::TunnelDisconnection, move |n| seen2.lock().unwrap().push(n));

        channel.dispatch(r#"{"topic": "tunnel_disconnection"}"#).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_frames_are_decode_errors() {
        let (channel, seen) = recording_channel(&[Topic::SecurityLogUpdate]);

        assert!(matches!(channel.dispatch("garbage"), Err(SyncError::Decode { .. })));
        assert!(matches!(
            channel.dispatch(r#"{"topic": "security_log_update", "data": {"events": 5}}"#),
            Err(SyncError::Decode { .. })
        ));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_decode_failures_reach_error_handlers() {
        let (mut channel, _) = recording_channel(&[Topic::WafHealthUpdate]);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        channel.on_error(move |e| sink.lock().unwrap().push(e.to_string()));

        assert!(channel.dispatch(r#"{"topic": "waf_health_update", "data": "cpu"}"#).is_err());
        assert_eq!(channel.dispatch(r#"{"topic": "cluster_update"}"#).unwrap(), 0);
        channel.dispatch(r#"{"topic": "waf_health_update", "data": 3.5}"#).unwrap();

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("waf_health_update"));
    }

    #[tokio::test]
    async fn test_run_preserves_arrival_order_and_skips_bad_frames() {
        let (channel, seen) = recording_channel(&[Topic::WafHealthUpdate, Topic::TunnelDisconnection]);
        let transport = ScriptedTransport {
            frames: VecDeque::from(vec![
                r#"{"topic": "waf_health_update", "data": [1.0]}"#.to_string(),
                "{".to_string(),
                r#"{"topic": "tunnel_disconnection"}"#.to_string(),
                r#"{"topic": "waf_health_update", "data": [2.0]}"#.to_string(),
            ]),
        };

        channel.run(transport).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].topic(), Topic::WafHealthUpdate);
        assert_eq!(seen[1], Notification::TunnelDisconnected);
        assert_eq!(seen[2].topic(), Topic::WafHealthUpdate);
    }
}
