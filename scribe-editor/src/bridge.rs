//! UI-side capability filter.
//!
//! The bridge is the only object the UI side talks to. It refuses to subscribe
//! to, or emit on, any channel outside the fixed inbound/outbound sets; refused
//! attempts are logged and never reach the transport.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::protocol::{
    parse_host_message, Envelope, HostMessage, InboundChannel, InboundEvent, InvokeCall,
    InvokeReply, OpenFileResult, OutboundChannel, OutboundMessage,
};

/// The raw channel to the host.
pub trait Transport {
    /// Hand an envelope to the host. Fails only when the host side is gone.
    fn post(&self, envelope: Envelope) -> Result<(), String>;
}

pub type Listener = Rc<dyn Fn(&InboundEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("host rejected the call: {0}")]
    Host(String),
    #[error("host connection closed")]
    Disconnected,
    #[error("unexpected reply to {0}")]
    UnexpectedReply(&'static str),
}

pub struct Bridge<T: Transport> {
    transport: T,
    listeners: RefCell<HashMap<InboundChannel, Vec<(ListenerId, Listener)>>>,
    pending: RefCell<HashMap<u64, oneshot::Sender<InvokeReply>>>,
    next_listener: Cell<u64>,
    next_request: Cell<u64>,
}

impl<T: Transport> Bridge<T> {
    pub fn new(transport: T) -> Self {
        Bridge {
            transport,
            listeners: RefCell::new(HashMap::new()),
            pending: RefCell::new(HashMap::new()),
            next_listener: Cell::new(1),
            next_request: Cell::new(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Listen on an inbound channel by name. Unknown names are refused.
    pub fn on<F>(&self, channel: &str, listener: F) -> Option<ListenerId>
    where
        F: Fn(&InboundEvent) + 'static,
    {
        match InboundChannel::parse(channel) {
            Some(channel) => Some(self.on_channel(channel, listener)),
            None => {
                log::warn!("Attempted to listen to unauthorized channel: {}", channel);
                None
            }
        }
    }

    pub fn on_channel<F>(&self, channel: InboundChannel, listener: F) -> ListenerId
    where
        F: Fn(&InboundEvent) + 'static,
    {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(channel)
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn remove_listener(&self, channel: &str, id: ListenerId) -> bool {
        let Some(channel) = InboundChannel::parse(channel) else {
            log::warn!(
                "Attempted to remove listener from unauthorized channel: {}",
                channel
            );
            return false;
        };
        let mut listeners = self.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(&channel) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        before != entries.len()
    }

    // -----------------------------------------------------------------------
    // Fire-and-forget
    // -----------------------------------------------------------------------

    /// Emit on an outbound channel by name. The payload must match the
    /// channel's message shape; anything else is logged and dropped.
    pub fn send(&self, channel: &str, payload: Value) {
        let Some(outbound) = OutboundChannel::parse(channel) else {
            log::warn!("Attempted to send to unauthorized channel: {}", channel);
            return;
        };
        if outbound.is_invoke() {
            log::warn!("Channel {} only accepts invokes", channel);
            return;
        }

        let mut fields = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                log::warn!("Dropping non-object payload for {}: {}", channel, other);
                return;
            }
        };
        fields.insert("channel".to_string(), Value::String(channel.to_string()));

        match serde_json::from_value::<OutboundMessage>(Value::Object(fields)) {
            Ok(message) => self.send_message(message),
            Err(e) => log::warn!("Dropping malformed payload for {}: {}", channel, e),
        }
    }

    pub fn send_message(&self, message: OutboundMessage) {
        let channel = message.channel();
        if let Err(e) = self.transport.post(Envelope::Send { message }) {
            log::error!("Failed to send on {}: {}", channel.as_str(), e);
        }
    }

    pub fn reset_image(&self) {
        self.send_message(OutboundMessage::ResetImage);
    }

    pub fn new_file(&self) {
        self.send_message(OutboundMessage::NewFile);
    }

    // -----------------------------------------------------------------------
    // Invokes
    // -----------------------------------------------------------------------

    /// Post `call` now; the returned future resolves with the host's reply.
    fn invoke(&self, call: InvokeCall) -> impl Future<Output = Result<InvokeReply, BridgeError>> {
        let request_id = self.next_request.get();
        self.next_request.set(request_id + 1);

        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().insert(request_id, tx);

        let channel = call.channel();
        if let Err(e) = self.transport.post(Envelope::Invoke { request_id, call }) {
            log::error!("Failed to invoke {}: {}", channel.as_str(), e);
            // Dropping the sender resolves the caller with Disconnected.
            self.pending.borrow_mut().remove(&request_id);
        }

        async move {
            match rx.await {
                Ok(InvokeReply::Failed(message)) => Err(BridgeError::Host(message)),
                Ok(reply) => Ok(reply),
                Err(_) => Err(BridgeError::Disconnected),
            }
        }
    }

    /// Save `content`, letting the host ask for a path when `file_path` is
    /// missing or a placeholder. Resolves to the saved path, or `None` when
    /// the user cancelled or the write failed.
    pub fn save_file(
        &self,
        content: impl Into<String>,
        file_path: Option<String>,
    ) -> impl Future<Output = Result<Option<String>, BridgeError>> {
        let reply = self.invoke(InvokeCall::SaveFile {
            content: content.into(),
            file_path,
        });
        async move {
            match reply.await? {
                InvokeReply::Saved(path) => Ok(path),
                _ => Err(BridgeError::UnexpectedReply("save-file")),
            }
        }
    }

    pub fn open_file(&self) -> impl Future<Output = Result<Option<OpenFileResult>, BridgeError>> {
        let reply = self.invoke(InvokeCall::OpenFile);
        async move {
            match reply.await? {
                InvokeReply::Opened(result) => Ok(result),
                _ => Err(BridgeError::UnexpectedReply("open-file")),
            }
        }
    }

    /// Number of invokes still waiting on the host.
    pub fn pending_invokes(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Fail every outstanding invoke; used when the host side goes away.
    pub fn disconnect(&self) {
        let dropped = self.pending.borrow_mut().drain().count();
        if dropped > 0 {
            log::warn!("Host disconnected with {} invokes in flight", dropped);
        }
    }

    // -----------------------------------------------------------------------
    // Host traffic
    // -----------------------------------------------------------------------

    pub fn receive(&self, message: HostMessage) {
        match message {
            HostMessage::Event { event } => self.dispatch(&event),
            HostMessage::Reply { request_id, reply } => {
                let sender = self.pending.borrow_mut().remove(&request_id);
                match sender {
                    Some(tx) => {
                        if tx.send(reply).is_err() {
                            log::debug!("Caller for request {} went away", request_id);
                        }
                    }
                    None => log::warn!("Reply for unknown request {}", request_id),
                }
            }
        }
    }

    pub fn receive_json(&self, json: &str) {
        match parse_host_message(json) {
            Ok(message) => self.receive(message),
            Err(e) => log::warn!("Rejected host message: {}", e),
        }
    }

    fn dispatch(&self, event: &InboundEvent) {
        // Snapshot so listeners may (un)register while being called.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .get(&event.channel())
            .map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();
        if listeners.is_empty() {
            log::debug!("No listeners for {}", event.channel().as_str());
        }
        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::SplitMode;
    use serde_json::json;

    #[derive(Default)]
    struct SpyTransport {
        posted: RefCell<Vec<Envelope>>,
        closed: Cell<bool>,
    }

    impl Transport for SpyTransport {
        fn post(&self, envelope: Envelope) -> Result<(), String> {
            if self.closed.get() {
                return Err("closed".to_string());
            }
            self.posted.borrow_mut().push(envelope);
            Ok(())
        }
    }

    fn last_request_id(bridge: &Bridge<SpyTransport>) -> u64 {
        match bridge.transport().posted.borrow().last() {
            Some(Envelope::Invoke { request_id, .. }) => *request_id,
            other => panic!("expected an invoke, got {:?}", other),
        }
    }

    #[test]
    fn send_to_unauthorized_channel_never_reaches_transport() {
        let bridge = Bridge::new(SpyTransport::default());
        bridge.send("file-saved", json!({"file_path": "/etc/passwd"}));
        bridge.send("delete-everything", Value::Null);
        bridge.send("", Value::Null);
        assert!(bridge.transport().posted.borrow().is_empty());
    }

    #[test]
    fn send_refuses_invoke_channels() {
        let bridge = Bridge::new(SpyTransport::default());
        bridge.send("save-file", json!({"content": "x"}));
        bridge.send("open-file", Value::Null);
        assert!(bridge.transport().posted.borrow().is_empty());
    }

    #[test]
    fn send_drops_malformed_payload() {
        let bridge = Bridge::new(SpyTransport::default());
        bridge.send("update-split-mode", json!({"mode": "sideways"}));
        bridge.send("new-file", json!("not an object"));
        assert!(bridge.transport().posted.borrow().is_empty());
    }

    #[test]
    fn send_forwards_typed_message() {
        let bridge = Bridge::new(SpyTransport::default());
        bridge.send("update-split-mode", json!({"mode": "vertical"}));
        bridge.send("new-file", Value::Null);
        let posted = bridge.transport().posted.borrow();
        assert_eq!(
            posted[0],
            Envelope::Send {
                message: OutboundMessage::UpdateSplitMode {
                    mode: SplitMode::Vertical
                }
            }
        );
        assert_eq!(
            posted[1],
            Envelope::Send {
                message: OutboundMessage::NewFile
            }
        );
    }

    #[test]
    fn listeners_receive_only_their_channel() {
        let bridge = Bridge::new(SpyTransport::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bridge
            .on("file-saved", move |event| sink.borrow_mut().push(event.clone()))
            .unwrap();

        bridge.receive(InboundEvent::NewFile.into());
        bridge.receive(
            InboundEvent::FileSaved {
                file_path: "/tmp/a.txt".into(),
            }
            .into(),
        );

        assert_eq!(
            *seen.borrow(),
            vec![InboundEvent::FileSaved {
                file_path: "/tmp/a.txt".into()
            }]
        );
    }

    #[test]
    fn unauthorized_listen_is_refused() {
        let bridge = Bridge::new(SpyTransport::default());
        assert!(bridge.on("update-split-mode", |_| {}).is_none());
        assert!(bridge.on("pong", |_| {}).is_none());
    }

    #[test]
    fn remove_listener_stops_delivery() {
        let bridge = Bridge::new(SpyTransport::default());
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let id = bridge
            .on("new-file", move |_| counter.set(counter.get() + 1))
            .unwrap();

        bridge.receive(InboundEvent::NewFile.into());
        assert!(!bridge.remove_listener("pong", id));
        assert!(!bridge.remove_listener("file-saved", id));
        assert!(bridge.remove_listener("new-file", id));
        bridge.receive(InboundEvent::NewFile.into());

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn listener_may_unregister_itself_during_dispatch() {
        let bridge = Rc::new(Bridge::new(SpyTransport::default()));
        let count = Rc::new(Cell::new(0));
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&bridge);
        let (counter, own_id) = (count.clone(), slot.clone());
        let id = bridge.on_channel(InboundChannel::ResetImage, move |_| {
            counter.set(counter.get() + 1);
            if let (Some(bridge), Some(id)) = (weak.upgrade(), own_id.get()) {
                bridge.remove_listener("reset-image", id);
            }
        });
        slot.set(Some(id));

        bridge.receive(InboundEvent::ResetImage.into());
        bridge.receive(InboundEvent::ResetImage.into());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn receive_json_drops_unknown_inbound_channel() {
        let bridge = Bridge::new(SpyTransport::default());
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bridge.on("new-file", move |_| h.set(h.get() + 1)).unwrap();

        bridge.receive_json(r#"{"kind":"event","event":{"channel":"shutdown"}}"#);
        bridge.receive_json(r#"{"kind":"event","event":{"channel":"new-file"}}"#);
        assert_eq!(hits.get(), 1);
    }

    #[tokio::test]
    async fn save_file_resolves_with_host_reply() {
        let bridge = Bridge::new(SpyTransport::default());
        let pending = bridge.save_file("hi", Some("untitled.txt".to_string()));

        assert_eq!(
            bridge.transport().posted.borrow()[0],
            Envelope::Invoke {
                request_id: 1,
                call: InvokeCall::SaveFile {
                    content: "hi".into(),
                    file_path: Some("untitled.txt".into()),
                },
            }
        );

        bridge.receive(HostMessage::Reply {
            request_id: last_request_id(&bridge),
            reply: InvokeReply::Saved(Some("/tmp/out.txt".into())),
        });
        assert_eq!(pending.await.unwrap(), Some("/tmp/out.txt".to_string()));
        assert_eq!(bridge.pending_invokes(), 0);
    }

    #[tokio::test]
    async fn replies_are_matched_by_request_id() {
        let bridge = Bridge::new(SpyTransport::default());
        let save = bridge.save_file("a", Some("/tmp/a.txt".into()));
        let open = bridge.open_file();

        bridge.receive(HostMessage::Reply {
            request_id: 2,
            reply: InvokeReply::Opened(None),
        });
        bridge.receive(HostMessage::Reply {
            request_id: 1,
            reply: InvokeReply::Saved(None),
        });

        assert_eq!(open.await.unwrap(), None);
        assert_eq!(save.await.unwrap(), None);
    }

    #[tokio::test]
    async fn host_failure_propagates_to_caller() {
        let bridge = Bridge::new(SpyTransport::default());
        let pending = bridge.open_file();
        bridge.receive(HostMessage::Reply {
            request_id: last_request_id(&bridge),
            reply: InvokeReply::Failed("invalid window reference".into()),
        });
        match pending.await {
            Err(BridgeError::Host(message)) => assert_eq!(message, "invalid window reference"),
            other => panic!("expected host failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn mismatched_reply_is_an_error() {
        let bridge = Bridge::new(SpyTransport::default());
        let pending = bridge.open_file();
        bridge.receive(HostMessage::Reply {
            request_id: last_request_id(&bridge),
            reply: InvokeReply::Saved(Some("/x".into())),
        });
        assert!(matches!(
            pending.await,
            Err(BridgeError::UnexpectedReply("open-file"))
        ));
    }

    #[tokio::test]
    async fn closed_transport_resolves_disconnected() {
        let bridge = Bridge::new(SpyTransport::default());
        bridge.transport().closed.set(true);
        let pending = bridge.save_file("x", None);
        assert!(matches!(pending.await, Err(BridgeError::Disconnected)));
    }

    #[tokio::test]
    async fn disconnect_fails_in_flight_invokes() {
        let bridge = Bridge::new(SpyTransport::default());
        let pending = bridge.open_file();
        assert_eq!(bridge.pending_invokes(), 1);
        bridge.disconnect();
        assert!(matches!(pending.await, Err(BridgeError::Disconnected)));
    }
}
