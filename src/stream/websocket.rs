//! 代理服务器 `/dashboard` websocket 连接
//!
//! 网络 I/O 在 tokio 任务中运行，入站帧通过无界通道交给 UI 线程，
//! UI 线程每帧调用 [`WebsocketEventStream::pump`] 处理，因此 handler、
//! 状态指示器和插件都只在 UI 线程上被访问。

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{MissedTickBehavior, sleep};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use super::{EventStream, MessageHandler};
use crate::config::ServerSettings;
use crate::dashboard::SharedStatus;

/// 每帧最多处理的事件数，避免突发流量阻塞 UI
pub const MAX_EVENTS_PER_PUMP: usize = 256;
const MAX_PENDING_PINGS: usize = 32;
const MIN_INTERVAL_MS: u64 = 100;
const MIN_EVENT_QUEUE: usize = 64;

pub const ENABLE_INSPECTION: &str = "enable_inspection";
pub const DISABLE_INSPECTION: &str = "disable_inspection";

#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Connected,
    Disconnected { reason: String },
    Pong { latency_ms: f64 },
    /// 对本端请求的应答（带 `id`）
    Reply(Value),
    /// 服务器主动推送的消息
    Message(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SocketCommand {
    Call { method: String },
}

#[derive(Debug, PartialEq)]
enum Frame {
    Pong { id: u64 },
    Reply(Value),
    Push(Value),
}

fn classify_frame(text: &str) -> Option<Frame> {
    let value: Value = serde_json::from_str(text).ok()?;
    let id = value.get("id").and_then(Value::as_u64);
    let response = value.get("response");

    let frame = match (id, response) {
        (Some(id), Some(r)) if r.as_str() == Some("pong") => Frame::Pong { id },
        (Some(_), Some(_)) => Frame::Reply(value),
        (Some(_), None) if value.get("result").is_some() => Frame::Reply(value),
        _ => Frame::Push(value),
    };
    Some(frame)
}

fn call_frame(id: u64, method: &str) -> Message {
    Message::Text(json!({ "id": id, "method": method }).to_string().into())
}

fn take_id(next_id: &mut u64) -> u64 {
    let id = *next_id;
    *next_id += 1;
    id
}

/// 后台任务向 UI 线程投递事件的出口
///
/// 连接状态和 pong 走无界通道，频率受重连间隔与 ping 间隔限制；
/// 推送消息和应答走有界队列，UI 跟不上时直接丢弃并计数。
struct EventSink {
    control: mpsc::UnboundedSender<SocketEvent>,
    messages: mpsc::Sender<SocketEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSink {
    /// 返回 false 表示 UI 端已经关闭
    fn send(&self, event: SocketEvent) -> bool {
        match event {
            SocketEvent::Reply(_) | SocketEvent::Message(_) => match self.messages.try_send(event) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    if dropped.is_power_of_two() {
                        log::warn!("dashboard event queue full, {} messages dropped so far", dropped);
                    }
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            },
            _ => self.control.send(event).is_ok(),
        }
    }
}

struct EventReceivers {
    control: mpsc::UnboundedReceiver<SocketEvent>,
    messages: mpsc::Receiver<SocketEvent>,
    dropped: Arc<AtomicU64>,
}

fn event_channels(capacity: usize) -> (EventSink, EventReceivers) {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (message_tx, message_rx) = mpsc::channel(capacity.max(MIN_EVENT_QUEUE));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        EventSink {
            control: control_tx,
            messages: message_tx,
            dropped: Arc::clone(&dropped),
        },
        EventReceivers {
            control: control_rx,
            messages: message_rx,
            dropped,
        },
    )
}

struct SocketOptions {
    url: String,
    ping_interval: Duration,
    reconnect_delay: Duration,
}

/// 后台连接句柄，drop 时取消后台任务
pub struct DashboardSocket {
    url: String,
    commands: mpsc::UnboundedSender<SocketCommand>,
    events: EventReceivers,
    cancel: CancellationToken,
}

impl DashboardSocket {
    pub fn spawn(handle: &Handle, settings: &ServerSettings) -> Self {
        let url = settings.websocket_url();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (sink, receivers) = event_channels(settings.event_queue_capacity);
        let cancel = CancellationToken::new();

        let options = SocketOptions {
            url: url.clone(),
            ping_interval: Duration::from_millis(settings.ping_interval_ms.max(MIN_INTERVAL_MS)),
            reconnect_delay: Duration::from_millis(settings.reconnect_delay_ms.max(MIN_INTERVAL_MS)),
        };
        handle.spawn(run_socket(options, command_rx, sink, cancel.clone()));
        crate::app_log!(info, "Socket", "dashboard socket started for {}", url);

        Self {
            url,
            commands: command_tx,
            events: receivers,
            cancel,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 排队一个 `{"id", "method"}` 请求，后台任务已退出时返回 false
    pub fn call(&self, method: &str) -> bool {
        self.commands
            .send(SocketCommand::Call {
                method: method.to_string(),
            })
            .is_ok()
    }

    /// 连接状态事件优先于排队中的推送消息
    pub fn try_next_event(&mut self) -> Option<SocketEvent> {
        self.events
            .control
            .try_recv()
            .ok()
            .or_else(|| self.events.messages.try_recv().ok())
    }

    /// 队列满时被丢弃的推送消息总数
    pub fn dropped_messages(&self) -> u64 {
        self.events.dropped.load(Ordering::Relaxed)
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    #[cfg(test)]
    fn detached(capacity: usize) -> (Self, mpsc::UnboundedReceiver<SocketCommand>, EventSink) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (sink, receivers) = event_channels(capacity);
        let socket = Self {
            url: "ws://detached".to_string(),
            commands: command_tx,
            events: receivers,
            cancel: CancellationToken::new(),
        };
        (socket, command_rx, sink)
    }
}

impl Drop for DashboardSocket {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_socket(
    options: SocketOptions,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
    events: EventSink,
    cancel: CancellationToken,
) {
    let mut next_id: u64 = 1;

    loop {
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(options.url.as_str()) => result,
        };

        match connected {
            Ok((ws_stream, _)) => {
                // 断线期间排队的命令作废，UI 收到 Connected 后会重新发送
                while commands.try_recv().is_ok() {}
                if !events.send(SocketEvent::Connected) {
                    break;
                }

                let reason = run_session(
                    ws_stream,
                    &options,
                    &mut commands,
                    &events,
                    &cancel,
                    &mut next_id,
                )
                .await;
                if cancel.is_cancelled() {
                    break;
                }
                log::debug!("dashboard socket session ended: {}", reason);
                if !events.send(SocketEvent::Disconnected { reason }) {
                    break;
                }
            }
            Err(e) => {
                if !events.send(SocketEvent::Disconnected {
                    reason: e.to_string(),
                }) {
                    break;
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(options.reconnect_delay) => {}
        }
    }

    log::debug!("dashboard socket task for {} stopped", options.url);
}

async fn run_session(
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    options: &SocketOptions,
    commands: &mut mpsc::UnboundedReceiver<SocketCommand>,
    events: &EventSink,
    cancel: &CancellationToken,
    next_id: &mut u64,
) -> String {
    let (mut write, mut read) = ws_stream.split();
    let mut ticker = tokio::time::interval(options.ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending_pings: HashMap<u64, Instant> = HashMap::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return "cancelled".to_string();
            }
            _ = ticker.tick() => {
                let id = take_id(next_id);
                if pending_pings.len() >= MAX_PENDING_PINGS {
                    pending_pings.clear();
                }
                pending_pings.insert(id, Instant::now());
                if let Err(e) = write.send(call_frame(id, "ping")).await {
                    return format!("ping failed: {}", e);
                }
            }
            command = commands.recv() => match command {
                Some(SocketCommand::Call { method }) => {
                    let id = take_id(next_id);
                    if let Err(e) = write.send(call_frame(id, &method)).await {
                        return format!("{} failed: {}", method, e);
                    }
                }
                None => return "dashboard closed".to_string(),
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => match classify_frame(text.as_str()) {
                    Some(Frame::Pong { id }) => {
                        if let Some(sent_at) = pending_pings.remove(&id) {
                            let latency_ms = sent_at.elapsed().as_secs_f64() * 1000.0;
                            events.send(SocketEvent::Pong { latency_ms });
                        }
                    }
                    Some(Frame::Reply(value)) => {
                        if !events.send(SocketEvent::Reply(value)) {
                            return "dashboard closed".to_string();
                        }
                    }
                    Some(Frame::Push(value)) => {
                        if !events.send(SocketEvent::Message(value)) {
                            return "dashboard closed".to_string();
                        }
                    }
                    None => log::warn!("dropping non-JSON dashboard frame: {}", text.as_str()),
                },
                Some(Ok(Message::Close(frame))) => {
                    return frame
                        .map(|f| f.reason.as_str().to_string())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return e.to_string(),
                None => return "connection closed".to_string(),
            },
        }
    }
}

/// 基于 dashboard socket 的 [`EventStream`] 实现
///
/// handler 调用期间会从槽位中取出，因此 handler 内部可以安全地
/// `disable()` 或重新 `enable()` 同一个 stream。
pub struct WebsocketEventStream {
    socket: RefCell<DashboardSocket>,
    handler: RefCell<Option<MessageHandler>>,
    enabled: Cell<bool>,
    // 每次 enable/disable 递增，用来判断 handler 调用期间订阅是否变化
    generation: Cell<u64>,
    status: SharedStatus,
    connected: Cell<Option<bool>>,
    reported_drops: Cell<u64>,
}

impl WebsocketEventStream {
    pub fn new(socket: DashboardSocket, status: SharedStatus) -> Self {
        Self {
            socket: RefCell::new(socket),
            handler: RefCell::new(None),
            enabled: Cell::new(false),
            generation: Cell::new(0),
            status,
            connected: Cell::new(None),
            reported_drops: Cell::new(0),
        }
    }

    /// 处理后台任务送来的事件，返回本次处理的数量
    pub fn pump(&self) -> usize {
        let mut handled = 0;
        while handled < MAX_EVENTS_PER_PUMP {
            let Some(event) = self.socket.borrow_mut().try_next_event() else {
                break;
            };
            handled += 1;
            self.dispatch(event);
        }

        let dropped = self.socket.borrow().dropped_messages();
        let reported = self.reported_drops.replace(dropped);
        if dropped > reported {
            crate::app_log!(warn, "Socket", "event queue full, dropped {} messages", dropped - reported);
        }
        handled
    }

    /// 服务器地址变更后重建连接，已启用的订阅在新连接建立后恢复
    pub fn reconnect(&self, handle: &Handle, settings: &ServerSettings) {
        let socket = DashboardSocket::spawn(handle, settings);
        let previous = self.socket.replace(socket);
        crate::app_log!(
            info,
            "Socket",
            "reconnecting: {} -> {}",
            previous.url(),
            settings.websocket_url()
        );
        drop(previous);
        self.connected.set(None);
        self.reported_drops.set(0);
    }

    fn dispatch(&self, event: SocketEvent) {
        match event {
            SocketEvent::Connected => {
                if self.connected.replace(Some(true)) != Some(true) {
                    crate::app_log!(info, "Socket", "connected to {}", self.socket.borrow().url());
                }
                self.status.borrow_mut().set_server_status_success("connected");
                if self.is_enabled() {
                    self.socket.borrow().call(ENABLE_INSPECTION);
                }
            }
            SocketEvent::Disconnected { reason } => {
                if self.connected.replace(Some(false)) != Some(false) {
                    crate::app_log!(warn, "Socket", "disconnected: {}", reason);
                }
                self.status.borrow_mut().set_server_status_danger();
            }
            SocketEvent::Pong { latency_ms } => {
                let mut status = self.status.borrow_mut();
                status.record_latency(latency_ms);
                status.set_server_status_success(&format!("{:.0} ms", latency_ms));
            }
            SocketEvent::Reply(value) => {
                log::debug!("dashboard reply: {}", value);
            }
            SocketEvent::Message(value) => self.deliver(value),
        }
    }

    fn deliver(&self, value: Value) {
        if !self.enabled.get() {
            return;
        }
        let Some(mut handler) = self.handler.borrow_mut().take() else {
            return;
        };
        let generation = self.generation.get();
        handler(value);
        // handler 内部取消或替换了订阅时，旧 handler 直接丢弃
        if self.generation.get() == generation {
            *self.handler.borrow_mut() = Some(handler);
        }
    }
}

impl EventStream for WebsocketEventStream {
    fn enable(&self, on_message: MessageHandler) {
        if self.is_enabled() {
            self.disable();
        }
        *self.handler.borrow_mut() = Some(on_message);
        self.enabled.set(true);
        self.generation.set(self.generation.get() + 1);
        if !self.socket.borrow().call(ENABLE_INSPECTION) {
            crate::app_log!(warn, "Socket", "socket task is gone, inspection stays idle");
        }
    }

    fn disable(&self) {
        if !self.enabled.replace(false) {
            return;
        }
        self.generation.set(self.generation.get() + 1);
        *self.handler.borrow_mut() = None;
        self.socket.borrow().call(DISABLE_INSPECTION);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{ServerStatus, StatusIndicator};
    use std::rc::Rc;
    use tokio::net::TcpListener;

    fn drain(commands: &mut mpsc::UnboundedReceiver<SocketCommand>) -> Vec<String> {
        let mut methods = Vec::new();
        while let Ok(SocketCommand::Call { method }) = commands.try_recv() {
            methods.push(method);
        }
        methods
    }

    fn detached_stream() -> (
        WebsocketEventStream,
        mpsc::UnboundedReceiver<SocketCommand>,
        EventSink,
        SharedStatus,
    ) {
        let (socket, commands, events) = DashboardSocket::detached(1024);
        let status = StatusIndicator::shared();
        let stream = WebsocketEventStream::new(socket, Rc::clone(&status));
        (stream, commands, events, status)
    }

    fn collecting_handler(sink: &Rc<RefCell<Vec<Value>>>) -> MessageHandler {
        let sink = Rc::clone(sink);
        Box::new(move |value| sink.borrow_mut().push(value))
    }

    #[test]
    fn classifies_pong_reply_and_push_frames() {
        assert_eq!(
            classify_frame(r#"{"id": 7, "response": "pong"}"#),
            Some(Frame::Pong { id: 7 })
        );
        assert!(matches!(
            classify_frame(r#"{"id": 8, "response": "not_implemented"}"#),
            Some(Frame::Reply(_))
        ));
        assert!(matches!(
            classify_frame(r#"{"id": 9, "result": {}}"#),
            Some(Frame::Reply(_))
        ));
        assert!(matches!(
            classify_frame(r#"{"event_name": 1, "request_id": "abc"}"#),
            Some(Frame::Push(_))
        ));
        assert_eq!(classify_frame("not json"), None);
    }

    #[test]
    fn messages_reach_handler_only_while_enabled() {
        let (stream, mut commands, events, _status) = detached_stream();
        let received = Rc::new(RefCell::new(Vec::new()));

        assert!(events.send(SocketEvent::Message(json!({"n": 0}))));
        stream.pump();
        assert!(received.borrow().is_empty());

        stream.enable(collecting_handler(&received));
        assert_eq!(drain(&mut commands), vec![ENABLE_INSPECTION]);

        assert!(events.send(SocketEvent::Message(json!({"n": 1}))));
        stream.pump();
        assert_eq!(*received.borrow(), vec![json!({"n": 1})]);

        assert!(events.send(SocketEvent::Message(json!({"n": 2}))));
        stream.disable();
        assert_eq!(drain(&mut commands), vec![DISABLE_INSPECTION]);
        stream.pump();
        assert_eq!(received.borrow().len(), 1);
    }

    #[test]
    fn enable_while_enabled_replaces_subscription() {
        let (stream, mut commands, events, _status) = detached_stream();
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));

        stream.enable(collecting_handler(&first));
        stream.enable(collecting_handler(&second));
        assert_eq!(
            drain(&mut commands),
            vec![ENABLE_INSPECTION, DISABLE_INSPECTION, ENABLE_INSPECTION]
        );

        assert!(events.send(SocketEvent::Message(json!("x"))));
        stream.pump();
        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 1);
    }

    #[test]
    fn disable_without_enable_sends_nothing() {
        let (stream, mut commands, _events, _status) = detached_stream();
        stream.disable();
        assert!(drain(&mut commands).is_empty());
        assert!(!stream.is_enabled());
    }

    #[test]
    fn reconnect_event_restores_enabled_subscription() {
        let (stream, mut commands, events, status) = detached_stream();
        stream.enable(Box::new(|_| {}));
        drain(&mut commands);

        assert!(events.send(SocketEvent::Disconnected { reason: "reset".to_string() }));
        assert!(events.send(SocketEvent::Connected));
        stream.pump();

        assert_eq!(drain(&mut commands), vec![ENABLE_INSPECTION]);
        assert_eq!(
            status.borrow().server(),
            &ServerStatus::Success { summary: "connected".to_string() }
        );
    }

    #[test]
    fn pong_and_disconnect_drive_server_status() {
        let (stream, _commands, events, status) = detached_stream();

        assert!(events.send(SocketEvent::Pong { latency_ms: 12.4 }));
        stream.pump();
        assert_eq!(status.borrow().summary_text(), "(12 ms)");
        assert_eq!(status.borrow().latency_history().len(), 1);

        assert!(events.send(SocketEvent::Disconnected { reason: "refused".to_string() }));
        stream.pump();
        assert_eq!(status.borrow().server(), &ServerStatus::Danger);
    }

    #[test]
    fn pump_is_bounded_per_call() {
        let (stream, _commands, events, _status) = detached_stream();
        let received = Rc::new(RefCell::new(Vec::new()));
        stream.enable(collecting_handler(&received));

        for i in 0..(MAX_EVENTS_PER_PUMP + 10) {
            assert!(events.send(SocketEvent::Message(json!(i))));
        }
        assert_eq!(stream.pump(), MAX_EVENTS_PER_PUMP);
        assert_eq!(stream.pump(), 10);
        assert_eq!(received.borrow().len(), MAX_EVENTS_PER_PUMP + 10);
    }

    #[test]
    fn full_queue_drops_messages_but_keeps_connection_events() {
        let (mut socket, _commands, events) = DashboardSocket::detached(MIN_EVENT_QUEUE);

        for i in 0..(MIN_EVENT_QUEUE + 36) {
            assert!(events.send(SocketEvent::Message(json!(i))));
        }
        assert!(events.send(SocketEvent::Connected));
        assert!(events.send(SocketEvent::Pong { latency_ms: 3.0 }));
        assert_eq!(socket.dropped_messages(), 36);

        let mut received = Vec::new();
        while let Some(event) = socket.try_next_event() {
            received.push(event);
        }
        assert_eq!(received.len(), MIN_EVENT_QUEUE + 2);
        assert_eq!(received[0], SocketEvent::Connected);
        assert_eq!(received[1], SocketEvent::Pong { latency_ms: 3.0 });
        assert_eq!(received[2], SocketEvent::Message(json!(0)));
        assert_eq!(
            received.last(),
            Some(&SocketEvent::Message(json!(MIN_EVENT_QUEUE - 1)))
        );

        assert!(events.send(SocketEvent::Message(json!("after drain"))));
        assert_eq!(socket.try_next_event(), Some(SocketEvent::Message(json!("after drain"))));
    }

    #[test]
    fn queue_capacity_has_a_floor() {
        let (socket, _commands, events) = DashboardSocket::detached(0);
        for i in 0..MIN_EVENT_QUEUE {
            assert!(events.send(SocketEvent::Message(json!(i))));
        }
        assert_eq!(socket.dropped_messages(), 0);
    }

    #[test]
    fn handler_may_disable_its_own_stream() {
        let (stream, mut commands, events, _status) = detached_stream();
        let stream = Rc::new(stream);
        let received = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&stream);
        let sink = Rc::clone(&received);
        stream.enable(Box::new(move |value| {
            sink.borrow_mut().push(value);
            if let Some(stream) = weak.upgrade() {
                assert!(stream.is_enabled());
                stream.disable();
            }
        }));

        assert!(events.send(SocketEvent::Message(json!(1))));
        assert!(events.send(SocketEvent::Message(json!(2))));
        assert_eq!(stream.pump(), 2);

        assert_eq!(*received.borrow(), vec![json!(1)]);
        assert!(!stream.is_enabled());
        assert_eq!(drain(&mut commands), vec![ENABLE_INSPECTION, DISABLE_INSPECTION]);
    }

    #[test]
    fn handler_may_replace_its_own_subscription() {
        let (stream, mut commands, events, _status) = detached_stream();
        let stream = Rc::new(stream);
        let replacement = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&stream);
        let next = Rc::clone(&replacement);
        stream.enable(Box::new(move |_| {
            if let Some(stream) = weak.upgrade() {
                stream.enable(collecting_handler(&next));
            }
        }));

        assert!(events.send(SocketEvent::Message(json!("first"))));
        assert!(events.send(SocketEvent::Message(json!("second"))));
        stream.pump();

        assert_eq!(*replacement.borrow(), vec![json!("second")]);
        assert!(stream.is_enabled());
        assert_eq!(
            drain(&mut commands),
            vec![ENABLE_INSPECTION, DISABLE_INSPECTION, ENABLE_INSPECTION]
        );
    }

    async fn wait_for(
        socket: &mut DashboardSocket,
        mut matches: impl FnMut(&SocketEvent) -> bool,
    ) -> Option<SocketEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            while let Some(event) = socket.try_next_event() {
                if matches(&event) {
                    return Some(event);
                }
            }
            sleep(Duration::from_millis(10)).await;
        }
        None
    }

    #[tokio::test]
    async fn talks_to_a_dashboard_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(message)) = ws.next().await {
                let Message::Text(text) = message else { continue };
                let request: Value = serde_json::from_str(text.as_str()).unwrap();
                let reply = if request["method"] == "ping" {
                    json!({"id": request["id"], "response": "pong"})
                } else if request["method"] == ENABLE_INSPECTION {
                    json!({"event_name": "request_complete", "request_id": "r-1"})
                } else {
                    json!({"id": request["id"], "response": "not_implemented"})
                };
                if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                    break;
                }
            }
        });

        let settings = ServerSettings {
            port,
            ping_interval_ms: 200,
            reconnect_delay_ms: 200,
            ..Default::default()
        };
        let mut socket = DashboardSocket::spawn(&Handle::current(), &settings);

        assert!(wait_for(&mut socket, |e| *e == SocketEvent::Connected).await.is_some());
        assert!(
            wait_for(&mut socket, |e| matches!(e, SocketEvent::Pong { .. }))
                .await
                .is_some()
        );

        assert!(socket.call(ENABLE_INSPECTION));
        let pushed = wait_for(&mut socket, |e| matches!(e, SocketEvent::Message(_))).await;
        assert_eq!(
            pushed,
            Some(SocketEvent::Message(
                json!({"event_name": "request_complete", "request_id": "r-1"})
            ))
        );

        socket.shutdown();
    }
}
