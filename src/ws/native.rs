//! Native WebSocket client — `tokio-tungstenite`.
//!
//! - Background tokio task owns the connection
//! - WS-level ping with pong deadline
//! - Exponential backoff reconnection with jitter
//! - [`StreamHandler`] callbacks driven serially from the task
//!
//! The client keeps no subscription state. Handlers re-issue whatever they
//! need from `on_connect`, which runs on every (re)connection. Messages sent
//! while no connection is open are dropped.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::ws::{MessageOut, MessageSink, ReadyState, StreamHandler, WsConfig};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Send(MessageOut),
    Disconnect,
}

// ─── Disconnect reasons for reconnection decision ────────────────────────────

#[derive(Debug, PartialEq)]
enum DisconnectReason {
    UserRequested,
    NormalClose,
    PongTimeout,
    RateLimited,
    Error(String),
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    handler: Arc<dyn StreamHandler>,
    cmd_rx: mpsc::Receiver<Command>,
    reconnect_attempts: u32,
    ready_state: Arc<AtomicU16>,
}

impl TaskState {
    fn should_reconnect(&self) -> bool {
        self.config.reconnect && self.reconnect_attempts < self.config.max_reconnect_attempts
    }

    fn set_state(&self, state: ReadyState) {
        self.ready_state.store(state as u16, Ordering::SeqCst);
    }
}

/// Collects what a handler sends from `on_connect`; flushed right after.
#[derive(Default)]
struct ConnectSink {
    queued: Mutex<Vec<MessageOut>>,
}

impl MessageSink for ConnectSink {
    fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        self.queued.lock().push(msg);
        Ok(())
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// Native WebSocket client using `tokio-tungstenite`.
///
/// `start` spawns the background task; the public API talks to it over an
/// mpsc channel.
pub struct WsClient {
    config: WsConfig,
    cmd_tx: Option<mpsc::Sender<Command>>,
    task_handle: Option<JoinHandle<()>>,
    ready_state: Arc<AtomicU16>,
}

impl WsClient {
    /// Create a new WS client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            cmd_tx: None,
            task_handle: None,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Closed as u16)),
        }
    }

    /// Spawn the connection task. Must be called inside a tokio runtime.
    ///
    /// Connection failures are reported through logs and reconnection, not
    /// through this result.
    pub fn start(&mut self, handler: Arc<dyn StreamHandler>) -> Result<(), WsError> {
        if self.cmd_tx.is_some() {
            return Err(WsError::AlreadyStarted);
        }
        if self.config.url.is_empty() {
            return Err(WsError::ConnectionFailed("empty WebSocket URL".into()));
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        self.cmd_tx = Some(cmd_tx);
        self.ready_state
            .store(ReadyState::Connecting as u16, Ordering::SeqCst);

        let state = TaskState {
            config: self.config.clone(),
            handler,
            cmd_rx,
            reconnect_attempts: 0,
            ready_state: Arc::clone(&self.ready_state),
        };
        self.task_handle = Some(tokio::spawn(run_task(state)));
        Ok(())
    }

    /// Close the connection and wait (up to 5 s) for the task to finish.
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        if let Some(tx) = self.cmd_tx.take() {
            self.ready_state
                .store(ReadyState::Closing as u16, Ordering::SeqCst);
            let _ = tx.send(Command::Disconnect).await;
        }

        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        self.ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);
        Ok(())
    }

    /// Queue a message for the background task.
    ///
    /// Returns `WsError::NotConnected` if the client was never started.
    pub fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        match &self.cmd_tx {
            Some(tx) => tx.try_send(Command::Send(msg)).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    WsError::SendFailed("Command channel full".into())
                }
                mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
            }),
            None => Err(WsError::NotConnected),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    loop {
        // ── 1. Attempt connection ────────────────────────────────────────
        let (mut sink, stream) = match attempt_connect(&state.config.url).await {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("WebSocket connection failed: {}", e);
                if !state.should_reconnect() {
                    tracing::error!("Max reconnect attempts reached");
                    close_task(&state);
                    return;
                }
                if !retry_after_backoff(&mut state, false).await {
                    return;
                }
                continue;
            }
        };

        // ── 2. Connected ─────────────────────────────────────────────────
        state.reconnect_attempts = 0;
        state.set_state(ReadyState::Open);
        tracing::info!(url = %state.config.url, "WebSocket connected");

        // ── 3. Let the handler authenticate and subscribe ────────────────
        let connect_sink = ConnectSink::default();
        state.handler.on_connect(&connect_sink);
        let queued = std::mem::take(&mut *connect_sink.queued.lock());
        for msg in &queued {
            if let Err(e) = send_msg(&mut sink, msg).await {
                tracing::warn!("Failed to send on-connect message: {}", e);
            }
        }

        // ── 4. Inner select! loop ────────────────────────────────────────
        let reason = run_connected(&mut state, sink, stream).await;

        // ── 5. Post-disconnect decision ──────────────────────────────────
        close_task(&state);
        tracing::info!("WebSocket disconnected: {:?}", reason);

        let rate_limited = match reason {
            DisconnectReason::UserRequested | DisconnectReason::NormalClose => return,
            DisconnectReason::RateLimited => true,
            DisconnectReason::PongTimeout | DisconnectReason::Error(_) => false,
        };
        if !state.should_reconnect() {
            tracing::error!("Max reconnect attempts reached");
            return;
        }
        if !retry_after_backoff(&mut state, rate_limited).await {
            return;
        }
    }
}

/// Mark the connection closed and tell the handler.
fn close_task(state: &TaskState) {
    state.set_state(ReadyState::Closed);
    state.handler.on_disconnect();
}

/// Report the pending retry, sleep, then check whether a disconnect arrived
/// meanwhile. Returns `false` if the task should stop.
async fn retry_after_backoff(state: &mut TaskState, rate_limited: bool) -> bool {
    state.set_state(ReadyState::Connecting);
    state.handler.on_reconnecting();
    backoff_sleep(state, rate_limited).await;
    if drop_queued_commands(state) {
        close_task(state);
        return false;
    }
    true
}

/// The inner connected loop — runs until the connection breaks.
async fn run_connected(
    state: &mut TaskState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
) -> DisconnectReason {
    let ping_dur = Duration::from_millis(state.config.ping_interval_ms as u64);
    let pong_dur = Duration::from_millis(state.config.pong_timeout_ms as u64);

    let mut ping_interval = tokio::time::interval(ping_dur);
    ping_interval.reset(); // skip immediate first tick

    let mut pong_deadline: Option<tokio::time::Instant> = None;

    let far_future = tokio::time::Instant::now() + Duration::from_secs(86400);
    let pong_sleep = tokio::time::sleep_until(far_future);
    tokio::pin!(pong_sleep);

    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        state.handler.on_message(text.as_str().as_bytes());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        state.handler.on_message(&data);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        pong_deadline = None;
                        pong_sleep.as_mut().reset(far_future);
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        return reason_for_close(code, reason);
                    }
                    Some(Ok(_)) => {} // raw Frame, ignore
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("WebSocket error: {}", reason);
                        return DisconnectReason::Error(reason);
                    }
                    None => return DisconnectReason::Error("Stream ended".into()),
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Send(msg_out)) => {
                        if let Err(e) = send_msg(&mut sink, &msg_out).await {
                            tracing::warn!("Send failed: {}", e);
                        }
                    }
                    Some(Command::Disconnect) | None => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client disconnect".into(),
                        }))).await;
                        return DisconnectReason::UserRequested;
                    }
                }
            }

            // ── c) Ping interval ─────────────────────────────────────────
            _ = ping_interval.tick() => {
                if let Err(e) = sink.send(Message::Ping(Vec::new().into())).await {
                    tracing::warn!("Failed to send ping: {}", e);
                } else if pong_deadline.is_none() {
                    let deadline = tokio::time::Instant::now() + pong_dur;
                    pong_deadline = Some(deadline);
                    pong_sleep.as_mut().reset(deadline);
                }
            }

            // ── d) Pong timeout ──────────────────────────────────────────
            () = &mut pong_sleep, if pong_deadline.is_some() => {
                tracing::warn!(
                    "Pong timeout, no response within {}ms",
                    state.config.pong_timeout_ms
                );
                let _ = sink.close().await;
                return DisconnectReason::PongTimeout;
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Attempt to establish a WebSocket connection with a 30-second timeout.
async fn attempt_connect(
    url: &str,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), String> {
    let (ws_stream, _) = tokio::time::timeout(Duration::from_secs(30), connect_async(url))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

async fn send_msg(sink: &mut SplitSink<WsStream, Message>, msg: &MessageOut) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    tracing::debug!("WS send: {}", json);
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

fn reason_for_close(code: u16, reason: String) -> DisconnectReason {
    match code {
        1000 => DisconnectReason::NormalClose,
        1008 | 429 => DisconnectReason::RateLimited,
        _ => DisconnectReason::Error(reason),
    }
}

/// Discard commands that arrived while disconnected. Returns `true` if a
/// disconnect was requested meanwhile.
fn drop_queued_commands(state: &mut TaskState) -> bool {
    while let Ok(cmd) = state.cmd_rx.try_recv() {
        match cmd {
            Command::Send(msg) => {
                tracing::debug!("Dropping {:?} sent while disconnected", msg.op);
            }
            Command::Disconnect => return true,
        }
    }
    false
}

// ─── Reconnection backoff ────────────────────────────────────────────────────

fn backoff_delay_ms(base_ms: u32, attempt: u32, jitter: u32, rate_limited: bool) -> u32 {
    let exp = attempt.saturating_sub(1).min(10);
    let base = base_ms.saturating_mul(1u32 << exp);
    let cap = if rate_limited { 300_000 } else { 60_000 };
    base.saturating_add(jitter).min(cap)
}

async fn backoff_sleep(state: &mut TaskState, rate_limited: bool) {
    state.reconnect_attempts += 1;

    let jitter_max = if rate_limited { 1000u32 } else { 500u32 };
    let jitter = rand::random::<u32>() % jitter_max;
    let delay = backoff_delay_ms(
        state.config.base_reconnect_delay_ms,
        state.reconnect_attempts,
        jitter,
        rate_limited,
    );

    tracing::info!(
        "Reconnect attempt {}/{} in {}ms{}",
        state.reconnect_attempts,
        state.config.max_reconnect_attempts,
        delay,
        if rate_limited { " (rate-limited)" } else { "" }
    );

    tokio::time::sleep(Duration::from_millis(delay as u64)).await;
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::{Subscription, Topic};

    struct NoopHandler;

    impl StreamHandler for NoopHandler {
        fn on_connect(&self, _sink: &dyn MessageSink) {}
        fn on_message(&self, _raw: &[u8]) {}
    }

    fn subscribe_msg() -> MessageOut {
        MessageOut::subscribe(&[Subscription::new(Topic::Trade, None)])
    }

    #[test]
    fn test_ws_client_new() {
        let client = WsClient::new(WsConfig::default());
        assert!(client.cmd_tx.is_none());
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_send_when_not_started() {
        let client = WsClient::new(WsConfig::default());
        let result = client.send(subscribe_msg());
        assert!(matches!(result, Err(WsError::NotConnected)));
    }

    #[test]
    fn test_connect_sink_preserves_order() {
        let sink = ConnectSink::default();
        sink.send(MessageOut::auth_key("k", 1, "s")).unwrap();
        sink.send(subscribe_msg()).unwrap();
        let queued = sink.queued.lock();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].op, crate::ws::Op::AuthKey);
        assert_eq!(queued[1].op, crate::ws::Op::Subscribe);
    }

    #[test]
    fn test_extract_close_with_frame() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "goodbye".into(),
        };
        let (code, reason) = extract_close(Some(&frame));
        assert_eq!(code, 1000);
        assert_eq!(reason, "goodbye");
    }

    #[test]
    fn test_extract_close_no_frame() {
        let (code, reason) = extract_close(None);
        assert_eq!(code, 1006);
        assert_eq!(reason, "No close frame");
    }

    #[test]
    fn test_reason_for_close() {
        assert_eq!(reason_for_close(1000, String::new()), DisconnectReason::NormalClose);
        assert_eq!(reason_for_close(1008, String::new()), DisconnectReason::RateLimited);
        assert_eq!(
            reason_for_close(1011, "boom".into()),
            DisconnectReason::Error("boom".into())
        );
    }

    #[test]
    fn test_backoff_delay_grows_and_caps() {
        assert_eq!(backoff_delay_ms(1_000, 1, 0, false), 1_000);
        assert_eq!(backoff_delay_ms(1_000, 2, 0, false), 2_000);
        assert_eq!(backoff_delay_ms(1_000, 4, 250, false), 8_250);
        assert_eq!(backoff_delay_ms(1_000, 30, 0, false), 60_000);
        assert_eq!(backoff_delay_ms(1_000, 30, 0, true), 300_000);
    }

    #[derive(Default)]
    struct LifecycleHandler {
        disconnects: std::sync::atomic::AtomicU32,
        reconnects: std::sync::atomic::AtomicU32,
    }

    impl StreamHandler for LifecycleHandler {
        fn on_connect(&self, _sink: &dyn MessageSink) {}
        fn on_message(&self, _raw: &[u8]) {}
        fn on_disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
        fn on_reconnecting(&self) {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let handler = Arc::new(LifecycleHandler::default());
        let mut client = WsClient::new(WsConfig {
            url: "ws://127.0.0.1:9".into(),
            max_reconnect_attempts: 1,
            base_reconnect_delay_ms: 10,
            ..WsConfig::default()
        });
        client.start(handler.clone()).unwrap();

        let handle = client.task_handle.take().unwrap();
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(handler.reconnects.load(Ordering::SeqCst), 1);
        assert_eq!(handler.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut client = WsClient::new(WsConfig {
            url: "ws://127.0.0.1:9".into(),
            reconnect: false,
            ..WsConfig::default()
        });
        client.start(Arc::new(NoopHandler)).unwrap();
        let second = client.start(Arc::new(NoopHandler));
        assert!(matches!(second, Err(WsError::AlreadyStarted)));
        client.disconnect().await.unwrap();
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }

    #[tokio::test]
    async fn test_start_rejects_empty_url() {
        let mut client = WsClient::new(WsConfig {
            url: String::new(),
            ..WsConfig::default()
        });
        assert!(matches!(
            client.start(Arc::new(NoopHandler)),
            Err(WsError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_when_not_started() {
        let mut client = WsClient::new(WsConfig::default());
        assert!(client.disconnect().await.is_ok());
    }
}
