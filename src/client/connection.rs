//! WebSocket transport for the headless client: applies server events to the
//! mirror and drives the frame loop

use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::game::geometry::Vec2;
use crate::game::input::buttons;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ProtocolError, ServerEvent};

use super::frame_clock::FrameClock;
use super::input::LocalInput;
use super::mirror::ClientMirror;

/// Input the headless client holds for the whole session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputPlan {
    /// Key codes pressed at start and never released
    pub hold_keys: Vec<u32>,
    /// Cursor position reported at start
    pub aim: Option<Vec2>,
    /// Hold the primary mouse button
    pub fire: bool,
}

impl InputPlan {
    /// Raw edges that put `input` into the planned state
    pub fn start(&self, input: &mut LocalInput) -> Vec<ClientMsg> {
        let mut messages = Vec::new();
        if let Some(aim) = self.aim {
            messages.push(input.move_cursor(aim));
        }
        for key in &self.hold_keys {
            messages.push(input.press_key(*key));
        }
        if self.fire {
            messages.push(input.press_button(buttons::LEFT));
        }
        messages
    }
}

/// Headless client settings
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    pub frame_interval: Duration,
    pub ping_interval: Duration,
    /// Stop after this long; run until the server closes when unset
    pub run_for: Option<Duration>,
    pub plan: InputPlan,
}

impl ClientOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            frame_interval: Duration::from_millis(16),
            ping_interval: Duration::from_secs(1),
            run_for: None,
            plan: InputPlan::default(),
        }
    }
}

/// Headless client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Connect, play out the input plan and return the final mirror state
pub async fn run(options: ClientOptions) -> Result<ClientMirror, ClientError> {
    let (ws, _) = connect_async(options.url.as_str()).await?;
    info!(url = %options.url, "Connected to server");

    let (mut ws_sink, mut ws_stream) = ws.split();

    let mut mirror = ClientMirror::new();
    let mut input = LocalInput::new();
    let mut clock = FrameClock::new();
    let mut frames: u64 = 0;

    for msg in options.plan.start(&mut input) {
        ws_sink.send(Message::Text(msg.encode()?)).await?;
    }

    let mut frame_interval = interval(options.frame_interval);
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ping_interval = interval(options.ping_interval);
    ping_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let run_for = options.run_for;
    let deadline = async move {
        match run_for {
            Some(duration) => sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = frame_interval.tick() => {
                if clock.advance(Instant::now()).is_some() {
                    mirror.frame();
                    input.end_frame();
                    frames += 1;
                    if frames % 300 == 0 {
                        debug!(
                            frames,
                            players = mirror.players().count(),
                            projectiles = mirror.projectiles().count(),
                            "Mirror state"
                        );
                    }
                }
            }

            _ = ping_interval.tick() => {
                let ping = ClientMsg::Trigger {
                    trigger: "ping".to_string(),
                    data: json!({ "t": unix_millis() }),
                };
                ws_sink.send(Message::Text(ping.encode()?)).await?;
            }

            incoming = ws_stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match ServerEvent::decode(&text) {
                        Ok(Some(event)) => {
                            if let ServerEvent::Pong(pong) = &event {
                                debug!(rtt_ms = unix_millis().saturating_sub(pong.t), "Pong");
                            }
                            mirror.apply(&event);
                            if mirror.is_dead() {
                                info!("Own player died, closing connection");
                                let _ = ws_sink.close().await;
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "Failed to parse server message"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }

            _ = &mut deadline => {
                info!(frames, "Run time elapsed, disconnecting");
                let _ = ws_sink.close().await;
                break;
            }
        }
    }

    Ok(mirror)
}
