//! WebSocket sessions against a real server on an ephemeral port

use std::net::SocketAddr;
use std::time::Duration;

use arena_server::app::AppState;
use arena_server::config::{Config, GameConfig};
use arena_server::http::build_router;
use arena_server::ws::protocol::{ClientMsg, ServerEvent};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let config = Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        client_origin: None,
        outbound_buffer: 1024,
        game: GameConfig {
            barrier_count: 3,
            barrier_seed: Some(7),
            ..GameConfig::default()
        },
    };

    let (state, runner) = AppState::new(config);
    tokio::spawn(runner.run());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

async fn next_event(ws: &mut Client) -> ServerEvent {
    loop {
        let frame = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = frame {
            if let Some(event) = ServerEvent::decode(&text).unwrap() {
                return event;
            }
        }
    }
}

/// Read events until `pick` returns something
async fn wait_for<T>(ws: &mut Client, mut pick: impl FnMut(&ServerEvent) -> Option<T>) -> T {
    for _ in 0..2000 {
        let event = next_event(ws).await;
        if let Some(found) = pick(&event) {
            return found;
        }
    }
    panic!("expected event never arrived");
}

async fn send(ws: &mut Client, msg: ClientMsg) {
    ws.send(Message::Text(msg.encode().unwrap())).await.unwrap();
}

/// Handshake: returns the id the server assigned
async fn handshake(ws: &mut Client) -> Uuid {
    let announced = match next_event(ws).await {
        ServerEvent::PlayerConnect(p) => p.id,
        other => panic!("expected player_connect, got {:?}", other),
    };
    wait_for(ws, |e| match e {
        ServerEvent::Configure(c) => {
            assert_eq!(c.id, announced);
            assert_eq!(c.barriers.len(), 3);
            Some(c.id)
        }
        ServerEvent::PlayerConnect(_) => None,
        other => panic!("unexpected event before configure: {:?}", other),
    })
    .await
}

#[tokio::test]
async fn connect_receives_own_player_and_configure() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let id = handshake(&mut ws).await;

    let posn = wait_for(&mut ws, |e| match e {
        ServerEvent::PlayerPosn(p) if p.id == id => Some(p.posn),
        _ => None,
    })
    .await;
    assert_eq!((posn.x, posn.y), (0.0, 0.0));
}

#[tokio::test]
async fn held_key_moves_the_player() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    let id = handshake(&mut ws).await;

    send(&mut ws, ClientMsg::KeyPressed { key: 68 }).await;

    let x = wait_for(&mut ws, |e| match e {
        ServerEvent::PlayerPosn(p) if p.id == id && p.posn.x > 0.0 => Some(p.posn.x),
        _ => None,
    })
    .await;
    assert_eq!(x % 5.0, 0.0);
}

#[tokio::test]
async fn malformed_frames_are_ignored_and_ping_is_answered() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    handshake(&mut ws).await;

    ws.send(Message::Text("not json".to_string())).await.unwrap();
    ws.send(Message::Text(r#"{"event":"keyPressed"}"#.to_string()))
        .await
        .unwrap();
    send(
        &mut ws,
        ClientMsg::Trigger {
            trigger: "ping".to_string(),
            data: json!({"t": 77}),
        },
    )
    .await;

    let t = wait_for(&mut ws, |e| match e {
        ServerEvent::Pong(p) => Some(p.t),
        _ => None,
    })
    .await;
    assert_eq!(t, 77);
}

#[tokio::test]
async fn peers_see_connects_and_disconnects() {
    let addr = spawn_server().await;
    let mut first = connect(addr).await;
    let first_id = handshake(&mut first).await;

    let mut second = connect(addr).await;
    let announced = match next_event(&mut second).await {
        ServerEvent::PlayerConnect(p) => p.id,
        other => panic!("expected player_connect, got {:?}", other),
    };

    // The newcomer learns about the existing player before its configure
    let seen_first = wait_for(&mut second, |e| match e {
        ServerEvent::PlayerConnect(p) if p.id == first_id => Some(true),
        ServerEvent::Configure(_) => Some(false),
        _ => None,
    })
    .await;
    assert!(seen_first);

    wait_for(&mut first, |e| match e {
        ServerEvent::PlayerConnect(p) if p.id == announced => Some(()),
        _ => None,
    })
    .await;

    second.close(None).await.unwrap();

    wait_for(&mut first, |e| match e {
        ServerEvent::PlayerDisconnect(r) if r.id == announced => Some(()),
        _ => None,
    })
    .await;
}

#[tokio::test]
async fn health_reports_world_stats() {
    let addr = spawn_server().await;
    let mut ws = connect(addr).await;
    handshake(&mut ws).await;
    // Let at least one tick publish after the connect
    wait_for(&mut ws, |e| match e {
        ServerEvent::PlayerPosn(_) => Some(()),
        _ => None,
    })
    .await;
    wait_for(&mut ws, |e| match e {
        ServerEvent::PlayerPosn(_) => Some(()),
        _ => None,
    })
    .await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    timeout(Duration::from_secs(5), stream.read_to_string(&mut response))
        .await
        .unwrap()
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let health: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["players"], 1);
    assert_eq!(health["barriers"], 3);
    assert!(health["tick"].as_u64().unwrap() > 0);
}
