//! Headless client: connects to an arena server, holds a fixed input plan and
//! logs what its world mirror sees

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_server::client::{self, ClientOptions, InputPlan};
use arena_server::game::input::keys;
use arena_server::game::Vec2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the server
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:5500/ws")]
    url: String,

    /// Keys to hold for the whole session (comma-separated: w,a,s,d,space)
    #[arg(short = 'k', long, value_delimiter = ',', value_parser = parse_key)]
    hold: Vec<u32>,

    /// Cursor position as x,y
    #[arg(short = 'a', long, value_parser = parse_point)]
    aim: Option<Vec2>,

    /// Hold the primary mouse button
    #[arg(short = 'f', long)]
    fire: bool,

    /// Disconnect after this many seconds
    #[arg(short = 'd', long)]
    duration: Option<f64>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_key(raw: &str) -> Result<u32, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "w" => Ok(keys::W),
        "a" => Ok(keys::A),
        "s" => Ok(keys::S),
        "d" => Ok(keys::D),
        "space" => Ok(keys::SPACE),
        other => other.parse().map_err(|_| format!("unknown key: {}", other)),
    }
}

fn parse_point(raw: &str) -> Result<Vec2, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {}", raw))?;
    let x = x.trim().parse().map_err(|_| format!("bad x: {}", x))?;
    let y = y.trim().parse().map_err(|_| format!("bad y: {}", y))?;
    Ok(Vec2::new(x, y))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let mut options = ClientOptions::new(args.url);
    options.plan = InputPlan {
        hold_keys: args.hold,
        aim: args.aim,
        fire: args.fire,
    };
    options.run_for = args
        .duration
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64);

    let mirror = client::run(options).await?;

    match mirror.own_player() {
        Some(player) => info!(
            x = player.position.x,
            y = player.position.y,
            health = player.health,
            dead = mirror.is_dead(),
            "Final own player state"
        ),
        None => info!(dead = mirror.is_dead(), "Session ended without an own player"),
    }

    Ok(())
}
