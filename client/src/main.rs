mod rendering;

use clap::Parser;
use client::network::Client;
use env_logger::Env;
use log::{error, info};
use macroquad::prelude::*;
use macroquad::window::Conf;
use rendering::Renderer;
use server::config::ServerConfig;
use server::network::Server;
use shared::{IntentFlags, DEFAULT_PORT, WORLD_HEIGHT, WORLD_WIDTH};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

/// Seconds to wait for the server's Quit after sending ours
const QUIT_GRACE: f64 = 1.0;

/// Longest frame fed to local interpolation
const MAX_FRAME_TIME: f32 = 0.1;

/// Seconds between unconditional intent resends, covering lost `Client` packets
const INTENT_RESEND: f64 = 1.0;

const CONTROLS: [(KeyCode, IntentFlags); 4] = [
    (KeyCode::Up, IntentFlags::FORWARD),
    (KeyCode::Down, IntentFlags::BACKWARD),
    (KeyCode::Left, IntentFlags::ROTATE_CCW),
    (KeyCode::Right, IntentFlags::ROTATE_CW),
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Also run a server in this process, listening on all interfaces at the
    /// port of --server
    #[arg(short = 'l', long)]
    host_local: bool,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "BOXMAN".to_owned(),
        window_width: WORLD_WIDTH as i32,
        window_height: WORLD_HEIGHT as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = run(&args).await {
        error!("Client failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = resolve(&args.server)?;

    let mut host = if args.host_local {
        let config = ServerConfig {
            bind: SocketAddr::from(([0, 0, 0, 0], server_addr.port())),
            ..ServerConfig::default()
        };
        info!("Hosting local server on {}", config.bind);
        Some(Server::bind(config)?)
    } else {
        None
    };

    info!("Connecting to: {}", server_addr);
    info!("Controls: arrow keys to move, Esc to quit");

    let mut client = Client::connect(server_addr)?;
    let renderer = Renderer::new();

    prevent_quit();
    client.send_hello();

    let mut quit_sent_at: Option<f64> = None;
    let mut last_intent_sent = get_time();

    loop {
        if quit_sent_at.is_none() {
            if is_key_pressed(KeyCode::Escape) || is_quit_requested() {
                info!("Leaving server");
                client.send_quit();
                quit_sent_at = Some(get_time());
            } else {
                poll_controls(&mut client);
            }
        }

        if quit_sent_at.is_none()
            && client.game_state().own_id().is_some()
            && get_time() - last_intent_sent > INTENT_RESEND
        {
            client.send_client();
            last_intent_sent = get_time();
        }

        let frame_time = get_frame_time();
        client.update(frame_time.min(MAX_FRAME_TIME))?;
        if let Some(server) = host.as_mut() {
            server.advance(frame_time)?;
        }

        if client.should_exit() {
            break;
        }
        if let Some(sent_at) = quit_sent_at {
            if get_time() - sent_at > QUIT_GRACE {
                info!("No reply to Quit, closing anyway");
                break;
            }
        }

        renderer.render(client.game_state(), &args.server);
        next_frame().await;
    }

    if let Some(server) = host.as_mut() {
        info!("Stopping local server");
        server.shutdown()?;
    }

    Ok(())
}

fn resolve(address: &str) -> io::Result<SocketAddr> {
    address.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("Could not resolve {}", address),
        )
    })
}

/// Maps arrow key presses and releases onto the intent state
fn poll_controls(client: &mut Client) {
    for (key, flags) in CONTROLS {
        if is_key_pressed(key) {
            client.start_move(flags);
        }
        if is_key_released(key) {
            client.stop_move(flags);
        }
    }
}
