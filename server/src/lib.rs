//! # BOXMAN Server Library
//!
//! This library provides the authoritative server for the BOXMAN game. It
//! owns the canonical position and heading of every avatar, applies the
//! movement intent clients send, and broadcasts a full snapshot to every
//! connected client once per tick.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Each connected client controls exactly one avatar. The server integrates
//! thrust and torque from the client's last reported intent; clients never
//! send positions, they only render what the server tells them.
//!
//! ### Session Management
//! Handles the lifecycle of a client:
//! - `Hello` registers the peer, allocates an avatar id and announces the
//!   new avatar to everybody already connected (and vice versa)
//! - `Client` replaces the peer's movement intent
//! - `Quit` frees the id, tells the remaining peers to destroy the avatar and
//!   acknowledges the leaver with its own `Quit`
//!
//! A server at capacity answers `Hello` with `Quit` and registers nothing.
//!
//! ### State Broadcasting
//! After every simulation step the server sends one `Update` datagram holding
//! every avatar's state to every client. No update is sent while nobody is
//! connected.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Tick Loop
//! Receiving, simulating and sending all happen on one thread, in that order,
//! once per tick. The socket is non-blocking and polled, so no state is ever
//! shared across tasks and handlers run to completion without locking.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Registry of connected peers, their avatars and the id pool.
//!
//! ### Config Module (`config`)
//! Bind address, tick rate and player capacity.
//!
//! ### Game Module (`game`)
//! The avatar type and its force/torque movement model.
//!
//! ### Session Module (`session`)
//! Command dispatch for the server role and the per-tick simulation step.
//!
//! ### Network Module (`network`)
//! Drives the session from a UDP endpoint at a fixed tick rate.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Listen on 0.0.0.0:11235 at 20Hz with room for 256 players
//!     let mut server = Server::bind(ServerConfig::default())?;
//!
//!     // Tick until Ctrl+C, then send Quit to every client
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
pub mod session;
