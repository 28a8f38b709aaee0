//! # BOXMAN Client Library
//!
//! This library provides the protocol side of the BOXMAN client: the local
//! copy of every avatar the server announced, the movement intent the player
//! is holding, and the client's half of the command dispatch.
//!
//! ## Architecture Overview
//!
//! The client is not authoritative. It sends `Hello` once, then only reports
//! intent changes; positions always come from server snapshots. Between
//! snapshots each avatar is moved along a velocity estimated from the last
//! two snapshots so motion looks smooth at frame rate.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Client-side entity registry:
//! - Spawn and destroy as announced by the server
//! - Snapshot application that skips unknown ids
//! - Local interpolation with wraparound handling
//!
//! ### Input Module (`input`)
//! Intent flags with change detection, so a `Client` command is only sent
//! when a key actually went up or down.
//!
//! ### Network Module (`network`)
//! Client dispatch tree (`ClientSession`) and the frame driver (`Client`)
//! that receives, steps local state and flushes once per frame.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use shared::IntentFlags;
//!
//! fn main() -> std::io::Result<()> {
//!     let mut client = Client::connect("127.0.0.1:11235")?;
//!     client.send_hello();
//!
//!     client.start_move(IntentFlags::FORWARD);
//!     while !client.should_exit() {
//!         client.update(1.0 / 60.0)?;
//!         for boxman in client.game_state().entities() {
//!             println!("{} at {:?}", boxman.id, boxman.position());
//!         }
//!         # break;
//!     }
//!
//!     client.send_quit();
//!     client.flush()?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
