//! # Boxman Shared Library
//!
//! Protocol pieces used by both the authoritative server and the client:
//!
//! - [`ident`]: fixed-size entity id pool
//! - [`protocol`]: `BOXMAN` packet framing and command codec
//! - [`transport`]: non-blocking UDP endpoint, write queue and the
//!   [`Dispatch`] seam each role implements
//! - [`physics`]: 2D vectors and the rigid body used for avatar movement
//!
//! Everything here is single-threaded and poll-driven. Nothing spawns threads
//! or blocks; the owning run loop decides when to poll.

pub mod ident;
pub mod physics;
pub mod protocol;
pub mod transport;

pub use ident::{IdentAlloc, IdentityExhausted, MAX_IDENTS};
pub use physics::{Body, Vector2};
pub use protocol::{
    decode, encode, Color, Command, CommandCode, EntityKind, EntityState, IntentFlags,
    ProtocolError,
};
pub use transport::{Datagram, Dispatch, Transport, WriteQueue};

pub const DEFAULT_PORT: u16 = 11235;
pub const WORLD_WIDTH: f32 = 640.0;
pub const WORLD_HEIGHT: f32 = 480.0;
