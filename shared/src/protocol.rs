//! Boxman wire protocol
//!
//! Every datagram is `"BOXMAN" || command code (u8) || payload`, with all
//! multi-byte fields in network byte order. Payloads are written with a
//! big-endian, fixed-width `bincode` configuration so the layout matches the
//! field tables below byte for byte:
//!
//! | Command | Payload |
//! |---------|---------|
//! | Hello   | empty |
//! | Quit    | empty |
//! | Spawn   | kind:u8, id:u8, r:u8, g:u8, b:u8 |
//! | Destroy | id:u8 |
//! | Update  | count:u32, count × (id:u8, x:f32, y:f32, direction:f32) |
//! | Client  | forward, backward, rotate_cw, rotate_ccw (one byte each) |

use bincode::Options;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

/// Identifies protocol traffic among unrelated UDP noise
pub const MAGIC: [u8; 6] = *b"BOXMAN";
/// Magic plus command code
pub const HEADER_LEN: usize = MAGIC.len() + 1;
/// Encoded size of one [`EntityState`] record
pub const UPDATE_RECORD_LEN: usize = 13;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("datagram does not start with the BOXMAN magic")]
    BadMagic,
    #[error("datagram truncated: {0} bytes")]
    Truncated(usize),
    #[error("unknown command code {0}")]
    UnknownCommand(u8),
    #[error("unknown entity kind {0}")]
    UnknownEntityKind(u8),
    #[error("refusing to encode an update with no entities")]
    EmptySnapshot,
    #[error("update with {0} entities does not fit the count field")]
    SnapshotTooLarge(usize),
    #[error("payload codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Command code carried in the byte after the magic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    Hello = 0,
    Quit = 1,
    Spawn = 2,
    Destroy = 3,
    Update = 4,
    Client = 5,
}

impl TryFrom<u8> for CommandCode {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CommandCode::Hello),
            1 => Ok(CommandCode::Quit),
            2 => Ok(CommandCode::Spawn),
            3 => Ok(CommandCode::Destroy),
            4 => Ok(CommandCode::Update),
            5 => Ok(CommandCode::Client),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

/// Tag telling a client whether a spawned entity is its own avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityKind {
    /// The receiving client's own avatar
    Player = 0,
    /// Somebody else's avatar
    Boxman = 1,
}

impl TryFrom<u8> for EntityKind {
    type Error = ProtocolError;

    fn try_from(kind: u8) -> Result<Self, Self::Error> {
        match kind {
            0 => Ok(EntityKind::Player),
            1 => Ok(EntityKind::Boxman),
            other => Err(ProtocolError::UnknownEntityKind(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Movement directives a client wants applied to its avatar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentFlags {
    pub forward: bool,
    pub backward: bool,
    pub rotate_cw: bool,
    pub rotate_ccw: bool,
}

impl IntentFlags {
    pub const FORWARD: IntentFlags = IntentFlags {
        forward: true,
        backward: false,
        rotate_cw: false,
        rotate_ccw: false,
    };
    pub const BACKWARD: IntentFlags = IntentFlags {
        forward: false,
        backward: true,
        rotate_cw: false,
        rotate_ccw: false,
    };
    pub const ROTATE_CW: IntentFlags = IntentFlags {
        forward: false,
        backward: false,
        rotate_cw: true,
        rotate_ccw: false,
    };
    pub const ROTATE_CCW: IntentFlags = IntentFlags {
        forward: false,
        backward: false,
        rotate_cw: false,
        rotate_ccw: true,
    };

    pub fn any(&self) -> bool {
        self.forward || self.backward || self.rotate_cw || self.rotate_ccw
    }
}

/// One record of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: u8,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
}

/// A decoded protocol command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Hello,
    Quit,
    Spawn {
        kind: EntityKind,
        id: u8,
        color: Color,
    },
    Destroy {
        id: u8,
    },
    Update {
        entities: Vec<EntityState>,
    },
    Client {
        intent: IntentFlags,
    },
}

impl Command {
    pub fn code(&self) -> CommandCode {
        match self {
            Command::Hello => CommandCode::Hello,
            Command::Quit => CommandCode::Quit,
            Command::Spawn { .. } => CommandCode::Spawn,
            Command::Destroy { .. } => CommandCode::Destroy,
            Command::Update { .. } => CommandCode::Update,
            Command::Client { .. } => CommandCode::Client,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    magic: [u8; 6],
    command: u8,
}

#[derive(Serialize, Deserialize)]
struct SpawnPayload {
    kind: u8,
    id: u8,
    color: Color,
}

fn wire() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

/// Encodes a command into a complete datagram
///
/// An `Update` with no entities is rejected with [`ProtocolError::EmptySnapshot`]
/// instead of producing a zero-count packet.
pub fn encode(command: &Command) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::with_capacity(HEADER_LEN + 8);
    let header = Header {
        magic: MAGIC,
        command: command.code() as u8,
    };
    wire().serialize_into(&mut buf, &header)?;

    match command {
        Command::Hello | Command::Quit => {}
        Command::Spawn { kind, id, color } => {
            let payload = SpawnPayload {
                kind: *kind as u8,
                id: *id,
                color: *color,
            };
            wire().serialize_into(&mut buf, &payload)?;
        }
        Command::Destroy { id } => wire().serialize_into(&mut buf, id)?,
        Command::Update { entities } => {
            if entities.is_empty() {
                return Err(ProtocolError::EmptySnapshot);
            }
            let count = u32::try_from(entities.len())
                .map_err(|_| ProtocolError::SnapshotTooLarge(entities.len()))?;
            buf.reserve(4 + entities.len() * UPDATE_RECORD_LEN);
            wire().serialize_into(&mut buf, &count)?;
            for entity in entities {
                wire().serialize_into(&mut buf, entity)?;
            }
        }
        Command::Client { intent } => wire().serialize_into(&mut buf, intent)?,
    }

    Ok(buf)
}

/// Checks only the magic prefix
pub fn has_magic(datagram: &[u8]) -> bool {
    datagram.len() >= MAGIC.len() && datagram[..MAGIC.len()] == MAGIC
}

/// Decodes a complete datagram
///
/// The magic is validated before anything else so foreign traffic is
/// reported as [`ProtocolError::BadMagic`]. Bytes after a complete payload
/// are ignored.
pub fn decode(datagram: &[u8]) -> Result<Command, ProtocolError> {
    if !has_magic(datagram) {
        return Err(ProtocolError::BadMagic);
    }
    if datagram.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated(datagram.len()));
    }

    let mut reader = datagram;
    let header: Header = read(&mut reader)?;

    let command = match CommandCode::try_from(header.command)? {
        CommandCode::Hello => Command::Hello,
        CommandCode::Quit => Command::Quit,
        CommandCode::Spawn => {
            let payload: SpawnPayload = read(&mut reader)?;
            Command::Spawn {
                kind: EntityKind::try_from(payload.kind)?,
                id: payload.id,
                color: payload.color,
            }
        }
        CommandCode::Destroy => Command::Destroy {
            id: read(&mut reader)?,
        },
        CommandCode::Update => {
            let count: u32 = read(&mut reader)?;
            let count = count as usize;
            // Bound the count by what is actually present before allocating
            if count > reader.len() / UPDATE_RECORD_LEN {
                return Err(ProtocolError::Truncated(datagram.len()));
            }
            let mut entities = Vec::with_capacity(count);
            for _ in 0..count {
                entities.push(read(&mut reader)?);
            }
            Command::Update { entities }
        }
        CommandCode::Client => Command::Client {
            intent: read(&mut reader)?,
        },
    };

    Ok(command)
}

fn read<T, R>(reader: R) -> Result<T, ProtocolError>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    Ok(wire().deserialize_from(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(command: Command) {
        let bytes = encode(&command).unwrap();
        assert_eq!(&bytes[..6], b"BOXMAN");
        assert_eq!(bytes[6], command.code() as u8);
        assert_eq!(decode(&bytes).unwrap(), command);
    }

    #[test]
    fn test_roundtrip_every_command() {
        roundtrip(Command::Hello);
        roundtrip(Command::Quit);
        roundtrip(Command::Spawn {
            kind: EntityKind::Player,
            id: 0,
            color: Color::new(0, 0, 255),
        });
        roundtrip(Command::Spawn {
            kind: EntityKind::Boxman,
            id: 255,
            color: Color::new(255, 255, 0),
        });
        roundtrip(Command::Destroy { id: 0 });
        roundtrip(Command::Destroy { id: 255 });
        roundtrip(Command::Update {
            entities: vec![
                EntityState {
                    id: 0,
                    x: 0.0,
                    y: 0.0,
                    direction: 0.0,
                },
                EntityState {
                    id: 255,
                    x: 639.75,
                    y: -1.5,
                    direction: std::f32::consts::TAU,
                },
            ],
        });
        roundtrip(Command::Client {
            intent: IntentFlags::default(),
        });
        roundtrip(Command::Client {
            intent: IntentFlags {
                forward: true,
                backward: false,
                rotate_cw: true,
                rotate_ccw: false,
            },
        });
    }

    #[test]
    fn test_empty_header_commands_are_seven_bytes() {
        assert_eq!(encode(&Command::Hello).unwrap(), b"BOXMAN\x00".to_vec());
        assert_eq!(encode(&Command::Quit).unwrap(), b"BOXMAN\x01".to_vec());
    }

    #[test]
    fn test_spawn_layout() {
        let bytes = encode(&Command::Spawn {
            kind: EntityKind::Boxman,
            id: 7,
            color: Color::new(1, 2, 3),
        })
        .unwrap();
        assert_eq!(&bytes[6..], &[2, 1, 7, 1, 2, 3]);
    }

    #[test]
    fn test_update_layout_is_big_endian() {
        let bytes = encode(&Command::Update {
            entities: vec![EntityState {
                id: 9,
                x: 1.0,
                y: 2.0,
                direction: 0.5,
            }],
        })
        .unwrap();

        assert_eq!(bytes.len(), HEADER_LEN + 4 + UPDATE_RECORD_LEN);
        assert_eq!(&bytes[7..11], &1u32.to_be_bytes());
        assert_eq!(bytes[11], 9);
        assert_eq!(&bytes[12..16], &1.0f32.to_be_bytes());
        assert_eq!(&bytes[16..20], &2.0f32.to_be_bytes());
        assert_eq!(&bytes[20..24], &0.5f32.to_be_bytes());
    }

    #[test]
    fn test_client_layout() {
        let bytes = encode(&Command::Client {
            intent: IntentFlags::ROTATE_CCW,
        })
        .unwrap();
        assert_eq!(&bytes[6..], &[5, 0, 0, 0, 1]);
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let result = encode(&Command::Update { entities: vec![] });
        assert!(matches!(result, Err(ProtocolError::EmptySnapshot)));
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(decode(b"BOXMAM\x00"), Err(ProtocolError::BadMagic)));
        assert!(matches!(decode(b"BOX"), Err(ProtocolError::BadMagic)));
        assert!(matches!(decode(b""), Err(ProtocolError::BadMagic)));
    }

    #[test]
    fn test_magic_without_command() {
        assert!(matches!(decode(b"BOXMAN"), Err(ProtocolError::Truncated(6))));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            decode(b"BOXMAN\x2a"),
            Err(ProtocolError::UnknownCommand(42))
        ));
    }

    #[test]
    fn test_unknown_entity_kind() {
        assert!(matches!(
            decode(b"BOXMAN\x02\x09\x01\x00\x00\x00"),
            Err(ProtocolError::UnknownEntityKind(9))
        ));
    }

    #[test]
    fn test_short_payloads_are_rejected() {
        assert!(decode(b"BOXMAN\x02\x00\x01").is_err());
        assert!(decode(b"BOXMAN\x03").is_err());
        assert!(decode(b"BOXMAN\x05\x01\x00").is_err());
    }

    #[test]
    fn test_update_count_exceeding_payload() {
        let mut bytes = encode(&Command::Update {
            entities: vec![EntityState {
                id: 1,
                x: 0.0,
                y: 0.0,
                direction: 0.0,
            }],
        })
        .unwrap();
        bytes[7..11].copy_from_slice(&u32::MAX.to_be_bytes());

        assert!(matches!(decode(&bytes), Err(ProtocolError::Truncated(_))));
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        assert!(matches!(
            decode(b"BOXMAN\x05\x02\x00\x00\x00"),
            Err(ProtocolError::Codec(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut bytes = encode(&Command::Destroy { id: 3 }).unwrap();
        bytes.extend_from_slice(&[0xff, 0xff]);
        assert_eq!(decode(&bytes).unwrap(), Command::Destroy { id: 3 });
    }
}
