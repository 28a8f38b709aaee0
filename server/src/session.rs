//! Server-side command dispatch and simulation step
//!
//! [`ServerSession`] is the server's half of the protocol. It routes `Hello`,
//! `Quit` and `Client` commands to their handlers, advances every avatar once
//! per tick and queues the resulting snapshot for every connected peer.
//! Handlers never fail: unknown peers and unexpected commands are logged and
//! ignored, since datagrams from one peer may arrive in any order.

use crate::client_manager::ClientManager;
use crate::game::random_color;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Command, Dispatch, EntityKind, IntentFlags, WriteQueue};
use std::net::SocketAddr;

pub struct ServerSession {
    clients: ClientManager,
    queue: WriteQueue,
    rng: StdRng,
}

impl ServerSession {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    /// Session with a fixed color sequence, for reproducible runs
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        Self {
            clients: ClientManager::new(capacity),
            queue: WriteQueue::new(),
            rng,
        }
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    /// Spawns an avatar for a new peer and announces it
    ///
    /// The newcomer learns about every existing avatar, every existing peer
    /// learns about the newcomer, and finally the newcomer is told which
    /// avatar is its own. A repeated hello is a no-op.
    fn on_hello(&mut self, from: SocketAddr) {
        if self.clients.contains(&from) {
            debug!("Hello from already known client {}", from);
            return;
        }

        let color = random_color(&mut self.rng);
        let id = match self.clients.add_client(from, color) {
            Ok(id) => id,
            Err(e) => {
                warn!("Refusing client {}: {}", from, e);
                self.queue.push(&Command::Quit, from);
                return;
            }
        };

        let newcomer = Command::Spawn {
            kind: EntityKind::Boxman,
            id,
            color,
        };
        for (addr, existing) in self.clients.iter() {
            if *addr == from {
                continue;
            }
            let announce_existing = Command::Spawn {
                kind: EntityKind::Boxman,
                id: existing.id,
                color: existing.color,
            };
            self.queue.push(&announce_existing, from);
            self.queue.push(&newcomer, *addr);
        }

        let own = Command::Spawn {
            kind: EntityKind::Player,
            id,
            color,
        };
        self.queue.push(&own, from);
        debug!("Hello: spawned entity {} for {}", id, from);
    }

    /// Removes a departing peer, acknowledges it and tells everyone else
    fn on_quit(&mut self, from: SocketAddr) {
        let Some(boxman) = self.clients.remove_client(&from) else {
            debug!("Quit from unknown client {}", from);
            return;
        };

        self.queue.push(&Command::Quit, from);
        self.queue
            .broadcast(&Command::Destroy { id: boxman.id }, self.clients.addrs());
    }

    fn on_client(&mut self, intent: IntentFlags, from: SocketAddr) {
        if !self.clients.set_intent(&from, intent) {
            debug!("Client state from unknown client {}", from);
        }
    }

    /// Advances every avatar and queues one snapshot per connected peer
    ///
    /// Nothing is queued while no one is connected.
    pub fn step(&mut self, dt: f32) {
        self.clients.update_all(dt);

        let entities = self.clients.snapshot();
        if entities.is_empty() {
            return;
        }
        self.queue
            .broadcast(&Command::Update { entities }, self.clients.addrs());
    }

    /// Drops every client, sending each a `Quit`
    pub fn disconnect_all(&mut self) {
        for addr in self.clients.addrs() {
            self.clients.remove_client(&addr);
            self.queue.push(&Command::Quit, addr);
        }
    }
}

impl Dispatch for ServerSession {
    fn handle(&mut self, command: Command, from: SocketAddr) {
        match command {
            Command::Hello => self.on_hello(from),
            Command::Quit => self.on_quit(from),
            Command::Client { intent } => self.on_client(intent, from),
            other => warn!("Unexpected {:?} command from {}", other.code(), from),
        }
    }

    fn write_queue(&mut self) -> &mut WriteQueue {
        &mut self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{decode, encode, Datagram};

    fn addr_a() -> SocketAddr {
        "10.0.0.1:5000".parse().unwrap()
    }

    fn addr_b() -> SocketAddr {
        "10.0.0.2:5000".parse().unwrap()
    }

    fn send(session: &mut ServerSession, command: Command, from: SocketAddr) {
        session.dispatch(&encode(&command).unwrap(), from);
    }

    fn drain(session: &mut ServerSession) -> Vec<(Command, SocketAddr)> {
        let mut out = Vec::new();
        while let Some(Datagram { payload, to }) = session.write_queue().pop() {
            out.push((decode(&payload).unwrap(), to));
        }
        out
    }

    fn id_of(session: &ServerSession, addr: SocketAddr) -> u8 {
        session.clients().get(&addr).unwrap().id
    }

    #[test]
    fn test_hello_spawns_own_avatar() {
        let mut session = ServerSession::with_seed(256, 1);
        send(&mut session, Command::Hello, addr_a());

        assert_eq!(session.clients().len(), 1);
        let color = session.clients().get(&addr_a()).unwrap().color;
        let sent = drain(&mut session);
        assert_eq!(
            sent,
            vec![(
                Command::Spawn {
                    kind: EntityKind::Player,
                    id: 0,
                    color,
                },
                addr_a()
            )]
        );
    }

    #[test]
    fn test_hello_is_idempotent() {
        let mut session = ServerSession::with_seed(256, 1);
        send(&mut session, Command::Hello, addr_a());
        assert_eq!(session.clients().len(), 1);
        drain(&mut session);

        send(&mut session, Command::Hello, addr_a());
        assert_eq!(session.clients().len(), 1);
        assert_eq!(session.clients().ids().used_count(), 1);
        assert!(session.queue().is_empty());
    }

    #[test]
    fn test_second_hello_announces_both_ways() {
        let mut session = ServerSession::with_seed(256, 2);
        send(&mut session, Command::Hello, addr_a());
        drain(&mut session);
        send(&mut session, Command::Hello, addr_b());

        let a = session.clients().get(&addr_a()).unwrap().clone();
        let b = session.clients().get(&addr_b()).unwrap().clone();
        let sent = drain(&mut session);

        assert_eq!(
            sent,
            vec![
                (
                    Command::Spawn {
                        kind: EntityKind::Boxman,
                        id: a.id,
                        color: a.color,
                    },
                    addr_b()
                ),
                (
                    Command::Spawn {
                        kind: EntityKind::Boxman,
                        id: b.id,
                        color: b.color,
                    },
                    addr_a()
                ),
                (
                    Command::Spawn {
                        kind: EntityKind::Player,
                        id: b.id,
                        color: b.color,
                    },
                    addr_b()
                ),
            ]
        );
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_hello_when_full_is_refused_with_quit() {
        let mut session = ServerSession::with_seed(1, 3);
        send(&mut session, Command::Hello, addr_a());
        drain(&mut session);

        send(&mut session, Command::Hello, addr_b());
        assert_eq!(session.clients().len(), 1);
        assert!(!session.clients().contains(&addr_b()));
        assert_eq!(drain(&mut session), vec![(Command::Quit, addr_b())]);
    }

    #[test]
    fn test_quit_cleans_up_and_notifies_remaining() {
        let mut session = ServerSession::with_seed(256, 4);
        send(&mut session, Command::Hello, addr_a());
        send(&mut session, Command::Hello, addr_b());
        let a_id = id_of(&session, addr_a());
        drain(&mut session);

        send(&mut session, Command::Quit, addr_a());

        assert!(!session.clients().contains(&addr_a()));
        assert!(!session.clients().ids().is_used(a_id));
        assert_eq!(session.clients().len(), 1);

        let sent = drain(&mut session);
        let destroys_to_b = sent
            .iter()
            .filter(|(cmd, to)| *cmd == Command::Destroy { id: a_id } && *to == addr_b())
            .count();
        let anything_destroy_to_a = sent
            .iter()
            .any(|(cmd, to)| matches!(cmd, Command::Destroy { .. }) && *to == addr_a());
        assert_eq!(destroys_to_b, 1);
        assert!(!anything_destroy_to_a);
        assert!(sent.contains(&(Command::Quit, addr_a())));
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn test_quit_from_unknown_is_noop() {
        let mut session = ServerSession::with_seed(256, 5);
        send(&mut session, Command::Quit, addr_a());
        assert!(session.queue().is_empty());
        assert_eq!(session.clients().ids().used_count(), 0);
    }

    #[test]
    fn test_freed_id_is_reused_after_quit() {
        let mut session = ServerSession::with_seed(256, 6);
        send(&mut session, Command::Hello, addr_a());
        let first = id_of(&session, addr_a());
        send(&mut session, Command::Quit, addr_a());
        send(&mut session, Command::Hello, addr_b());
        assert_eq!(id_of(&session, addr_b()), first);
    }

    #[test]
    fn test_client_updates_intent() {
        let mut session = ServerSession::with_seed(256, 7);
        send(&mut session, Command::Hello, addr_a());
        send(
            &mut session,
            Command::Client {
                intent: IntentFlags::ROTATE_CW,
            },
            addr_a(),
        );
        assert_eq!(
            session.clients().get(&addr_a()).unwrap().intent,
            IntentFlags::ROTATE_CW
        );
    }

    #[test]
    fn test_client_from_unknown_is_dropped() {
        let mut session = ServerSession::with_seed(256, 8);
        send(
            &mut session,
            Command::Client {
                intent: IntentFlags::FORWARD,
            },
            addr_a(),
        );
        assert!(session.clients().is_empty());
        assert!(session.queue().is_empty());
    }

    #[test]
    fn test_unexpected_and_malformed_commands_are_dropped() {
        let mut session = ServerSession::with_seed(256, 9);
        send(&mut session, Command::Destroy { id: 1 }, addr_a());
        session.dispatch(b"XXXXXX\x00", addr_a());
        session.dispatch(b"BOXMAN\x63", addr_a());
        session.dispatch(b"BOXMAN\x05\x01", addr_a());

        assert!(session.clients().is_empty());
        assert!(session.queue().is_empty());
    }

    #[test]
    fn test_step_with_no_players_sends_nothing() {
        let mut session = ServerSession::with_seed(256, 10);
        session.step(0.05);
        assert!(session.queue().is_empty());
    }

    #[test]
    fn test_step_sends_snapshot_to_every_peer() {
        let mut session = ServerSession::with_seed(256, 11);
        send(&mut session, Command::Hello, addr_a());
        send(&mut session, Command::Hello, addr_b());
        drain(&mut session);

        session.step(0.05);
        let sent = drain(&mut session);
        assert_eq!(sent.len(), 2);

        let mut recipients: Vec<SocketAddr> = sent.iter().map(|(_, to)| *to).collect();
        recipients.sort();
        assert_eq!(recipients, vec![addr_a(), addr_b()]);

        for (command, _) in sent {
            match command {
                Command::Update { entities } => {
                    let ids: Vec<u8> = entities.iter().map(|e| e.id).collect();
                    assert_eq!(ids, vec![0, 1]);
                }
                other => panic!("Unexpected command {:?}", other),
            }
        }
    }

    #[test]
    fn test_step_applies_intent() {
        let mut session = ServerSession::with_seed(256, 12);
        send(&mut session, Command::Hello, addr_a());
        send(
            &mut session,
            Command::Client {
                intent: IntentFlags::FORWARD,
            },
            addr_a(),
        );
        drain(&mut session);

        session.step(0.1);
        match drain(&mut session).pop() {
            Some((Command::Update { entities }, to)) => {
                assert_eq!(to, addr_a());
                assert!(entities[0].x > 320.0);
            }
            other => panic!("Expected an update, got {:?}", other),
        }
    }

    #[test]
    fn test_disconnect_all() {
        let mut session = ServerSession::with_seed(256, 13);
        send(&mut session, Command::Hello, addr_a());
        send(&mut session, Command::Hello, addr_b());
        drain(&mut session);

        session.disconnect_all();
        assert!(session.clients().is_empty());
        assert_eq!(session.clients().ids().used_count(), 0);

        let sent = drain(&mut session);
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(cmd, _)| *cmd == Command::Quit));
    }
}
