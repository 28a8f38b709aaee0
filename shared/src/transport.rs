//! Non-blocking datagram transport shared by server and client
//!
//! The transport never blocks the caller's tick loop: the socket is put in
//! non-blocking mode and every poll stops at the first `WouldBlock`. Inbound
//! datagrams are handed to a [`Dispatch`] implementation; outbound commands
//! wait in that implementation's [`WriteQueue`] until the next flush.

use crate::protocol::{self, Command, ProtocolError};
use log::{debug, warn};
use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Receive buffer size for one datagram
pub const MAX_DATAGRAM: usize = 4096;

/// An encoded packet waiting to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub payload: Vec<u8>,
    pub to: SocketAddr,
}

/// FIFO of encoded packets, produced by handlers and drained by the transport
#[derive(Debug, Default)]
pub struct WriteQueue {
    pending: VecDeque<Datagram>,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `command` and queues it for `to`
    ///
    /// Commands that cannot be encoded (an empty snapshot, for instance) are
    /// logged and skipped rather than queued.
    pub fn push(&mut self, command: &Command, to: SocketAddr) {
        match protocol::encode(command) {
            Ok(payload) => self.pending.push_back(Datagram { payload, to }),
            Err(ProtocolError::EmptySnapshot) => {
                debug!("Skipping empty update for {}", to);
            }
            Err(e) => warn!("Failed to encode {:?} for {}: {}", command.code(), to, e),
        }
    }

    /// Encodes `command` once and queues a copy for every address
    pub fn broadcast<I>(&mut self, command: &Command, to: I)
    where
        I: IntoIterator<Item = SocketAddr>,
    {
        let payload = match protocol::encode(command) {
            Ok(payload) => payload,
            Err(ProtocolError::EmptySnapshot) => {
                debug!("Skipping empty update broadcast");
                return;
            }
            Err(e) => {
                warn!("Failed to encode {:?} for broadcast: {}", command.code(), e);
                return;
            }
        };
        for addr in to {
            self.pending.push_back(Datagram {
                payload: payload.clone(),
                to: addr,
            });
        }
    }

    pub fn pop(&mut self) -> Option<Datagram> {
        self.pending.pop_front()
    }

    pub fn front(&self) -> Option<&Datagram> {
        self.pending.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Datagram> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

}

/// Role-specific command routing
///
/// [`Dispatch::dispatch`] is the single entry point for raw datagrams. It
/// strips and validates the header and only calls [`Dispatch::handle`] for
/// well-formed commands; everything else is logged and dropped so a
/// misbehaving peer cannot take the endpoint down.
pub trait Dispatch {
    /// Routes one decoded command from `from`
    fn handle(&mut self, command: Command, from: SocketAddr);

    /// Queue the transport drains after each receive pass
    fn write_queue(&mut self) -> &mut WriteQueue;

    fn dispatch(&mut self, datagram: &[u8], from: SocketAddr) {
        match protocol::decode(datagram) {
            Ok(command) => self.handle(command, from),
            Err(ProtocolError::BadMagic) => {
                warn!("Dropping foreign datagram ({} bytes) from {}", datagram.len(), from);
            }
            Err(e) => warn!("Dropping malformed datagram from {}: {}", from, e),
        }
    }
}

/// One non-blocking UDP endpoint
pub struct Transport {
    socket: UdpSocket,
    buffer: Box<[u8; MAX_DATAGRAM]>,
}

impl Transport {
    /// Binds a non-blocking socket
    ///
    /// Servers bind their configured address; clients bind `0.0.0.0:0` for an
    /// ephemeral port.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            buffer: Box::new([0u8; MAX_DATAGRAM]),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receives every pending datagram, then flushes the write queue
    pub fn update<D: Dispatch>(&mut self, dispatcher: &mut D) -> io::Result<()> {
        self.receive(dispatcher)?;
        self.flush(dispatcher.write_queue())?;
        Ok(())
    }

    /// Hands every currently readable datagram to `dispatcher`
    ///
    /// Returns the number of datagrams received; zero is normal.
    pub fn receive<D: Dispatch>(&mut self, dispatcher: &mut D) -> io::Result<usize> {
        let mut received = 0;
        loop {
            match self.socket.recv_from(&mut self.buffer[..]) {
                Ok((len, from)) => {
                    received += 1;
                    dispatcher.dispatch(&self.buffer[..len], from);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(received),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // ICMP port unreachable from an earlier send on some platforms
                Err(e) if e.kind() == io::ErrorKind::ConnectionReset => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Sends queued datagrams until the queue is empty or the socket is full
    ///
    /// A datagram that would block stays at the head of the queue for the next
    /// flush. A datagram whose destination cannot be reached is logged and
    /// dropped so one bad peer never stalls the others. Returns the number of
    /// datagrams sent.
    pub fn flush(&self, queue: &mut WriteQueue) -> io::Result<usize> {
        let mut sent = 0;
        while let Some(datagram) = queue.front() {
            match self.socket.send_to(&datagram.payload, datagram.to) {
                Ok(_) => {
                    queue.pop();
                    sent += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_destination_error(&e) => {
                    warn!("Dropping datagram for {}: {}", datagram.to, e);
                    queue.pop();
                }
                Err(e) => return Err(e),
            }
        }
        Ok(sent)
    }
}

/// Errors tied to one destination rather than to the socket itself
fn is_destination_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::InvalidInput
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::HostUnreachable
    )
}
