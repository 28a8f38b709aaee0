//! Server network layer driving the receive / simulate / flush tick

use crate::config::{ServerConfig, MAX_DELTA_TIME};
use crate::session::ServerSession;
use log::{debug, error, info, warn};
use shared::{Dispatch, Transport};
use std::io;
use std::net::SocketAddr;
use tokio::time::{interval, Instant, MissedTickBehavior};

const MAX_CATCHUP_TICKS: u32 = 5;

/// Authoritative server owning one UDP endpoint and the session state
pub struct Server {
    transport: Transport,
    session: ServerSession,
    config: ServerConfig,
    tick: u64,
    /// Elapsed time not yet consumed by `advance`
    pending: f32,
}

impl Server {
    pub fn bind(config: ServerConfig) -> io::Result<Self> {
        let transport = Transport::bind(config.bind)?;
        let session = ServerSession::new(config.capacity);
        Ok(Self::with_session(transport, session, config))
    }

    /// Server whose session draws colors from a fixed seed
    pub fn bind_seeded(config: ServerConfig, seed: u64) -> io::Result<Self> {
        let transport = Transport::bind(config.bind)?;
        let session = ServerSession::with_seed(config.capacity, seed);
        Ok(Self::with_session(transport, session, config))
    }

    fn with_session(transport: Transport, session: ServerSession, config: ServerConfig) -> Self {
        Server {
            transport,
            session,
            config,
            tick: 0,
            pending: 0.0,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn session(&self) -> &ServerSession {
        &self.session
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Runs one server tick
    ///
    /// Every pending datagram is dispatched first, then all avatars advance
    /// by `dt` and a snapshot is queued for each peer, and finally the write
    /// queue is flushed. Socket errors are returned as fatal.
    pub fn update(&mut self, dt: f32) -> io::Result<()> {
        self.transport.receive(&mut self.session)?;
        self.session.step(dt);
        self.transport.flush(self.session.write_queue())?;
        self.tick += 1;
        Ok(())
    }

    /// Runs as many fixed-length ticks as fit in the elapsed time
    ///
    /// For hosts that drive the server from their own frame loop instead of
    /// [`Server::run`]. Leftover time carries over to the next call. A long
    /// stall runs at most `MAX_CATCHUP_TICKS` ticks and drops the rest.
    /// Returns the number of ticks run.
    pub fn advance(&mut self, elapsed: f32) -> io::Result<u32> {
        let step = self.config.tick_duration().as_secs_f32();
        self.pending += elapsed;

        let mut ticks = 0;
        while self.pending >= step {
            if ticks == MAX_CATCHUP_TICKS {
                warn!("Host fell {:.3}s behind, skipping ticks", self.pending);
                self.pending = 0.0;
                break;
            }
            self.update(step)?;
            self.pending -= step;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Sends `Quit` to every connected client and flushes it out
    pub fn shutdown(&mut self) -> io::Result<()> {
        self.session.disconnect_all();
        self.transport.flush(self.session.write_queue())?;
        Ok(())
    }

    /// Main server loop ticking at the configured rate until Ctrl+C
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut tick_interval = interval(self.config.tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        tick_interval.tick().await;
        let mut last_tick = Instant::now();

        info!("Server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let mut dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    if dt > MAX_DELTA_TIME {
                        warn!("Large delta time detected ({:.3}s), capping to {:.3}s", dt, MAX_DELTA_TIME);
                        dt = MAX_DELTA_TIME;
                    }

                    if let Err(e) = self.update(dt) {
                        error!("Socket failure, stopping server: {}", e);
                        // Best effort, the socket may be unusable
                        let _ = self.shutdown();
                        return Err(e.into());
                    }

                    // Periodic performance monitoring
                    if self.tick % 100 == 0 && !self.session.clients().is_empty() {
                        debug!("Tick {}: {} clients, {:.1}Hz", self.tick, self.session.clients().len(), 1.0 / dt);
                    }
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                    break;
                },
            }
        }

        self.shutdown()?;
        Ok(())
    }
}
