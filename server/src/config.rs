use shared::{DEFAULT_PORT, MAX_IDENTS};
use std::net::SocketAddr;
use std::time::Duration;

// Runtime/server constants (not gameplay tuning).

pub const DEFAULT_TICK_RATE: u32 = 20;

/// Longest step fed to the simulation; longer stalls are clamped to this
pub const MAX_DELTA_TIME: f32 = 1.0 / 20.0;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Simulation and snapshot ticks per second
    pub tick_rate: u32,
    /// Player limit, at most the size of the id pool
    pub capacity: usize,
}

impl ServerConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tick_rate.max(1) as f32)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            tick_rate: DEFAULT_TICK_RATE,
            capacity: MAX_IDENTS,
        }
    }
}
