use log::{debug, warn};
use shared::{Color, EntityKind, EntityState, Vector2, WORLD_HEIGHT, WORLD_WIDTH};
use std::collections::HashMap;

/// Locally tracked copy of one avatar
///
/// Position and direction come from server snapshots. Between snapshots the
/// position is advanced by a velocity estimated from the last two snapshots,
/// which is purely cosmetic and overwritten by the next snapshot.
#[derive(Debug, Clone)]
pub struct ClientBoxman {
    pub id: u8,
    pub color: Color,
    pub kind: EntityKind,
    position: Vector2,
    direction: f32,
    velocity: Vector2,
    /// Client clock and position of the latest snapshot
    last_snapshot: Option<(f32, Vector2)>,
}

impl ClientBoxman {
    pub fn new(id: u8, kind: EntityKind, color: Color) -> Self {
        Self {
            id,
            color,
            kind,
            position: Vector2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0),
            direction: 0.0,
            velocity: Vector2::ZERO,
            last_snapshot: None,
        }
    }

    pub fn position(&self) -> Vector2 {
        self.position
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn velocity(&self) -> Vector2 {
        self.velocity
    }

    pub fn is_own(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Snaps to an authoritative state received at client time `now`
    pub fn apply_snapshot(&mut self, state: &EntityState, now: f32) {
        let position = Vector2::new(state.x, state.y);

        if let Some((then, previous)) = self.last_snapshot {
            let elapsed = now - then;
            if elapsed > 0.0 {
                let displacement = position - previous;
                self.velocity = Vector2::new(
                    axis_velocity(displacement.x, WORLD_WIDTH, elapsed),
                    axis_velocity(displacement.y, WORLD_HEIGHT, elapsed),
                );
            }
        }

        self.position = position;
        self.direction = state.direction;
        self.last_snapshot = Some((now, position));
    }

    /// Advances the displayed position by the estimated velocity
    pub fn interpolate(&mut self, dt: f32) {
        self.position = (self.position + self.velocity.scale(dt)).wrap(WORLD_WIDTH, WORLD_HEIGHT);
    }
}

// A jump of more than half the world is a wraparound, not movement
fn axis_velocity(displacement: f32, extent: f32, elapsed: f32) -> f32 {
    if displacement.abs() > extent / 2.0 {
        0.0
    } else {
        displacement / elapsed
    }
}

/// Client-side entity registry keyed by entity id
#[derive(Debug, Default)]
pub struct ClientGameState {
    entities: HashMap<u8, ClientBoxman>,
    own_id: Option<u8>,
    /// Seconds of client time elapsed, used to time snapshots
    clock: f32,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking an entity announced by the server
    ///
    /// A spawn for an id that is already tracked replaces the old entity,
    /// since the server may have reused the id after a lost `Destroy`.
    pub fn spawn(&mut self, kind: EntityKind, id: u8, color: Color) {
        if self.entities.contains_key(&id) {
            debug!("Replacing entity {} on respawn", id);
        }
        if kind == EntityKind::Player {
            self.own_id = Some(id);
        }
        self.entities.insert(id, ClientBoxman::new(id, kind, color));
        debug!("Spawned {:?} {}", kind, id);
    }

    /// Stops tracking an entity, returning it if it was present
    pub fn destroy(&mut self, id: u8) -> Option<ClientBoxman> {
        let removed = self.entities.remove(&id);
        match removed {
            Some(_) => {
                if self.own_id == Some(id) {
                    self.own_id = None;
                }
                debug!("Destroyed entity {}", id);
            }
            None => warn!("Destroy for unknown entity {}", id),
        }
        removed
    }

    /// Applies a snapshot record by record
    ///
    /// Records for unknown ids are logged and skipped; the rest of the batch
    /// is still applied. Returns the number of records applied.
    pub fn apply_update(&mut self, states: &[EntityState]) -> usize {
        let mut applied = 0;
        for state in states {
            match self.entities.get_mut(&state.id) {
                Some(entity) => {
                    entity.apply_snapshot(state, self.clock);
                    applied += 1;
                }
                None => warn!("Update for unknown entity {}", state.id),
            }
        }
        applied
    }

    /// Advances the client clock and every entity's displayed position
    pub fn interpolate(&mut self, dt: f32) {
        self.clock += dt;
        for entity in self.entities.values_mut() {
            entity.interpolate(dt);
        }
    }

    pub fn own_id(&self) -> Option<u8> {
        self.own_id
    }

    pub fn own(&self) -> Option<&ClientBoxman> {
        self.own_id.and_then(|id| self.entities.get(&id))
    }

    pub fn get(&self, id: u8) -> Option<&ClientBoxman> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: u8) -> bool {
        self.entities.contains_key(&id)
    }

    /// Tracked entities ordered by id, for drawing
    pub fn entities(&self) -> Vec<&ClientBoxman> {
        let mut entities: Vec<&ClientBoxman> = self.entities.values().collect();
        entities.sort_by_key(|entity| entity.id);
        entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
