use rand::Rng;
use shared::{Body, Color, EntityState, IntentFlags, Vector2, WORLD_HEIGHT, WORLD_WIDTH};
use std::f32::consts::TAU;

pub const THRUST: f32 = 500.0;
pub const ANGULAR_THRUST: f32 = 20.0;
pub const BOXMAN_MASS: f32 = 10.0;
pub const BOXMAN_MOMENT: f32 = 10.0;

/// Colors handed out to new players
pub const PALETTE: [Color; 6] = [
    Color::new(0, 0, 255),
    Color::new(0, 255, 0),
    Color::new(0, 255, 255),
    Color::new(255, 0, 0),
    Color::new(255, 0, 255),
    Color::new(255, 255, 0),
];

/// Picks a palette color
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    PALETTE[rng.gen_range(0..PALETTE.len())]
}

/// Server-side avatar of one connected player
#[derive(Debug, Clone)]
pub struct Boxman {
    pub id: u8,
    pub color: Color,
    pub intent: IntentFlags,
    body: Body,
}

impl Boxman {
    pub fn new(id: u8, color: Color) -> Self {
        let mut body = Body::new(BOXMAN_MASS, BOXMAN_MOMENT);
        body.position = Vector2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0);
        Self {
            id,
            color,
            intent: IntentFlags::default(),
            body,
        }
    }

    pub fn position(&self) -> Vector2 {
        self.body.position
    }

    pub fn velocity(&self) -> Vector2 {
        self.body.velocity
    }

    /// Heading in radians, always within `[0, 2π)`
    pub fn direction(&self) -> f32 {
        self.body.angle
    }

    pub fn set_intent(&mut self, intent: IntentFlags) {
        self.intent = intent;
    }

    /// Advances the avatar by `dt` seconds using its current intent
    pub fn update(&mut self, dt: f32) {
        let mut force = Vector2::ZERO;
        let mut torque = 0.0;

        if self.intent.rotate_cw {
            torque += ANGULAR_THRUST;
        }
        if self.intent.rotate_ccw {
            torque -= ANGULAR_THRUST;
        }
        if self.intent.forward {
            force = force + Vector2::from_angle(-self.body.angle, THRUST);
        }
        if self.intent.backward {
            force = force - Vector2::from_angle(-self.body.angle, THRUST);
        }

        self.body.reset_force();
        self.body.add_force(force);
        self.body.reset_torque();
        self.body.add_torque(torque);
        self.body.update(dt);

        self.body.position = self.body.position.wrap(WORLD_WIDTH, WORLD_HEIGHT);
        self.body.angle = self.body.angle.rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative angles
        if self.body.angle >= TAU {
            self.body.angle = 0.0;
        }
    }

    pub fn state(&self) -> EntityState {
        let position = self.position();
        EntityState {
            id: self.id,
            x: position.x,
            y: position.y,
            direction: self.direction(),
        }
    }
}
