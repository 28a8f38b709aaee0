use std::ops::{Add, AddAssign, Sub};

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    ///Value along the x-axis.
    pub x: f32,
    ///Value along the y-axis.
    pub y: f32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    ///Returns a vector of the given magnitude pointing along `angle` (radians).
    pub fn from_angle(angle: f32, magnitude: f32) -> Vector2 {
        Vector2 {
            x: angle.cos() * magnitude,
            y: angle.sin() * magnitude,
        }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector.
    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2::ZERO
        } else {
            Vector2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Wraps both components into `[0, width)` and `[0, height)`.
    pub fn wrap(&self, width: f32, height: f32) -> Vector2 {
        Vector2 {
            x: wrap_component(self.x, width),
            y: wrap_component(self.y, height),
        }
    }
}

fn wrap_component(value: f32, extent: f32) -> f32 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid rounds up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, other: Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, other: Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, other: Vector2) {
        self.x += other.x;
        self.y += other.y;
    }
}

///A rigid body driven by accumulated force and torque.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub mass: f32,
    pub position: Vector2,
    pub velocity: Vector2,
    pub force: Vector2,
    ///Moment of inertia.
    pub moment: f32,
    ///Heading in radians.
    pub angle: f32,
    pub angular_velocity: f32,
    pub torque: f32,
}

impl Body {
    pub fn new(mass: f32, moment: f32) -> Self {
        Body {
            mass,
            position: Vector2::ZERO,
            velocity: Vector2::ZERO,
            force: Vector2::ZERO,
            moment,
            angle: 0.0,
            angular_velocity: 0.0,
            torque: 0.0,
        }
    }

    pub fn reset_force(&mut self) {
        self.force = Vector2::ZERO;
    }

    pub fn add_force(&mut self, force: Vector2) {
        self.force += force;
    }

    pub fn reset_torque(&mut self) {
        self.torque = 0.0;
    }

    pub fn add_torque(&mut self, torque: f32) {
        self.torque += torque;
    }

    ///Integrates velocity then position (semi-implicit Euler).
    pub fn update(&mut self, dt: f32) {
        let acceleration = self.force.scale(1.0 / self.mass);
        self.velocity += acceleration.scale(dt);
        self.position += self.velocity.scale(dt);

        let angular_acceleration = self.torque / self.moment;
        self.angular_velocity += angular_acceleration * dt;
        self.angle += self.angular_velocity * dt;
    }
}
