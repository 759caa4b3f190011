use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementComponent {
    /// Tiles per second
    pub speed: f32,
    /// Degrees, 0 = +x, counter-clockwise
    #[serde(default)]
    pub heading_deg: f32,
    /// Cleared at the end of every step
    #[serde(default)]
    pub stunned: bool,
    /// Fraction of a tile carried over from earlier steps
    #[serde(skip)]
    progress: f32,
}

impl MovementComponent {
    pub fn new(speed: f32) -> Self {
        Self {
            speed: speed.max(0.0),
            heading_deg: 0.0,
            stunned: false,
            progress: 0.0,
        }
    }

    pub fn facing(mut self, heading_deg: f32) -> Self {
        self.heading_deg = heading_deg.rem_euclid(360.0);
        self
    }

    /// Whole tiles that may be covered this step
    ///
    /// Short steps bank their fraction of a tile until it adds up.
    pub fn advance(&mut self, dt: f32, speed_mult: f32) -> u32 {
        if self.stunned {
            return 0;
        }
        self.progress += self.speed * speed_mult.max(0.0) * dt;
        let tiles = self.progress.floor().max(0.0);
        self.progress -= tiles;
        tiles as u32
    }

    /// Forget banked progress, e.g. after being blocked
    pub fn halt(&mut self) {
        self.progress = 0.0;
    }
}
