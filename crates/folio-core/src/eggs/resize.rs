//! Profile picture resize minigame.
//!
//! Each click shrinks the picture by 10% until it bottoms out at
//! `MIN_SIZE`, then grows it by 10% until it reaches `MAX_SIZE`. The click
//! after that blows it up into particles and the game starts over.

use std::f64::consts::PI;

use rand::Rng;

pub const START_SIZE: f64 = 240.0;
pub const MIN_SIZE: f64 = 10.0;
pub const MAX_SIZE: f64 = 300.0;

const SHRINK_FACTOR: f64 = 0.9;
const GROW_FACTOR: f64 = 1.1;

pub const PARTICLE_COUNT: usize = 15;
const PARTICLE_BASE_DISTANCE: f64 = 100.0;
const PARTICLE_DISTANCE_JITTER: f64 = 50.0;

/// One explosion particle, relative to the picture's center.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// HSL hue in degrees.
    pub hue: f64,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResizeStep {
    Shrunk(f64),
    /// The picture hit the minimum size; the next clicks grow it.
    Bottomed(f64),
    Grew(f64),
    Exploded(Vec<Particle>),
}

#[derive(Debug)]
pub struct ResizeGame {
    size: f64,
    growing: bool,
}

impl Default for ResizeGame {
    fn default() -> Self {
        Self {
            size: START_SIZE,
            growing: false,
        }
    }
}

impl ResizeGame {
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    pub fn click<R: Rng>(&mut self, rng: &mut R) -> ResizeStep {
        if !self.growing {
            self.size = (self.size * SHRINK_FACTOR).max(MIN_SIZE);
            if self.size <= MIN_SIZE {
                self.growing = true;
                return ResizeStep::Bottomed(self.size);
            }
            ResizeStep::Shrunk(self.size)
        } else if self.size < MAX_SIZE {
            self.size = (self.size * GROW_FACTOR).min(MAX_SIZE);
            ResizeStep::Grew(self.size)
        } else {
            let particles = explode(rng);
            self.reset();
            ResizeStep::Exploded(particles)
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn explode<R: Rng>(rng: &mut R) -> Vec<Particle> {
    (0..PARTICLE_COUNT)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / PARTICLE_COUNT as f64;
            let distance = PARTICLE_BASE_DISTANCE + rng.gen::<f64>() * PARTICLE_DISTANCE_JITTER;
            Particle {
                hue: rng.gen_range(0.0..360.0),
                dx: angle.cos() * distance,
                dy: angle.sin() * distance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_first_click_shrinks() {
        let mut game = ResizeGame::default();
        let mut rng = StdRng::seed_from_u64(7);
        match game.click(&mut rng) {
            ResizeStep::Shrunk(size) => assert!((size - 216.0).abs() < 1e-9),
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_full_cycle() {
        let mut game = ResizeGame::default();
        let mut rng = StdRng::seed_from_u64(7);

        let mut clicks = 0;
        loop {
            clicks += 1;
            if let ResizeStep::Bottomed(size) = game.click(&mut rng) {
                assert_eq!(size, MIN_SIZE);
                break;
            }
            assert!(clicks < 100, "never bottomed out");
        }
        assert!(game.is_growing());

        let particles = loop {
            match game.click(&mut rng) {
                ResizeStep::Grew(size) => assert!(size <= MAX_SIZE),
                ResizeStep::Exploded(particles) => break particles,
                other => panic!("unexpected step {other:?}"),
            }
        };

        assert_eq!(particles.len(), PARTICLE_COUNT);
        for p in &particles {
            let distance = (p.dx * p.dx + p.dy * p.dy).sqrt();
            assert!((PARTICLE_BASE_DISTANCE..=PARTICLE_BASE_DISTANCE + PARTICLE_DISTANCE_JITTER + 1e-9).contains(&distance));
            assert!((0.0..360.0).contains(&p.hue));
        }
        assert_eq!(game.size(), START_SIZE);
        assert!(!game.is_growing());
    }
}
