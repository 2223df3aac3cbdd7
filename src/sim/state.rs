//! Game state and core simulation types
//!
//! The body store, the aiming piece and the session phase all live here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ranks::RankTable;
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for start
    Idle,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Settled material crossed the danger line
    GameOver,
}

/// Whether a body is integrated under gravity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motion {
    Falling,
    /// At rest; only moved by separation, nudges or merges
    Settled,
}

/// Play field geometry (origin top-left, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Clamp a circle center so the whole circle stays inside the field
    pub fn clamp(&self, pos: Vec2, radius: f32) -> Vec2 {
        let max_x = (self.width - radius).max(radius);
        let max_y = (self.height - radius).max(radius);
        Vec2::new(pos.x.clamp(radius, max_x), pos.y.clamp(radius, max_y))
    }

    /// Whether a body has left the field by more than `margin`
    pub fn escaped(&self, pos: Vec2, radius: f32, margin: f32) -> bool {
        !pos.is_finite()
            || pos.x + radius < -margin
            || pos.x - radius > self.width + margin
            || pos.y + radius < -margin
            || pos.y - radius > self.height + margin
    }

    /// y coordinate of the danger line
    #[inline]
    pub fn danger_y(&self, ratio: f32) -> f32 {
        self.height * ratio
    }
}

/// A live piece in the well
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub rank: usize,
    pub motion: Motion,
}

impl Body {
    #[inline]
    pub fn is_falling(&self) -> bool {
        self.motion == Motion::Falling
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.motion == Motion::Settled
    }

    /// Bring the body to rest
    pub fn settle(&mut self) {
        self.vel = Vec2::ZERO;
        self.motion = Motion::Settled;
    }

    /// y coordinate of the top edge
    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.radius
    }
}

/// The piece following player input, not yet collidable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimingBody {
    pub rank: usize,
    pub pos: Vec2,
    pub radius: f32,
}

/// Things that happened during a tick, drained by the session each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Dropped { id: u32, rank: usize },
    Merged { id: u32, rank: usize, pos: Vec2, points: u64 },
    NewBest { best: u64 },
    GameOver { score: u64 },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub ranks: RankTable,
    pub field: Field,
    pub phase: GamePhase,
    pub score: u64,
    pub best_score: u64,
    /// Live bodies, falling and settled
    pub bodies: Vec<Body>,
    pub aiming: Option<AimingBody>,
    /// Rank of the piece that spawns after the current aiming body
    pub next_rank: usize,
    /// Last horizontal aim coordinate
    pub aim_x: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub events: Vec<GameEvent>,
    last_drop_ms: Option<f64>,
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    pub fn new(tuning: Tuning, ranks: RankTable, field: Field, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let next_rank = rng.random_range(0..tuning.spawn_rank_count.clamp(1, ranks.len()));
        Self {
            tuning,
            ranks,
            field,
            phase: GamePhase::Idle,
            score: 0,
            best_score: 0,
            bodies: Vec::new(),
            aiming: None,
            next_rank,
            aim_x: field.width / 2.0,
            time_ticks: 0,
            events: Vec::new(),
            last_drop_ms: None,
            rng,
            next_id: 1,
        }
    }

    /// Allocate a new body ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert a live body of `rank`; the position is clamped into the field
    pub fn spawn_body(&mut self, rank: usize, pos: Vec2, vel: Vec2, motion: Motion) -> u32 {
        let id = self.next_entity_id();
        let radius = self.ranks.radius(rank, self.field.width);
        self.bodies.push(Body {
            id,
            pos: self.field.clamp(pos, radius),
            vel,
            radius,
            rank,
            motion,
        });
        id
    }

    pub fn body(&self, id: u32) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn danger_y(&self) -> f32 {
        self.field.danger_y(self.tuning.danger_line_ratio)
    }

    fn roll_spawn_rank(&mut self) -> usize {
        let count = self.tuning.spawn_rank_count.clamp(1, self.ranks.len());
        self.rng.random_range(0..count)
    }

    /// Put the queued rank into the aimer and roll a new preview
    pub fn spawn_aiming(&mut self) {
        if self.aiming.is_some() {
            return;
        }
        let rank = self.next_rank;
        let radius = self.ranks.radius(rank, self.field.width);
        let pos = Vec2::new(self.aim_x, radius + self.tuning.spawn_gap);
        self.aiming = Some(AimingBody {
            rank,
            pos: self.field.clamp(pos, radius),
            radius,
        });
        self.next_rank = self.roll_spawn_rank();
    }

    /// Move the aimer horizontally
    pub fn set_aim(&mut self, x: f32) {
        if !x.is_finite() {
            return;
        }
        self.aim_x = x.clamp(0.0, self.field.width);
        if let Some(aiming) = &mut self.aiming {
            aiming.pos.x = self.aim_x;
            aiming.pos = self.field.clamp(aiming.pos, aiming.radius);
        }
    }

    /// Release the aiming body into the live set, honoring the cooldown
    pub fn try_drop(&mut self, now_ms: f64) -> Option<u32> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        if let Some(last) = self.last_drop_ms {
            if now_ms - last < self.tuning.drop_cooldown_ms {
                return None;
            }
        }
        let aiming = self.aiming.take()?;
        self.last_drop_ms = Some(now_ms);

        let vel = Vec2::new(0.0, self.tuning.drop_speed);
        let id = self.spawn_body(aiming.rank, aiming.pos, vel, Motion::Falling);
        self.events.push(GameEvent::Dropped {
            id,
            rank: aiming.rank,
        });
        Some(id)
    }

    /// Add merge points, tracking the best score
    pub fn award(&mut self, points: u64) {
        self.score += points;
        if self.score > self.best_score {
            self.best_score = self.score;
            self.events.push(GameEvent::NewBest {
                best: self.best_score,
            });
        }
    }

    /// Idle -> Playing with an empty well
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.clear_run();
        self.phase = GamePhase::Playing;
        self.next_rank = self.roll_spawn_rank();
        self.spawn_aiming();
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
            true
        } else {
            false
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.pause() || self.resume()
    }

    /// Any phase -> Idle; clears bodies and score, keeps the best score
    pub fn restart(&mut self) {
        self.clear_run();
        self.phase = GamePhase::Idle;
    }

    pub(crate) fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        if self.score > self.best_score {
            self.best_score = self.score;
            self.events.push(GameEvent::NewBest {
                best: self.best_score,
            });
        }
        self.events.push(GameEvent::GameOver { score: self.score });
    }

    fn clear_run(&mut self) {
        self.score = 0;
        self.bodies.clear();
        self.aiming = None;
        self.events.clear();
        self.last_drop_ms = None;
        self.time_ticks = 0;
    }

    /// Rescale every body to a new field size
    ///
    /// Radii are recomputed from the rank table at the new width; positions
    /// and velocities scale per axis so `x / width` and `y / height` hold.
    /// Empty or non-finite sizes are ignored.
    pub fn resize(&mut self, field: Field) {
        let usable = field.width.is_finite()
            && field.height.is_finite()
            && field.width > 0.0
            && field.height > 0.0;
        if !usable || field == self.field {
            return;
        }
        let scale = Vec2::new(field.width / self.field.width, field.height / self.field.height);
        self.field = field;

        for body in &mut self.bodies {
            body.radius = self.ranks.radius(body.rank, field.width);
            body.pos = field.clamp(body.pos * scale, body.radius);
            body.vel *= scale;
        }
        if let Some(aiming) = &mut self.aiming {
            aiming.radius = self.ranks.radius(aiming.rank, field.width);
            aiming.pos = field.clamp(aiming.pos * scale, aiming.radius);
        }
        self.aim_x *= scale.x;
        log::debug!("Field resized to {}x{}", field.width, field.height);
    }
}
