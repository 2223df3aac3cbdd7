//! Session controller
//!
//! Owns the simulation state and talks to the outside world only through the
//! collaborator traits below. The host calls [`Session::frame`] once per
//! animation frame and stops scheduling when it returns `false`.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;

use crate::persistence::BestScoreStore;
use crate::sim::{
    AimingBody, Body, Field, GameEvent, GamePhase, GameState, RankTable, TickInput, tick,
};
use crate::tuning::Tuning;

/// Supplies aim position and drop requests, polled at the top of each tick
pub trait InputSource {
    fn poll(&mut self, now_ms: f64) -> TickInput;
}

/// Draws a frame; must not mutate the simulation
pub trait RenderSink {
    fn render(&mut self, frame: &FrameView<'_>);
}

/// Notified whenever the score or the best score changes
pub trait ScoreSink {
    fn scores_changed(&mut self, score: u64, best: u64);
}

/// Current play field size (may change on viewport resize)
pub trait FieldGeometry {
    fn size(&self) -> Field;
}

impl<F: FnMut(f64) -> TickInput> InputSource for F {
    fn poll(&mut self, now_ms: f64) -> TickInput {
        self(now_ms)
    }
}

impl<F: FnMut(&FrameView<'_>)> RenderSink for F {
    fn render(&mut self, frame: &FrameView<'_>) {
        self(frame)
    }
}

impl<F: FnMut(u64, u64)> ScoreSink for F {
    fn scores_changed(&mut self, score: u64, best: u64) {
        self(score, best)
    }
}

impl FieldGeometry for Field {
    fn size(&self) -> Field {
        *self
    }
}

/// Geometry shared with the host, which updates it on resize
impl FieldGeometry for Rc<Cell<Field>> {
    fn size(&self) -> Field {
        self.get()
    }
}

/// Read-only view handed to the render sink after each tick
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub field: Field,
    pub phase: GamePhase,
    pub score: u64,
    pub best_score: u64,
    pub danger_y: f32,
    pub next_rank: usize,
    pub bodies: &'a [Body],
    pub aiming: Option<&'a AimingBody>,
    /// Events produced since the previous frame
    pub events: &'a [GameEvent],
}

/// Owned, serializable copy of a [`FrameView`]
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub field: Field,
    pub phase: GamePhase,
    pub score: u64,
    pub best_score: u64,
    pub danger_y: f32,
    pub next_rank: usize,
    pub bodies: Vec<Body>,
    pub aiming: Option<AimingBody>,
    pub events: Vec<GameEvent>,
}

impl FrameView<'_> {
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            field: self.field,
            phase: self.phase,
            score: self.score,
            best_score: self.best_score,
            danger_y: self.danger_y,
            next_rank: self.next_rank,
            bodies: self.bodies.to_vec(),
            aiming: self.aiming.cloned(),
            events: self.events.to_vec(),
        }
    }
}

/// Everything the session needs from its host
pub struct Collaborators {
    pub input: Box<dyn InputSource>,
    pub render: Box<dyn RenderSink>,
    pub scores: Box<dyn ScoreSink>,
    pub store: Box<dyn BestScoreStore>,
    pub geometry: Box<dyn FieldGeometry>,
}

/// One game instance bound to its collaborators
pub struct Session {
    state: GameState,
    input: Box<dyn InputSource>,
    render: Box<dyn RenderSink>,
    scores: Box<dyn ScoreSink>,
    store: Box<dyn BestScoreStore>,
    geometry: Box<dyn FieldGeometry>,
    /// Last (score, best) pushed to the score sink
    reported: Option<(u64, u64)>,
    /// Best score the store last accepted (or was asked to accept)
    persisted_best: u64,
}

impl Session {
    pub fn new(tuning: Tuning, ranks: RankTable, seed: u64, parts: Collaborators) -> Self {
        let field = parts.geometry.size();
        let mut session = Self {
            state: GameState::new(tuning, ranks, field, seed),
            input: parts.input,
            render: parts.render,
            scores: parts.scores,
            store: parts.store,
            geometry: parts.geometry,
            reported: None,
            persisted_best: 0,
        };
        session.load_best();
        session.report_scores();
        session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct state access for hosts that script the well (tests, demos)
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == GamePhase::Playing
    }

    /// Idle -> Playing. Returns true if the game started.
    pub fn start(&mut self) -> bool {
        if self.state.phase != GamePhase::Idle {
            return false;
        }
        self.sync_geometry();
        self.load_best();
        let started = self.state.start();
        if started {
            log::info!("Game started (best {})", self.state.best_score);
            self.report_scores();
        }
        started
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.state.pause();
        if paused {
            log::info!("Paused");
        }
        paused
    }

    pub fn resume(&mut self) -> bool {
        let resumed = self.state.resume();
        if resumed {
            log::info!("Resumed");
        }
        resumed
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.pause() || self.resume()
    }

    /// Any phase -> Idle with an empty well; does not auto-start
    pub fn restart(&mut self) {
        self.persist_best();
        self.state.restart();
        log::info!("Restarted");
        self.report_scores();
        self.draw(&[]);
    }

    /// Run one animation frame; returns whether another frame should be
    /// scheduled
    pub fn frame(&mut self, now_ms: f64) -> bool {
        self.sync_geometry();

        let input = self.input.poll(now_ms);
        tick(&mut self.state, &input);

        let events = std::mem::take(&mut self.state.events);
        for event in &events {
            match event {
                GameEvent::Merged { rank, points, .. } => {
                    log::debug!("Merge to rank {rank} (+{points})");
                }
                GameEvent::NewBest { best } => log::debug!("New best score {best}"),
                GameEvent::GameOver { score } => log::info!("Game over with score {score}"),
                GameEvent::Dropped { .. } => {}
            }
        }

        self.persist_best();
        self.report_scores();
        self.draw(&events);

        self.is_running()
    }

    /// Render the current state without advancing it
    pub fn redraw(&mut self) {
        self.sync_geometry();
        self.draw(&[]);
    }

    fn draw(&mut self, events: &[GameEvent]) {
        let state = &self.state;
        let view = FrameView {
            field: state.field,
            phase: state.phase,
            score: state.score,
            best_score: state.best_score,
            danger_y: state.danger_y(),
            next_rank: state.next_rank,
            bodies: &state.bodies,
            aiming: state.aiming.as_ref(),
            events,
        };
        self.render.render(&view);
    }

    fn sync_geometry(&mut self) {
        let field = self.geometry.size();
        if field != self.state.field {
            self.state.resize(field);
        }
    }

    fn load_best(&mut self) {
        match self.store.load_best() {
            Ok(best) => {
                self.state.best_score = self.state.best_score.max(best);
                self.persisted_best = self.persisted_best.max(best);
            }
            Err(e) => log::warn!("Could not load best score: {e}"),
        }
    }

    /// Fire-and-forget write whenever the best score went up
    fn persist_best(&mut self) {
        let best = self.state.best_score;
        if best <= self.persisted_best {
            return;
        }
        self.persisted_best = best;
        if let Err(e) = self.store.save_best(best) {
            log::warn!("Could not save best score: {e}");
        }
    }

    fn report_scores(&mut self) {
        let current = (self.state.score, self.state.best_score);
        if self.reported != Some(current) {
            self.reported = Some(current);
            self.scores.scores_changed(current.0, current.1);
        }
    }
}
