//! Browser bindings
//!
//! JS owns the canvas drawing and the DOM buttons. It forwards pointer and
//! keyboard input here, calls `frame()` from `requestAnimationFrame` until it
//! returns false, and draws from the JSON `snapshot()`.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::persistence::LocalStorageStore;
use crate::session::{
    Collaborators, FieldGeometry, FrameView, InputSource, RenderSink, ScoreSink, Session,
};
use crate::sim::{Field, RankTable, TickInput};
use crate::tuning::Tuning;

/// Input gathered by event listeners between two frames
#[derive(Debug, Default)]
struct PendingInput {
    aim_x: Option<f32>,
    drop: bool,
}

struct WebInput(Rc<RefCell<PendingInput>>);

impl InputSource for WebInput {
    fn poll(&mut self, now_ms: f64) -> TickInput {
        let mut pending = self.0.borrow_mut();
        TickInput {
            aim_x: pending.aim_x.take(),
            drop: std::mem::take(&mut pending.drop),
            now_ms,
        }
    }
}

/// Keeps the latest frame as JSON for the JS renderer
struct SnapshotSink(Rc<RefCell<String>>);

impl RenderSink for SnapshotSink {
    fn render(&mut self, frame: &FrameView<'_>) {
        match serde_json::to_string(&frame.to_snapshot()) {
            Ok(json) => *self.0.borrow_mut() = json,
            Err(e) => log::warn!("Snapshot serialization failed: {e}"),
        }
    }
}

/// Writes the score counters into `#score` / `#bestScore`
struct DomScoreSink;

impl ScoreSink for DomScoreSink {
    fn scores_changed(&mut self, score: u64, best: u64) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id("score") {
            el.set_text_content(Some(&score.to_string()));
        }
        if let Some(el) = document.get_element_by_id("bestScore") {
            el.set_text_content(Some(&best.to_string()));
        }
    }
}

/// Field size read from the canvas backing store
struct CanvasGeometry(HtmlCanvasElement);

impl FieldGeometry for CanvasGeometry {
    fn size(&self) -> Field {
        Field::new(self.0.width() as f32, self.0.height() as f32)
    }
}

/// Game handle exported to JS
#[wasm_bindgen]
pub struct WebGame {
    session: Session,
    input: Rc<RefCell<PendingInput>>,
    snapshot: Rc<RefCell<String>>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebGame, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("canvas not found"))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("element is not a canvas"))?;

        let input = Rc::new(RefCell::new(PendingInput::default()));
        let snapshot = Rc::new(RefCell::new(String::new()));
        let parts = Collaborators {
            input: Box::new(WebInput(input.clone())),
            render: Box::new(SnapshotSink(snapshot.clone())),
            scores: Box::new(DomScoreSink),
            store: Box::new(LocalStorageStore),
            geometry: Box::new(CanvasGeometry(canvas)),
        };

        let seed = js_sys::Date::now() as u64;
        let mut session = Session::new(Tuning::load(), RankTable::default(), seed, parts);
        session.redraw();
        log::info!("Game created with seed {seed}");

        Ok(WebGame {
            session,
            input,
            snapshot,
        })
    }

    /// Returns true if the caller should begin the frame loop
    pub fn start(&mut self) -> bool {
        let started = self.session.start();
        self.session.redraw();
        started
    }

    /// Returns true if the game is now running (caller restarts the loop)
    pub fn toggle_pause(&mut self) -> bool {
        self.session.toggle_pause();
        self.session.is_running()
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    pub fn set_aim(&mut self, x: f32) {
        self.input.borrow_mut().aim_x = Some(x);
    }

    pub fn request_drop(&mut self) {
        self.input.borrow_mut().drop = true;
    }

    /// Advance one frame; false means stop scheduling
    pub fn frame(&mut self, now_ms: f64) -> bool {
        self.session.frame(now_ms)
    }

    /// Latest frame as JSON
    pub fn snapshot(&self) -> String {
        self.snapshot.borrow().clone()
    }

    /// Rank table as JSON (tags, colors, radius scales)
    pub fn ranks(&self) -> String {
        serde_json::to_string(&self.session.state().ranks).unwrap_or_default()
    }
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("Melon Merge starting...");
}
