//! Melon Merge entry point
//!
//! The browser build is driven from JS through `melon_merge::web`. Natively
//! this runs a headless autoplay game and logs how it went.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use melon_merge::consts::{FIELD_HEIGHT, FIELD_WIDTH, FRAME_MS};
    use melon_merge::persistence::MemoryStore;
    use melon_merge::sim::{Field, RankTable, TickInput};
    use melon_merge::{Collaborators, FrameView, Session, Tuning};

    env_logger::init();
    log::info!("Melon Merge (native) starting...");

    const MAX_FRAMES: u32 = 60 * 60 * 5;

    let merges = Rc::new(RefCell::new(0u32));
    let merges_seen = merges.clone();

    let parts = Collaborators {
        // Sweep the aim back and forth and try to drop every half second
        input: Box::new(|now_ms: f64| {
            let frame = (now_ms / FRAME_MS).round() as u64;
            let phase = (frame % 240) as f32 / 240.0;
            let sweep = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
            TickInput {
                aim_x: Some(20.0 + sweep * (FIELD_WIDTH - 40.0)),
                drop: frame % 30 == 0,
                now_ms,
            }
        }),
        render: Box::new(move |frame: &FrameView<'_>| {
            let merged = frame
                .events
                .iter()
                .filter(|e| matches!(e, melon_merge::sim::GameEvent::Merged { .. }))
                .count() as u32;
            *merges_seen.borrow_mut() += merged;
        }),
        scores: Box::new(|score: u64, best: u64| log::debug!("score {score} best {best}")),
        store: Box::new(MemoryStore::new()),
        geometry: Box::new(Field::new(FIELD_WIDTH, FIELD_HEIGHT)),
    };

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut session = Session::new(Tuning::load(), RankTable::default(), seed, parts);
    session.start();

    let mut frames = 0;
    while frames < MAX_FRAMES && session.frame(frames as f64 * FRAME_MS) {
        frames += 1;
    }

    let state = session.state();
    let top_rank = state.bodies.iter().map(|b| b.rank).max().unwrap_or(0);
    println!(
        "seed {seed}: {:?} after {frames} frames, score {}, {} merges, {} bodies, top rank {} ({})",
        state.phase,
        state.score,
        merges.borrow(),
        state.bodies.len(),
        top_rank,
        state.ranks.get(top_rank).map(|r| r.tag.as_str()).unwrap_or("?"),
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::wasm_start, this is just to satisfy the compiler
}
