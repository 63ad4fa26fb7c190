//! Terminal-free session runs.
//!
//! Fires the timers of a [`ManualScheduler`] back into the game as fast as
//! possible, countdown first, until the run leaves `Running`.

use crate::game::{Game, RunSummary};
use crate::runtime::ManualScheduler;
use crate::session::{SessionConfig, Settings};

pub fn run_to_completion(game: &mut Game<ManualScheduler>) -> Option<RunSummary> {
    if game.run_state().is_settled() {
        game.start_stop();
    }
    loop {
        let next = game.countdown_timer().or_else(|| game.loop_timer());
        match next {
            Some(id) => {
                game.on_timer(id);
            }
            None => break,
        }
    }
    game.summary()
}

/// One complete run with a fixed slider position
pub fn run_session(settings: Settings, config: SessionConfig, user_input: i32) -> Option<RunSummary> {
    let mut game = Game::new(settings, config, ManualScheduler::new());
    game.set_user_input(user_input);
    run_to_completion(&mut game)
}

pub fn format_summary(config: &SessionConfig, settings: &Settings, summary: &RunSummary) -> String {
    let target = if config.mode.uses_target_function() {
        config.target_function.to_string()
    } else {
        "slider".to_string()
    };
    format!(
        "mode={} target={} plant={} ticks={} score={} hit_rate={:.1}%",
        summary.mode,
        target,
        settings.plant,
        summary.ticks,
        summary.score,
        summary.hit_rate()
    )
}
