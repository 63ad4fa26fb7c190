use std::sync::mpsc;
use std::time::Duration;

use steer::game::Game;
use steer::runtime::{AppEvent, FixedTicker, ManualScheduler, Runner, TestEventSource};
use steer::session::{Mode, RunState, SessionConfig, Settings};
use steer::signal::TargetFunction;

fn game(mode: Mode, target_function: TargetFunction) -> Game<ManualScheduler> {
    Game::new(
        Settings::default(),
        SessionConfig {
            mode,
            target_function,
        },
        ManualScheduler::new(),
    )
}

// Headless integration using the internal runtime without a TTY.
// Timer events travel through the same Runner/TestEventSource path the TUI uses.
#[test]
fn headless_auto_run_times_out_after_300_ticks() {
    // Arrange
    let mut game = game(Mode::ClosedLoopAuto, TargetFunction::Sine);
    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    game.start_stop();
    let id = game.loop_timer().expect("auto mode runs immediately");
    // more timer events than the run can consume
    for _ in 0..400u32 {
        tx.send(AppEvent::Timer(id)).unwrap();
    }

    // Act
    let mut executed = 0u32;
    for _ in 0..400u32 {
        if let AppEvent::Timer(fired) = runner.step() {
            let before = game.clock().ticks();
            game.on_timer(fired);
            if game.clock().ticks() > before {
                executed += 1;
            }
        }
    }

    // Assert
    assert_eq!(executed, 300);
    assert_eq!(game.run_state(), RunState::Finished);
    assert_eq!(game.elapsed(), 15.0);
    let snapshot = game.snapshot();
    assert_eq!(snapshot.target.len(), 200);
    assert_eq!(snapshot.output.len(), 200);
    assert!(snapshot.target.iter().all(Option::is_some));
    assert_eq!(
        snapshot.target.last().copied().flatten(),
        Some(TargetFunction::Sine.value(299.0 * 0.05))
    );
    // the PID keeps a PT2 within the margin of the slow sine for the whole run
    assert_eq!(game.score(), 300);
    assert!(game.scheduler().active().is_empty());
}

#[test]
fn headless_open_loop_target_equals_input() {
    let mut game = game(Mode::OpenLoop, TargetFunction::Sine);
    assert!(game.set_user_input(50));
    game.start_stop();
    while let Some(id) = game.countdown_timer() {
        game.on_timer(id);
    }
    let id = game.loop_timer().unwrap();
    while game.is_running() {
        game.on_timer(id);
        let sample = game.last_sample().unwrap();
        assert_eq!(sample.target, 0.5);
        assert_eq!(sample.input, 0.5);
        assert_eq!(game.score(), 0);
    }
    assert!(game.is_finished());
    assert_eq!(game.summary().unwrap().scored_ticks, 0);
}

#[test]
fn headless_reset_while_running_clears_everything() {
    let mut game = game(Mode::HumanInLoop, TargetFunction::Sine);
    game.set_user_input(20);
    game.start_stop();
    while let Some(id) = game.countdown_timer() {
        game.on_timer(id);
    }
    let id = game.loop_timer().unwrap();
    for _ in 0..120 {
        game.on_timer(id);
    }
    assert!(game.score() > 0);

    game.reset();

    assert_eq!(game.score(), 0);
    assert_eq!(game.elapsed(), 0.0);
    assert_eq!(game.user_input(), 0);
    assert_eq!(game.plant_output(), 0.0);
    assert_eq!(game.run_state(), RunState::Idle);
    assert!(!game.is_finished());
    let snapshot = game.snapshot();
    assert_eq!(snapshot.target, vec![None; 200]);
    assert_eq!(snapshot.output, vec![None; 200]);

    // the tick that was already queued when reset happened
    assert!(!game.on_timer(id));
    assert_eq!(game.elapsed(), 0.0);
    assert_eq!(game.snapshot().target, vec![None; 200]);
}
