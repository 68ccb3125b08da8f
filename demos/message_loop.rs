use std::{error::Error, io::Write};

use log::info;
use rl_api::{
    env::{MessageState, MESSAGE},
    Action, Session, SessionConfig, State,
};

const NUM_EPISODES: u16 = 200;
const EPISODE_LEN: i64 = 10;

/// A user who likes a few messages and gets annoyed by more
fn reward(state: &MessageState, sent: bool) -> f64 {
    match (sent, state.messages()) {
        (true, n) if n < 3 => 1.0,
        (true, _) => -1.0,
        (false, _) => 0.0,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                buf.timestamp_seconds(),
                record.level(),
                record.module_path().unwrap_or_default(),
                record.args()
            )
        })
        .init();

    let dir = tempfile::tempdir()?;
    let config = SessionConfig {
        model_path: dir.path().join("q_learner.json"),
        ..Default::default()
    };
    let session = Session::from_config(&config, MessageState::default())?;

    for episode in 0..NUM_EPISODES {
        let mut total = 0.0;
        loop {
            let state = session.current_state();
            let action = session.select_action(None);
            let sent = action == Action::from(MESSAGE);
            let r = reward(&state, sent);
            total += r;
            let next = session.apply_feedback(&action, r, state.steps() + 1 >= EPISODE_LEN)?;
            if next.is_terminal() {
                break;
            }
        }
        session.reset_state();
        if episode % 50 == 0 {
            info!("Episode {episode}: total reward {total}");
        }
    }

    println!("{}", session.render_json()?);
    session.dump(&config.model_path)?;
    Ok(())
}
