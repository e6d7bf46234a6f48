use crate::error::LoaderError;

const DELIM_BEGIN_UP: &str = "--BEGIN MIGRATION UP--";
const DELIM_BEGIN_UP_NO_TX: &str = "--BEGIN MIGRATION UP NO TRANSACTION--";
const DELIM_END_UP: &str = "--END MIGRATION UP--";
const DELIM_BEGIN_DOWN: &str = "--BEGIN MIGRATION DOWN--";
const DELIM_BEGIN_DOWN_NO_TX: &str = "--BEGIN MIGRATION DOWN NO TRANSACTION--";
const DELIM_END_DOWN: &str = "--END MIGRATION DOWN--";

/// Parsed content of one migration file: an opaque forward action and an
/// opaque, possibly empty, reverse action, each with a flag saying whether
/// it may be wrapped in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub up: String,
    pub down: String,
    pub up_tx: bool,
    pub down_tx: bool,
}

impl MigrationScript {
    /// Whether this migration defines a reverse action at all.
    pub fn has_down(&self) -> bool {
        !self.down.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Up,
    Middle,
    Down,
    Finish,
}

/// Step through a migration file looking for an up block followed by a down
/// block. Lines outside the blocks are ignored. A delimiter out of order, or
/// a file that never completes the sequence, is rejected so that malformed
/// comments are not silently misinterpreted.
pub fn parse_script(name: &str, content: &str) -> Result<MigrationScript, LoaderError> {
    let mut script = MigrationScript {
        up: String::new(),
        down: String::new(),
        up_tx: true,
        down_tx: true,
    };
    let mut state = State::Start;

    for line in content.lines() {
        match line {
            DELIM_BEGIN_UP | DELIM_BEGIN_UP_NO_TX => {
                if state != State::Start {
                    return Err(LoaderError::invalid(name, "unexpected up begin delimiter"));
                }
                script.up_tx = line == DELIM_BEGIN_UP;
                state = State::Up;
            }
            DELIM_END_UP => {
                if state != State::Up {
                    return Err(LoaderError::invalid(name, "unexpected up end delimiter"));
                }
                state = State::Middle;
            }
            DELIM_BEGIN_DOWN | DELIM_BEGIN_DOWN_NO_TX => {
                if state != State::Middle {
                    return Err(LoaderError::invalid(name, "unexpected down begin delimiter"));
                }
                script.down_tx = line == DELIM_BEGIN_DOWN;
                state = State::Down;
            }
            DELIM_END_DOWN => {
                if state != State::Down {
                    return Err(LoaderError::invalid(name, "unexpected down end delimiter"));
                }
                state = State::Finish;
            }
            _ => match state {
                State::Up => {
                    script.up.push_str(line);
                    script.up.push('\n');
                }
                State::Down => {
                    script.down.push_str(line);
                    script.down.push('\n');
                }
                // content outside the delimited blocks is ignored
                _ => {}
            },
        }
    }

    if state != State::Finish {
        return Err(LoaderError::invalid(name, "missing or incomplete up/down blocks"));
    }

    Ok(script)
}
