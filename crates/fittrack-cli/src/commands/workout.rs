//! Interactive workout session.
//!
//! Reads one command per line from stdin, prints every session event as a
//! JSON line on stdout and ticks the session on a fixed interval. Ctrl-C
//! and end of input are attempts to leave and go through the quit prompt.

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use clap::Subcommand;
use fittrack_core::{
    Config, Database, Event, Navigation, NoopWakeLock, SessionOptions, SessionOutcome,
    SystemClock, TemplateStore, WakeLockCoordinator, WorkoutSession, WorkoutStore,
    WorkoutTemplate,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::read_template_file;

#[derive(Subcommand)]
pub enum WorkoutAction {
    /// Start a workout from a stored template name or a template JSON file
    Start {
        /// Template name or path to a .json file
        template: String,
    },
}

pub fn run(action: WorkoutAction) -> Result<(), Box<dyn Error>> {
    match action {
        WorkoutAction::Start { template } => {
            let config = Config::load()?;
            let db = Database::open()?;
            let template = resolve_template(&db, &template)?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let outcome = runtime.block_on(drive(&template, &config));
            // A stdin read still pending would otherwise keep the runtime alive.
            runtime.shutdown_background();
            let outcome = outcome?;

            emit(&outcome.event)?;
            db.append_workout(&outcome.record)?;
            println!("{}", serde_json::to_string(&outcome.record)?);
        }
    }
    Ok(())
}

fn resolve_template(db: &Database, arg: &str) -> Result<WorkoutTemplate, Box<dyn Error>> {
    let path = Path::new(arg);
    if path.extension().is_some_and(|ext| ext == "json") || path.is_file() {
        return read_template_file(path);
    }
    match db.template(arg)? {
        Some(template) => Ok(template),
        None => Err(format!("no template named '{arg}'").into()),
    }
}

async fn drive(template: &WorkoutTemplate, config: &Config) -> Result<SessionOutcome, Box<dyn Error>> {
    let options = SessionOptions {
        config: config.session.clone(),
        clock: Box::new(SystemClock),
        wake_lock: WakeLockCoordinator::new(Box::new(NoopWakeLock), &config.wake_lock),
    };
    let mut session = WorkoutSession::start(template, options)?;
    emit(&session.started_event())?;
    emit(&session.snapshot())?;

    let step = config.session.rest_adjust_step_secs;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(config.session.tick_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => emit_all(&session.tick())?,
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Some(outcome) = handle_line(&mut session, &line, step)? {
                        return Ok(outcome);
                    }
                }
                None => {
                    // Nobody is left to answer the prompt.
                    debug!("input closed, leaving workout");
                    navigate_away(&mut session)?;
                    return match session.confirm_quit() {
                        Some(outcome) => Ok(outcome),
                        None => Err("session ended without a record".into()),
                    };
                }
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                navigate_away(&mut session)?;
            }
        }
    }
}

fn navigate_away(session: &mut WorkoutSession) -> Result<(), Box<dyn Error>> {
    match session.intercept_navigation() {
        Navigation::Blocked { events } => emit_all(&events),
        Navigation::Allowed => Ok(()),
    }
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Toggle(usize),
    Next,
    Goto(usize),
    Timer(usize),
    Rest(i64),
    Skip,
    Status,
    Complete,
    Quit,
    Yes,
    No,
}

fn parse_input(line: &str, step: u64) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let input = match command.to_ascii_lowercase().as_str() {
        "done" | "toggle" => Input::Toggle(exercise_number(arg)?),
        "next" => Input::Next,
        "goto" => Input::Goto(exercise_number(arg)?),
        "timer" => Input::Timer(exercise_number(arg)?),
        "rest" => Input::Rest(rest_delta(arg, step)?),
        "skip" => Input::Skip,
        "status" => Input::Status,
        "complete" => Input::Complete,
        "quit" => Input::Quit,
        "yes" | "y" => Input::Yes,
        "no" | "n" => Input::No,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(input))
}

/// 1-based exercise number to 0-based index.
fn exercise_number(arg: Option<&str>) -> Result<usize, String> {
    let arg = arg.ok_or("missing exercise number")?;
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("exercise numbers start at 1, got '{arg}'")),
    }
}

/// `+15` / `-10`, or a bare sign for one configured step.
fn rest_delta(arg: Option<&str>, step: u64) -> Result<i64, String> {
    let arg = arg.ok_or("usage: rest +<secs> | rest -<secs>")?;
    let (negative, digits) = if let Some(rest) = arg.strip_prefix('+') {
        (false, rest)
    } else if let Some(rest) = arg.strip_prefix('-') {
        (true, rest)
    } else {
        return Err(format!("rest adjustment needs a sign, got '{arg}'"));
    };
    let secs = if digits.is_empty() {
        step
    } else if digits.bytes().all(|b| b.is_ascii_digit()) {
        digits
            .parse::<u64>()
            .map_err(|_| format!("rest adjustment out of range: '{arg}'"))?
    } else {
        return Err(format!("invalid rest adjustment '{arg}'"));
    };
    let secs = i64::try_from(secs).map_err(|_| format!("rest adjustment out of range: '{arg}'"))?;
    Ok(if negative { -secs } else { secs })
}

fn handle_line(
    session: &mut WorkoutSession,
    line: &str,
    step: u64,
) -> Result<Option<SessionOutcome>, Box<dyn Error>> {
    let input = match parse_input(line, step) {
        Ok(Some(input)) => input,
        Ok(None) => return Ok(None),
        Err(message) => {
            eprintln!("{message}");
            return Ok(None);
        }
    };
    debug!(?input, "user input");

    let events = match input {
        Input::Toggle(index) => match session.occurrence_at(index).cloned() {
            Some(occurrence) => session.toggle_complete(&occurrence),
            None => return no_such_exercise(index),
        },
        Input::Timer(index) => match session.occurrence_at(index).cloned() {
            Some(occurrence) => session.start_exercise_timer(&occurrence),
            None => return no_such_exercise(index),
        },
        Input::Next => session.next_exercise(),
        Input::Goto(index) => session.advance_to(index),
        Input::Rest(delta) => session.adjust_rest_time(delta),
        Input::Skip => session.skip_rest(),
        Input::Status => vec![session.snapshot()],
        Input::Complete => match session.complete() {
            Some(outcome) => return Ok(Some(outcome)),
            None => {
                eprintln!("cannot complete the workout right now");
                Vec::new()
            }
        },
        Input::Quit => session.request_quit(),
        Input::Yes => match session.confirm_quit() {
            Some(outcome) => return Ok(Some(outcome)),
            None => {
                eprintln!("nothing to confirm");
                Vec::new()
            }
        },
        Input::No => session.cancel_quit_prompt(),
    };
    emit_all(&events)?;
    Ok(None)
}

fn no_such_exercise(index: usize) -> Result<Option<SessionOutcome>, Box<dyn Error>> {
    eprintln!("no exercise {}", index + 1);
    Ok(None)
}

fn emit(event: &Event) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn emit_all(events: &[Event]) -> Result<(), Box<dyn Error>> {
    events.iter().try_for_each(emit)
}
