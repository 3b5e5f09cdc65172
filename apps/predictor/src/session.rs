//! Interactive terminal session: line commands in, controller notifications out.

use std::sync::Arc;

use anyhow::{Context, Result};
use client_core::{
    present, InputState, InputStateHolder, SubmissionController, SubmissionEvent, SubmissionState,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    sync::broadcast::error::RecvError,
    task::JoinHandle,
};
use tracing::warn;

pub const HELP: &str = "commands: throttle <0-100> | gear <0-5, 0 = neutral> | predict | status | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Throttle(f64),
    Gear(i64),
    Predict,
    Status,
    Help,
    Quit,
}

/// Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments for '{verb}'; {HELP}"));
    }

    let command = match (verb.to_ascii_lowercase().as_str(), arg) {
        ("throttle" | "t", Some(value)) => value
            .trim_end_matches('%')
            .parse::<f64>()
            .ok()
            .filter(|v| !v.is_nan())
            .map(SessionCommand::Throttle)
            .ok_or_else(|| format!("throttle expects a number, got '{value}'"))?,
        ("gear" | "g", Some(value)) => {
            let gear = if value.eq_ignore_ascii_case("n") {
                Ok(0)
            } else {
                value.parse::<i64>()
            };
            gear.map(SessionCommand::Gear)
                .map_err(|_| format!("gear expects 0-5 or N, got '{value}'"))?
        }
        ("throttle" | "t" | "gear" | "g", None) => {
            return Err(format!("'{verb}' needs a value; {HELP}"))
        }
        ("predict" | "p", None) => SessionCommand::Predict,
        ("status" | "s", None) => SessionCommand::Status,
        ("help" | "h" | "?", None) => SessionCommand::Help,
        ("quit" | "q" | "exit", None) => SessionCommand::Quit,
        _ => return Err(format!("unknown command '{}'; {HELP}", line.trim())),
    };
    Ok(Some(command))
}

pub fn gear_label(gear: u8) -> String {
    if gear == 0 {
        "N".to_string()
    } else {
        gear.to_string()
    }
}

pub fn describe_input(input: &InputState) -> String {
    format!(
        "throttle {}% gear {}",
        input.throttle_position(),
        gear_label(input.gear())
    )
}

pub fn format_state(state: &SubmissionState) -> String {
    match state {
        SubmissionState::Idle => "no prediction yet".to_string(),
        SubmissionState::Pending => "predicting...".to_string(),
        SubmissionState::Success(result) => present(result)
            .rows()
            .iter()
            .map(|(label, value)| format!("  {label:<22} {value}"))
            .collect::<Vec<_>>()
            .join("\n"),
        SubmissionState::Failure(err) => format!("error: {err}"),
    }
}

pub fn format_event(event: &SubmissionEvent) -> String {
    match &event.state {
        SubmissionState::Pending => format!(
            "[#{}] predicting for {}...",
            event.sequence,
            describe_input(&event.input)
        ),
        SubmissionState::Success(_) => format!(
            "[#{}] predictions for {}:\n{}",
            event.sequence,
            describe_input(&event.input),
            format_state(&event.state)
        ),
        other => format!("[#{}] {}", event.sequence, format_state(other)),
    }
}

pub async fn run(controller: Arc<SubmissionController>, holder: InputStateHolder) -> Result<()> {
    drive(
        controller,
        holder,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Reads commands from `input` until `quit` or end of input, writing command
/// replies and controller notifications to `out`. Returns once the last
/// submission has settled and its notifications are written.
pub async fn drive<R, W>(
    controller: Arc<SubmissionController>,
    mut holder: InputStateHolder,
    input: R,
    mut out: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = controller.subscribe();

    say(&mut out, HELP).await?;
    say(
        &mut out,
        &format!("current input: {}", describe_input(&holder.current())),
    )
    .await?;

    let mut in_flight: Option<JoinHandle<SubmissionState>> = None;
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => say(&mut out, &format_event(&event)).await?,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dropped submission notifications")
                    }
                    Err(RecvError::Closed) => break,
                }
                continue;
            }
            line = lines.next_line() => line.context("failed to read commands")?,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                say(&mut out, &message).await?;
                continue;
            }
        };

        match command {
            SessionCommand::Throttle(value) => {
                let input = holder.set_throttle(value);
                say(&mut out, &format!("input: {}", describe_input(&input))).await?;
            }
            SessionCommand::Gear(value) => {
                let input = holder.set_gear(value);
                say(&mut out, &format!("input: {}", describe_input(&input))).await?;
            }
            SessionCommand::Predict => {
                let spawned_running = in_flight
                    .as_ref()
                    .is_some_and(|handle| !handle.is_finished());
                if spawned_running || controller.state().is_pending() {
                    say(&mut out, "a prediction is already in flight").await?;
                    continue;
                }
                let controller = controller.clone();
                let input = holder.current();
                in_flight = Some(tokio::spawn(async move { controller.submit(input).await }));
            }
            SessionCommand::Status => {
                say(
                    &mut out,
                    &format!("input: {}", describe_input(&holder.current())),
                )
                .await?;
                say(&mut out, &format_state(&controller.state())).await?;
            }
            SessionCommand::Help => say(&mut out, HELP).await?,
            SessionCommand::Quit => break,
        }
    }

    if let Some(handle) = in_flight {
        handle.await.context("prediction task failed")?;
    }
    // Dropping the last controller handle closes the channel once the
    // remaining notifications are read.
    drop(controller);
    loop {
        match events.recv().await {
            Ok(event) => say(&mut out, &format_event(&event)).await?,
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped submission notifications"),
            Err(RecvError::Closed) => break,
        }
    }
    Ok(())
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .await
        .context("failed to write session output")?;
    out.write_all(b"\n")
        .await
        .context("failed to write session output")?;
    out.flush().await.context("failed to write session output")
}
