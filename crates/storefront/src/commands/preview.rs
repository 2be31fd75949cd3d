//! `storefront preview`: run slide rotation and print what a visitor would see.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use storefront_core::{DeckSource, RotationCommand, RotationState};

use crate::cli::{GlobalOpts, OutputFormat, PreviewArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct PreviewEvent<'a> {
    elapsed_ms: u64,
    #[serde(flatten)]
    state: &'a RotationState,
}

/// A new slide, mode, or deck size; typed-text progress alone is not.
fn is_transition(prev: &RotationState, next: &RotationState) -> bool {
    prev.active_index != next.active_index
        || prev.advances != next.advances
        || prev.mode != next.mode
        || prev.slide_count != next.slide_count
}

fn slide_line(state: &RotationState) -> String {
    let position = match state.active_index {
        Some(index) => format!("{}/{}", index + 1, state.slide_count),
        None => format!("-/{}", state.slide_count),
    };
    let id = state.slide_id.as_deref().unwrap_or("(none)");
    let animation = state
        .animation
        .map_or_else(String::new, |a| format!(" {a}"));
    format!("slide {position} {id} [{}{animation}]", state.mode)
}

fn frame_line(state: &RotationState) -> Option<String> {
    state
        .typed
        .as_ref()
        .map(|frame| format!("  typed #{} {:?} ({})", frame.phrase_index, frame.text, frame.phase))
}

fn render_event(
    started: Instant,
    state: &RotationState,
    transition: bool,
    frames: bool,
    format: OutputFormat,
) -> Result<Option<String>, CliError> {
    let elapsed = started.elapsed();
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            let event = PreviewEvent {
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                state,
            };
            let rendered = if format == OutputFormat::Yaml {
                format!("---\n{}", output::render_yaml(&event)?)
            } else {
                output::render_json_compact(&event)?
            };
            Ok(Some(rendered))
        }
        OutputFormat::Plain => Ok(transition.then(|| state.slide_id.clone().unwrap_or_default())),
        OutputFormat::Table => {
            let stamp = format!("[{:>8.2}s]", elapsed.as_secs_f64());
            let line = if transition {
                Some(format!("{stamp} {}", slide_line(state)))
            } else if frames {
                frame_line(state).map(|f| format!("{stamp} {f}"))
            } else {
                None
            };
            Ok(line)
        }
    }
}

pub async fn handle(session: &Session, args: PreviewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let source = match args.deck {
        Some(pointer) => DeckSource::new(args.document, pointer),
        None => DeckSource::for_document(args.document).ok_or_else(|| CliError::Validation {
            field: "deck".into(),
            reason: format!(
                "document '{}' has no slide deck; pass --deck <pointer>",
                args.document
            ),
        })?,
    };

    if session.backend().is_offline() {
        session.load_cached(source.document)?;
    } else if args.live {
        session.start().await?;
    } else if let Err(e) = session.load_document(source.document).await {
        tracing::warn!(error = %e, "previewing without the remote document");
    }

    let handle = session.rotation(source)?;
    if let Some(breakpoint) = args.breakpoint {
        handle.send(RotationCommand::SetBreakpoint(breakpoint)).await?;
    }

    let started = Instant::now();
    let mut states = handle.subscribe();
    let mut last = states.borrow_and_update().clone();
    if let Some(line) = render_event(started, &last, true, args.frames, global.output)? {
        output::print_output(&line, global.quiet);
    }

    let deadline = tokio::time::sleep(args.duration);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            () = &mut deadline => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                let transition = is_transition(&last, &state);
                if let Some(line) = render_event(started, &state, transition, args.frames, global.output)? {
                    output::print_output(&line, global.quiet);
                }
                last = state;
            }
        }
    }

    let advances = handle.state().advances;
    handle.shutdown().await;
    if !global.quiet && global.output == OutputFormat::Table {
        let elapsed = started.elapsed();
        let rounded = Duration::from_secs(elapsed.as_secs())
            + Duration::from_millis(u64::from(elapsed.subsec_millis()));
        eprintln!("{advances} advance(s) in {}", humantime::format_duration(rounded));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(index: Option<usize>, advances: u64) -> RotationState {
        RotationState {
            active_index: index,
            previous_index: None,
            mode: storefront_core::RotationMode::AutoAdvancing,
            slide_id: index.map(|i| format!("hero-{i}")),
            slide_count: 3,
            typing_cycle_active: false,
            typed: None,
            animation: None,
            advances,
        }
    }

    #[test]
    fn typed_frames_alone_are_not_transitions() {
        let a = state(Some(0), 0);
        let mut b = a.clone();
        b.typing_cycle_active = true;
        assert!(!is_transition(&a, &b));
        assert!(is_transition(&a, &state(Some(1), 1)));
    }

    #[test]
    fn slide_line_shows_position_and_mode() {
        assert_eq!(slide_line(&state(Some(1), 1)), "slide 2/3 hero-1 [auto_advancing]");
        assert_eq!(slide_line(&state(None, 0)), "slide -/3 (none) [auto_advancing]");
    }
}
