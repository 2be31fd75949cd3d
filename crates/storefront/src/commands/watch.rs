//! `storefront watch`: follow a document's live feed.

use std::sync::Arc;

use storefront_core::{EffectiveConfig, SyncStatus};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util::ConfigView;

fn revision_line(
    config: &Arc<EffectiveConfig>,
    status: &SyncStatus,
    global: &GlobalOpts,
) -> Result<String, CliError> {
    let view = ConfigView::new(config, status, config.value());
    match global.output {
        // One JSON document per line so the output can be piped
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(&view),
        OutputFormat::Yaml => Ok(format!("---\n{}", output::render_yaml(&view)?)),
        OutputFormat::Plain => Ok(config.value().to_string()),
        OutputFormat::Table => {
            let color = output::should_color(global.color);
            Ok(format!(
                "rev {:>4}  {}  {}  {}",
                config.revision,
                config.merged_at.format("%H:%M:%S%.3f"),
                output::paint_origin(config.origin, color),
                config.value()
            ))
        }
    }
}

pub async fn handle(session: &Session, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let kind = args.document;
    if session.backend().is_offline() {
        session.load_cached(kind)?;
    } else {
        session.start().await?;
    }

    let mut configs = session.subscribe(kind)?;
    let mut statuses = session.subscribe_status(kind)?;
    let limit = args.count.unwrap_or(usize::MAX);

    let status = statuses.borrow_and_update().clone();
    output::print_output(&revision_line(&configs.latest(), &status, global)?, global.quiet);
    let mut printed = 1;

    while printed < limit {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            changed = configs.changed() => {
                let Some(config) = changed else { break };
                let status = statuses.borrow().clone();
                output::print_output(&revision_line(&config, &status, global)?, global.quiet);
                printed += 1;
            }
            changed = statuses.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = statuses.borrow_and_update().clone();
                if !global.quiet {
                    eprintln!("status: {}", output::paint_status(&status, output::should_color(global.color)));
                }
            }
        }
    }
    tracing::debug!(%kind, printed, "watch finished");
    Ok(())
}
