//! `storefront show`: one cache-then-remote load of a document.

use std::sync::Arc;

use storefront_core::EffectiveConfig;

use crate::backend::StoreBackend;
use crate::cli::{GlobalOpts, ShowArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util::{self, ConfigView};

pub async fn handle(session: &Session, args: ShowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let kind = args.document;
    let loaded = match session.backend() {
        StoreBackend::Offline(_) => session.load_cached(kind),
        StoreBackend::Rest(_) => session.load_document(kind).await,
    };

    // A failed remote read still leaves a snapshot (defaults or cache) to show.
    let snapshot = match loaded {
        Ok(snapshot) => snapshot,
        Err(err) => {
            let Ok(snapshot) = session.snapshot(kind) else {
                return Err(err.into());
            };
            render(session, &snapshot, args.pointer.as_deref(), global)?;
            return Err(err.into());
        }
    };
    render(session, &snapshot, args.pointer.as_deref(), global)
}

fn render(
    session: &Session,
    snapshot: &Arc<EffectiveConfig>,
    pointer: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let status = session.status(snapshot.kind)?;
    let value = util::select(snapshot.value(), pointer)?;
    let view = ConfigView::new(snapshot, &status, value);
    let color = output::should_color(global.color);

    let out = output::render_single(
        global.output,
        &view,
        |v| v.detail(color),
        |v| v.value.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
