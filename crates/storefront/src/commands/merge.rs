//! `storefront merge`: reconcile files without touching the store.

use storefront_core::merge_layers;

use crate::cli::{GlobalOpts, MergeArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(args: &MergeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let defaults = util::read_json_file(&args.defaults)?;
    let overrides = args
        .overrides
        .iter()
        .map(|path| util::read_json_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = merge_layers(&defaults, &overrides);
    tracing::debug!(
        layers = overrides.len(),
        discarded = outcome.discarded.len(),
        "merged override files"
    );

    if args.show_discarded {
        for path in &outcome.discarded {
            eprintln!("discarded: {path}");
        }
    }

    let out = output::render_single(
        global.output,
        &outcome.value,
        |v| output::render_json_pretty(v),
        ToString::to_string,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
