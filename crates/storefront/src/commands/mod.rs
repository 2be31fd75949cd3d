//! Command dispatch: bridges CLI args -> storefront calls -> output formatting.

pub mod config_cmd;
pub mod defaults;
pub mod merge;
pub mod preview;
pub mod show;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let result = match cmd {
        Command::Show(args) => show::handle(session, args, global).await,
        Command::Watch(args) => watch::handle(session, args, global).await,
        Command::Preview(args) => preview::handle(session, args, global).await,
        // Local commands are handled before a session exists
        Command::Merge(_) | Command::Defaults(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Internal("command does not use the document store".into()))
        }
    };
    session.shutdown().await;
    result
}
