// ── Async rotation driver ──
//
// Runs a RotationController on a tokio task. Each loop iteration builds a
// single sleep for the controller's earliest deadline, so a superseded
// deadline is simply never awaited again.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::controller::{RotationController, RotationSettings, RotationState};
use crate::document::DocumentKind;
use crate::effective::EffectiveConfig;
use crate::error::CoreError;
use crate::model::{Breakpoint, SlideDeck};
use crate::stream::ConfigStream;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Input events from the render layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationCommand {
    Next,
    /// Horizontal swipe in pixels; sign is ignored.
    Swipe { distance: f64 },
    Close,
    Pause,
    Resume,
    OverlayOpened,
    OverlayClosed,
    SetBreakpoint(Breakpoint),
}

/// Where a slide deck lives inside a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSource {
    pub document: DocumentKind,
    /// JSON pointer to the deck object; `""` is the document root.
    pub pointer: String,
}

impl DeckSource {
    pub fn new(document: DocumentKind, pointer: impl Into<String>) -> Self {
        Self {
            document,
            pointer: pointer.into(),
        }
    }

    pub fn heroes() -> Self {
        Self::new(DocumentKind::Heroes, "")
    }

    pub fn banners() -> Self {
        Self::new(DocumentKind::Banners, "")
    }

    /// The product carousel inside the layout document.
    pub fn carousel() -> Self {
        Self::new(DocumentKind::Layout, "/carousel")
    }

    /// The default deck for a document kind, if it has one.
    pub fn for_document(kind: DocumentKind) -> Option<Self> {
        match kind {
            DocumentKind::Heroes => Some(Self::heroes()),
            DocumentKind::Banners => Some(Self::banners()),
            DocumentKind::Layout => Some(Self::carousel()),
            DocumentKind::Theme => None,
        }
    }

    pub fn deck(&self, config: &EffectiveConfig) -> SlideDeck {
        config.deck(&self.pointer)
    }
}

/// Handle to a running rotation task.
pub struct RotationHandle {
    commands: mpsc::Sender<RotationCommand>,
    state: watch::Receiver<RotationState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RotationHandle {
    /// Start driving the deck at `source` from `stream`'s snapshots.
    ///
    /// Config updates reload the deck; cancelling `cancel` (or calling
    /// [`shutdown`](Self::shutdown)) stops the task and every pending timer.
    pub fn spawn(
        stream: ConfigStream,
        source: DeckSource,
        settings: RotationSettings,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError> {
        if stream.kind() != source.document {
            return Err(CoreError::Internal(format!(
                "deck source targets '{}' but the stream follows '{}'",
                source.document,
                stream.kind()
            )));
        }

        let deck = source.deck(stream.current());
        let controller = RotationController::with_deck(settings, &deck, Instant::now());
        let (state_tx, state_rx) = watch::channel(controller.state());
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        info!(document = %source.document, pointer = %source.pointer, "starting rotation");
        let task = tokio::spawn(rotation_task(
            controller,
            stream,
            source,
            cmd_rx,
            state_tx,
            cancel.clone(),
        ));

        Ok(Self {
            commands: cmd_tx,
            state: state_rx,
            cancel,
            task,
        })
    }

    pub async fn send(&self, command: RotationCommand) -> Result<(), CoreError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::RotationClosed)
    }

    /// Latest published state.
    pub fn state(&self) -> RotationState {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<RotationState> {
        self.state.clone()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

async fn rotation_task(
    mut controller: RotationController,
    mut stream: ConfigStream,
    source: DeckSource,
    mut commands: mpsc::Receiver<RotationCommand>,
    state: watch::Sender<RotationState>,
    cancel: CancellationToken,
) {
    let mut config_open = true;

    loop {
        let deadline = controller.next_deadline();
        let timer = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("rotation handle dropped");
                    break;
                };
                apply(&mut controller, command, Instant::now());
            }
            snapshot = stream.changed(), if config_open => {
                match snapshot {
                    Some(config) => reload(&mut controller, &source, &config),
                    None => {
                        debug!("config store closed, keeping last deck");
                        config_open = false;
                    }
                }
            }
            () = timer => {
                controller.on_timer(Instant::now());
            }
        }

        let next = controller.state();
        state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    debug!(document = %source.document, "rotation stopped");
}

fn apply(controller: &mut RotationController, command: RotationCommand, now: Instant) {
    debug!(?command, "rotation command");
    match command {
        RotationCommand::Next | RotationCommand::Close => {
            controller.next(now);
        }
        RotationCommand::Swipe { distance } => {
            controller.swipe(distance, now);
        }
        RotationCommand::Pause => controller.pause(),
        RotationCommand::Resume => controller.resume(now),
        RotationCommand::OverlayOpened => controller.set_overlay(true),
        RotationCommand::OverlayClosed => controller.set_overlay(false),
        RotationCommand::SetBreakpoint(breakpoint) => controller.set_breakpoint(breakpoint),
    }
}

fn reload(controller: &mut RotationController, source: &DeckSource, config: &Arc<EffectiveConfig>) {
    debug!(revision = config.revision, "reloading slide deck");
    controller.set_deck(&source.deck(config), Instant::now());
}
