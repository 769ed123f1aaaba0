//! Async player runtime
//!
//! Hosts a [`PlaybackController`] on a single tokio task. Surface callbacks,
//! pointer input and host commands arrive over one channel and are handled
//! in order; timers are driven by sleeping until the controller's next
//! deadline. Nothing else touches the session, so no locks are needed.
//!
//! Store writes go to a separate writer task, so a slow or hung store never
//! holds up surface events, input or timers.

use crate::config::ControllerConfig;
use crate::controller::PlaybackController;
use crate::effects::{Effect, UiEvent};
use crate::gesture::{Intent, PointerEvent, Viewport};
use crate::resume::PromptAnswer;
use crate::store::{ProgressStore, ResumePreference, WatchProgress};
use crate::surface::{PlaybackSurface, SurfaceEvent};
use crate::types::*;
use crate::{Error, Result};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, instrument, trace, warn};

/// Upper bound for a single store read or write
const STORE_TIMEOUT: Duration = Duration::from_secs(3);
/// How long close waits for queued writes to reach the store
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

enum Command {
    Surface(SurfaceEvent),
    Pointer(PointerEvent),
    Intent(Intent),
    AnswerPrompt(PromptAnswer),
    SelectAudio(AudioSelection),
    SelectSubtitle(SubtitleSelection),
    SetViewport(Viewport),
    Background,
    Restart,
    ResumeLoaded {
        progress: Option<WatchProgress>,
        preference: ResumePreference,
    },
    Close(oneshot::Sender<()>),
}

/// Cloneable handle to a running player
///
/// Dropping every handle closes the session the same way [`PlayerHandle::close`] does.
#[derive(Clone)]
pub struct PlayerHandle {
    session_id: SessionId,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<PlaybackStatus>,
}

impl PlayerHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Latest published status
    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Forward a callback from the playback surface
    pub fn surface_event(&self, event: SurfaceEvent) -> Result<()> {
        self.send(Command::Surface(event))
    }

    pub fn pointer(&self, event: PointerEvent) -> Result<()> {
        self.send(Command::Pointer(event))
    }

    pub fn intent(&self, intent: Intent) -> Result<()> {
        self.send(Command::Intent(intent))
    }

    pub fn answer_prompt(&self, answer: PromptAnswer) -> Result<()> {
        self.send(Command::AnswerPrompt(answer))
    }

    pub fn select_audio(&self, selection: AudioSelection) -> Result<()> {
        self.send(Command::SelectAudio(selection))
    }

    pub fn select_subtitle(&self, selection: SubtitleSelection) -> Result<()> {
        self.send(Command::SelectSubtitle(selection))
    }

    pub fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.send(Command::SetViewport(viewport))
    }

    /// The app moved to the background
    pub fn background(&self) -> Result<()> {
        self.send(Command::Background)
    }

    pub fn restart(&self) -> Result<()> {
        self.send(Command::Restart)
    }

    /// Close the session and wait for the final save to finish
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn close(&self) -> Result<()> {
        let (done, finished) = oneshot::channel();
        self.send(Command::Close(done))?;
        finished.await.map_err(|_| Error::SessionClosed)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::SessionClosed)
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("session_id", &self.session_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

enum StoreWrite {
    Progress {
        key: ContentKey,
        progress: WatchProgress,
    },
    Preference(ResumePreference),
}

/// Applies store writes in the order the controller produced them
struct StoreWriter {
    store: ProgressStore,
    writes: mpsc::UnboundedReceiver<StoreWrite>,
}

impl StoreWriter {
    async fn run(mut self) {
        while let Some(write) = self.writes.recv().await {
            self.write(write).await;
        }
        debug!("Store writer drained");
    }

    async fn write(&self, write: StoreWrite) {
        match write {
            StoreWrite::Progress { key, progress } => {
                match timeout(STORE_TIMEOUT, self.store.save_progress(&key, &progress)).await {
                    Ok(Ok(true)) => debug!(%key, position = progress.current_time, "Progress saved"),
                    Ok(Ok(false)) => trace!(%key, "Progress without duration skipped"),
                    Ok(Err(err)) => warn!(code = err.error_code(), error = %err, "Progress save dropped"),
                    Err(_) => warn!(%key, "Progress save timed out, dropped"),
                }
            }
            StoreWrite::Preference(preference) => {
                match timeout(STORE_TIMEOUT, self.store.save_preference(preference)).await {
                    Ok(Ok(())) => debug!(%preference, "Resume preference saved"),
                    Ok(Err(err)) => warn!(code = err.error_code(), error = %err, "Preference save dropped"),
                    Err(_) => warn!(%preference, "Preference save timed out, dropped"),
                }
            }
        }
    }
}

/// Task owning the controller and the surface
pub struct PlayerRuntime {
    controller: PlaybackController,
    surface: Box<dyn PlaybackSurface>,
    writes: Option<mpsc::UnboundedSender<StoreWrite>>,
    writer: Option<JoinHandle<()>>,
    commands: mpsc::UnboundedReceiver<Command>,
    ui: mpsc::UnboundedSender<UiEvent>,
    status: watch::Sender<PlaybackStatus>,
    started: Instant,
}

impl PlayerRuntime {
    /// Open `request` on a new task
    ///
    /// Must be called from within a tokio runtime. Returns the control
    /// handle and the stream of UI events.
    #[instrument(skip_all, fields(content = %request.key()))]
    pub fn spawn(
        request: OpenRequest,
        config: ControllerConfig,
        viewport: Viewport,
        store: ProgressStore,
        surface: Box<dyn PlaybackSurface>,
    ) -> Result<(PlayerHandle, mpsc::UnboundedReceiver<UiEvent>)> {
        config.validate()?;

        let key = request.key();
        let controller = PlaybackController::new(request, config, viewport);
        let session_id = controller.session().id();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(controller.status());
        let (write_tx, write_rx) = mpsc::unbounded_channel();

        let writer = tokio::spawn(
            StoreWriter {
                store: store.clone(),
                writes: write_rx,
            }
            .run(),
        );

        let runtime = Self {
            controller,
            surface,
            writes: Some(write_tx),
            writer: Some(writer),
            commands: command_rx,
            ui: ui_tx,
            status: status_tx,
            started: Instant::now(),
        };
        tokio::spawn(runtime.run());

        // The lookup races the surface load; the controller buffers whichever
        // side finishes first.
        let lookup_tx = command_tx.clone();
        tokio::spawn(async move {
            let (progress, preference) = lookup_resume(&store, &key).await;
            if lookup_tx
                .send(Command::ResumeLoaded { progress, preference })
                .is_err()
            {
                debug!("Session closed before the resume lookup finished");
            }
        });

        info!(%session_id, "Player session spawned");
        let handle = PlayerHandle {
            session_id,
            commands: command_tx,
            status: status_rx,
        };
        Ok((handle, ui_rx))
    }

    async fn run(mut self) {
        let effects = self.controller.open(self.now());
        self.execute(effects);
        self.publish_status();

        loop {
            let deadline = self.controller.next_deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Close(done)) => {
                        self.shutdown().await;
                        let _ = done.send(());
                        return;
                    }
                    Some(command) => self.handle(command),
                    None => {
                        debug!("All player handles dropped");
                        self.shutdown().await;
                        return;
                    }
                },
                _ = sleep_until(self.started, deadline) => {
                    let effects = self.controller.advance(self.now());
                    self.execute(effects);
                }
            }
            self.publish_status();
        }
    }

    fn handle(&mut self, command: Command) {
        let now = self.now();
        let effects = match command {
            Command::Surface(event) => self.controller.surface_event(event, now),
            Command::Pointer(event) => self.controller.pointer(event, now),
            Command::Intent(intent) => self.controller.intent(intent, now),
            Command::AnswerPrompt(answer) => self.controller.answer_prompt(answer, now),
            Command::SelectAudio(selection) => self.controller.select_audio(selection, now),
            Command::SelectSubtitle(selection) => self.controller.select_subtitle(selection, now),
            Command::SetViewport(viewport) => {
                self.controller.set_viewport(viewport);
                Vec::new()
            }
            Command::Background => self.controller.enter_background(now),
            Command::Restart => self.controller.restart(now),
            Command::ResumeLoaded { progress, preference } => {
                self.controller
                    .resolve_resume(progress.as_ref(), preference, now)
            }
            Command::Close(_) => Vec::new(),
        };
        self.execute(effects);
    }

    async fn shutdown(&mut self) {
        let effects = self.controller.close(self.now());
        self.execute(effects);
        self.publish_status();
        self.commands.close();

        // Closing the queue lets the writer finish once the final save is through
        self.writes = None;
        if let Some(writer) = self.writer.take() {
            match timeout(FLUSH_TIMEOUT, writer).await {
                Ok(Ok(())) => debug!("Pending store writes flushed"),
                Ok(Err(err)) => warn!(error = %err, "Store writer failed"),
                Err(_) => warn!("Store writes still pending at close, abandoned"),
            }
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Surface(command) => {
                    trace!(?command, "Surface command");
                    self.surface.apply(&command);
                }
                Effect::Ui(event) => {
                    if self.ui.send(event).is_err() {
                        trace!("UI receiver dropped");
                    }
                }
                Effect::SaveProgress { key, progress } => {
                    self.queue_write(StoreWrite::Progress { key, progress });
                }
                Effect::SavePreference(preference) => {
                    self.queue_write(StoreWrite::Preference(preference));
                }
            }
        }
    }

    fn queue_write(&self, write: StoreWrite) {
        let queued = self
            .writes
            .as_ref()
            .is_some_and(|writes| writes.send(write).is_ok());
        if !queued {
            warn!("Store writer gone, write dropped");
        }
    }

    fn publish_status(&self) {
        let status = self.controller.status();
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started)
    }
}

async fn sleep_until(started: Instant, deadline: Option<Duration>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(started + deadline).await,
        None => std::future::pending().await,
    }
}

/// Read saved progress and the resume preference; failures fall back to
/// starting fresh and asking.
async fn lookup_resume(
    store: &ProgressStore,
    key: &ContentKey,
) -> (Option<WatchProgress>, ResumePreference) {
    let progress = match timeout(STORE_TIMEOUT, store.load_progress(key)).await {
        Ok(Ok(progress)) => progress,
        Ok(Err(err)) => {
            warn!(%key, error = %err, "Could not read watch progress");
            None
        }
        Err(_) => {
            warn!(%key, "Watch progress read timed out");
            None
        }
    };
    let preference = match timeout(STORE_TIMEOUT, store.load_preference()).await {
        Ok(Ok(preference)) => preference,
        Ok(Err(err)) => {
            warn!(error = %err, "Could not read resume preference");
            ResumePreference::default()
        }
        Err(_) => {
            warn!("Resume preference read timed out");
            ResumePreference::default()
        }
    };
    (progress, preference)
}
