//! Session coordinator.
//!
//! Ties one editor instance to the design and autosave repositories.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use designhub_core::DesignError;
use designhub_core::autosave::{AutoSaveKey, AutoSaveRepository};
use designhub_core::config::SessionConfig;
use designhub_core::design::{DesignDocument, DesignRepository, normalize};
use designhub_core::editor::{DesignEditor, ListenerId};
use designhub_core::error::Result;
use designhub_core::export::{ExportFormat, ExportPipeline, ExportRequest};

use super::event::{LoadSource, SessionEvent, SessionNotice, SessionPhase, SessionStatus};
use super::scheduler::{Scheduler, TimerSlot};

const SAVE_FAILED_MESSAGE: &str = "Failed to save design. Please try again.";
const EXPORT_FAILED_MESSAGE: &str = "Failed to export design. Please try again.";
const DEFAULT_FILE_STEM: &str = "design";

/// Collaborators a session works against.
#[derive(Clone)]
pub struct SessionServices {
    pub designs: Arc<dyn DesignRepository>,
    pub autosaves: Arc<dyn AutoSaveRepository>,
    pub editor: Arc<dyn DesignEditor>,
    pub scheduler: Arc<dyn Scheduler>,
    pub exporter: Option<Arc<dyn ExportPipeline>>,
}

/// Coordinates one editing session against one editor instance.
///
/// The coordinator is driven by a single owner. Editor change listeners and
/// timers post [`SessionEvent`]s into the session's own channel; the owner
/// drains them with [`process_pending`](Self::process_pending) or
/// [`run`](Self::run), so every state change happens on `&mut self` in
/// arrival order.
///
/// Change notifications are discarded while the session is suppressed, which
/// covers the window from the start of a load until the settle timer fires.
/// Without it, the editor's own load echoes would be written back as edits.
pub struct SessionCoordinator {
    autosave_key: AutoSaveKey,
    services: SessionServices,
    config: SessionConfig,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    status_tx: watch::Sender<SessionStatus>,
    status: SessionStatus,
    listener: Option<ListenerId>,
    load_source: Option<LoadSource>,
    debounce_generation: u64,
}

impl SessionCoordinator {
    /// Creates a session for `design_id`. `None`, `""` and `"new"` open a new
    /// design.
    pub fn new(design_id: Option<&str>, services: SessionServices, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let status = SessionStatus::default();
        let (status_tx, _) = watch::channel(status.clone());

        Self {
            autosave_key: AutoSaveKey::for_session(design_id),
            services,
            config,
            events_tx,
            events_rx,
            status_tx,
            status,
            listener: None,
            load_source: None,
            debounce_generation: 0,
        }
    }

    pub fn autosave_key(&self) -> &AutoSaveKey {
        &self.autosave_key
    }

    pub fn status(&self) -> SessionStatus {
        self.status.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Sender for posting events into this session, e.g. the editor's ready
    /// signal.
    pub fn events(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Loads the session's document into the editor.
    ///
    /// Only the first call loads; later calls are ignored and report the
    /// source of the first load.
    pub async fn on_editor_ready(&mut self) -> Result<LoadSource> {
        if let Some(source) = self.load_source {
            tracing::warn!(key = %self.autosave_key, "Editor ready signalled more than once");
            return Ok(source);
        }
        if self.status.phase == SessionPhase::Closed {
            return Err(DesignError::editor("Session is closed"));
        }

        self.status.phase = SessionPhase::Loading;
        self.status.suppressed = true;
        self.publish();

        if self.listener.is_none() {
            let events_tx = self.events_tx.clone();
            self.listener = Some(self.services.editor.add_change_listener(Arc::new(move || {
                let _ = events_tx.send(SessionEvent::EditorChanged);
            })));
        }

        let (document, mut source) = self.resolve_document().await;

        if let Err(e) = self.services.editor.load(&document).await {
            tracing::warn!(key = %self.autosave_key, error = %e, "Editor rejected document, loading default");
            if let Err(e) = self.services.editor.load(&DesignDocument::default()).await {
                tracing::error!(error = %e, "Editor failed to load default document");
                self.abort_load();
                return Err(e);
            }
            source = LoadSource::Default;
        }

        if source == LoadSource::Stored {
            self.status.display_name = self.autosave_key.design_id().map(str::to_string);
            self.publish();
        }

        let events_tx = self.events_tx.clone();
        self.services.scheduler.schedule(
            TimerSlot::Settle,
            self.config.settle_delay(),
            Box::new(move || {
                let _ = events_tx.send(SessionEvent::SettleElapsed);
            }),
        );

        tracing::info!(key = %self.autosave_key, source = ?source, "Design loaded into editor");
        self.load_source = Some(source);
        Ok(source)
    }

    /// Undoes a load that could not complete, so a later ready signal starts
    /// from scratch.
    fn abort_load(&mut self) {
        if let Some(id) = self.listener.take() {
            self.services.editor.remove_change_listener(id);
        }
        self.status.phase = SessionPhase::Unloaded;
        self.status.suppressed = false;
        self.publish();
    }

    /// Stored record, then autosave slot, then the default template.
    async fn resolve_document(&self) -> (DesignDocument, LoadSource) {
        if let Some(design_id) = self.autosave_key.design_id() {
            if let Some(document) = self.services.designs.get(design_id).await {
                return (document, LoadSource::Stored);
            }
            tracing::debug!(design_id, "No stored design, trying autosave");
        }

        if let Some(snapshot) = self.services.autosaves.load(&self.autosave_key).await {
            return (snapshot.document, LoadSource::AutoSave);
        }

        (normalize(None), LoadSource::Default)
    }

    fn on_settle_elapsed(&mut self) {
        if self.status.phase != SessionPhase::Loading {
            return;
        }
        self.status.suppressed = false;
        self.status.phase = SessionPhase::Ready;
        self.publish();
        tracing::debug!(key = %self.autosave_key, "Session ready for edits");
    }

    /// Restarts the autosave debounce. Ignored while suppressed or not ready.
    pub fn on_editor_changed(&mut self) {
        if self.status.suppressed || self.status.phase != SessionPhase::Ready {
            tracing::trace!(key = %self.autosave_key, "Change notification discarded");
            return;
        }

        if !self.status.dirty {
            self.status.dirty = true;
            self.publish();
        }

        self.debounce_generation += 1;
        let generation = self.debounce_generation;
        let events_tx = self.events_tx.clone();
        self.services.scheduler.schedule(
            TimerSlot::Debounce,
            self.config.autosave_debounce(),
            Box::new(move || {
                let _ = events_tx.send(SessionEvent::DebounceElapsed { generation });
            }),
        );
    }

    async fn on_debounce_elapsed(&mut self, generation: u64) {
        if generation != self.debounce_generation || self.status.phase != SessionPhase::Ready {
            tracing::trace!(generation, "Stale autosave timer ignored");
            return;
        }
        self.write_autosave().await;
    }

    /// Writes the editor's current state to the autosave slot. Failures are
    /// logged only; the next edit reserializes anyway.
    async fn write_autosave(&self) {
        let value = match self.services.editor.serialize().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %self.autosave_key, error = %e, "Failed to serialize editor for autosave");
                return;
            }
        };

        if !value.is_object() {
            tracing::debug!(key = %self.autosave_key, "Editor returned no document, autosave skipped");
            return;
        }

        match self
            .services
            .autosaves
            .save(&self.autosave_key, normalize(Some(value)))
            .await
        {
            Ok(()) => tracing::debug!(key = %self.autosave_key, "Autosaved"),
            Err(e) => tracing::warn!(key = %self.autosave_key, error = %e, "Autosave failed"),
        }
    }

    /// Saves the editor's current state as the named design `name`.
    ///
    /// On success the autosave slot is cleared and the session is clean. On
    /// failure an error notice is posted and the slot is kept.
    pub async fn commit_save(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DesignError::validation("Please enter a design name"));
        }
        if self.status.phase != SessionPhase::Ready {
            return Err(DesignError::editor("Editor is not ready"));
        }

        let result = match self.services.editor.serialize().await {
            Ok(value) => self.services.designs.save(name, normalize(Some(value))).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::error!(name, error = %e, "Failed to commit design");
            self.status.notice = Some(SessionNotice::error(SAVE_FAILED_MESSAGE));
            self.publish();
            return Err(e);
        }

        self.services.scheduler.cancel(TimerSlot::Debounce);
        self.debounce_generation += 1;

        if let Err(e) = self.services.autosaves.clear(&self.autosave_key).await {
            tracing::warn!(key = %self.autosave_key, error = %e, "Failed to clear autosave after commit");
        }

        self.status.display_name = Some(name.to_string());
        self.status.dirty = false;
        self.status.notice = Some(SessionNotice::info(format!("Design \"{}\" saved", name)));
        self.publish();

        tracing::info!(name, "Design committed");
        Ok(())
    }

    /// Exports the current design through the export pipeline.
    ///
    /// The busy label is shown for the duration and always cleared.
    pub async fn export(&mut self, format: ExportFormat) -> Result<()> {
        if self.status.phase != SessionPhase::Ready {
            return Err(DesignError::editor("Editor is not ready"));
        }
        let exporter = self
            .services
            .exporter
            .clone()
            .ok_or_else(|| DesignError::export("No export pipeline configured"))?;

        self.status.busy = format.busy_label().map(str::to_string);
        self.publish();

        let file_stem = self
            .status
            .display_name
            .clone()
            .unwrap_or_else(|| DEFAULT_FILE_STEM.to_string());

        let result = match self.services.editor.export_html().await {
            Ok(html) => {
                exporter
                    .export(ExportRequest {
                        format,
                        html,
                        file_stem,
                    })
                    .await
            }
            Err(e) => Err(e),
        };

        self.status.busy = None;
        if let Err(ref e) = result {
            tracing::error!(format = %format, error = %e, "Export failed");
            self.status.notice = Some(SessionNotice::error(EXPORT_FAILED_MESSAGE));
        }
        self.publish();

        result
    }

    /// Discards this session's autosave slot and closes the session so a
    /// fresh one can be opened.
    pub async fn start_new_design(&mut self) -> Result<()> {
        self.services.autosaves.clear(&self.autosave_key).await?;
        self.teardown();
        Ok(())
    }

    /// Cancels timers and unregisters the editor listener. Idempotent.
    pub fn teardown(&mut self) {
        if self.status.phase == SessionPhase::Closed {
            return;
        }

        self.services.scheduler.cancel_all();
        if let Some(id) = self.listener.take() {
            self.services.editor.remove_change_listener(id);
        }

        self.status.phase = SessionPhase::Closed;
        self.status.busy = None;
        self.publish();
        tracing::debug!(key = %self.autosave_key, "Session closed");
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::EditorReady => {
                if let Err(e) = self.on_editor_ready().await {
                    tracing::error!(key = %self.autosave_key, error = %e, "Failed to load design");
                }
            }
            SessionEvent::EditorChanged => self.on_editor_changed(),
            SessionEvent::SettleElapsed => self.on_settle_elapsed(),
            SessionEvent::DebounceElapsed { generation } => {
                self.on_debounce_elapsed(generation).await
            }
            SessionEvent::Teardown => self.teardown(),
        }
    }

    /// Handles every event queued so far. Returns how many were handled.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    /// Handles events as they arrive until the session is closed.
    pub async fn run(&mut self) {
        while self.status.phase != SessionPhase::Closed {
            match self.events_rx.recv().await {
                Some(event) => self.handle_event(event).await,
                None => break,
            }
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status.clone());
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
