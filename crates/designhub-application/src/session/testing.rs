//! In-memory doubles for driving a session deterministically.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use designhub_core::DesignError;
use designhub_core::autosave::{AutoSaveKey, AutoSaveRepository, AutoSaveSnapshot};
use designhub_core::design::DesignDocument;
use designhub_core::editor::{ChangeListener, DesignEditor, ListenerId};
use designhub_core::error::Result;
use designhub_core::export::{ExportPipeline, ExportRequest};
use designhub_infrastructure::{KvAutoSaveRepository, KvDesignRepository, MemoryKeyValueStore};

use super::coordinator::SessionServices;
use super::event::SessionStatus;
use super::scheduler::{Scheduler, TimerSlot, TimerTask};

/// Editor double. Loading a document can fire a configurable number of
/// change notifications, like a real widget echoing its own initialization.
#[derive(Default)]
pub struct FakeEditor {
    state: Mutex<Value>,
    loaded: Mutex<Vec<DesignDocument>>,
    listeners: Mutex<HashMap<ListenerId, ChangeListener>>,
    next_listener: AtomicU64,
    load_echoes: AtomicUsize,
    rejected_loads: AtomicUsize,
}

impl FakeEditor {
    pub fn set_load_echoes(&self, count: usize) {
        self.load_echoes.store(count, Ordering::SeqCst);
    }

    pub fn reject_next_load(&self) {
        self.reject_loads(1);
    }

    /// Makes the next `count` loads fail.
    pub fn reject_loads(&self, count: usize) {
        self.rejected_loads.store(count, Ordering::SeqCst);
    }

    /// Replaces the editor state as a user edit would and notifies listeners.
    pub fn edit(&self, value: Value) {
        *self.state.lock().unwrap() = value;
        self.notify();
    }

    pub fn loaded(&self) -> Vec<DesignDocument> {
        self.loaded.lock().unwrap().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    fn notify(&self) {
        let listeners: Vec<ChangeListener> =
            self.listeners.lock().unwrap().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }
}

#[async_trait]
impl DesignEditor for FakeEditor {
    async fn load(&self, document: &DesignDocument) -> Result<()> {
        let rejected = self
            .rejected_loads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if rejected.is_ok() {
            return Err(DesignError::editor("document rejected"));
        }

        *self.state.lock().unwrap() = document.as_value().clone();
        self.loaded.lock().unwrap().push(document.clone());
        for _ in 0..self.load_echoes.load(Ordering::SeqCst) {
            self.notify();
        }
        Ok(())
    }

    async fn serialize(&self) -> Result<Value> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn export_html(&self) -> Result<String> {
        Ok("<html><body></body></html>".to_string())
    }

    fn add_change_listener(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().unwrap().insert(id, listener);
        id
    }

    fn remove_change_listener(&self, id: ListenerId) {
        self.listeners.lock().unwrap().remove(&id);
    }
}

/// Scheduler whose clock only moves on [`advance`](Self::advance).
#[derive(Default)]
pub struct ManualScheduler {
    now: Mutex<Duration>,
    pending: Mutex<HashMap<TimerSlot, (Duration, TimerTask)>>,
}

impl ManualScheduler {
    /// Moves time forward and runs every task that came due, earliest first.
    pub fn advance(&self, by: Duration) {
        let now = {
            let mut now = self.now.lock().unwrap();
            *now += by;
            *now
        };

        let mut due: Vec<(Duration, TimerTask)> = {
            let mut pending = self.pending.lock().unwrap();
            let slots: Vec<TimerSlot> = pending
                .iter()
                .filter(|(_, (at, _))| *at <= now)
                .map(|(slot, _)| *slot)
                .collect();
            slots
                .into_iter()
                .filter_map(|slot| pending.remove(&slot))
                .collect()
        };
        due.sort_by_key(|(at, _)| *at);

        for (_, task) in due {
            task();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, slot: TimerSlot, delay: Duration, task: TimerTask) {
        let at = *self.now.lock().unwrap() + delay;
        self.pending.lock().unwrap().insert(slot, (at, task));
    }

    fn cancel(&self, slot: TimerSlot) {
        self.pending.lock().unwrap().remove(&slot);
    }

    fn cancel_all(&self) {
        self.pending.lock().unwrap().clear();
    }
}

/// Autosave repository that counts writes and can be told to fail them.
pub struct RecordingAutoSaves {
    inner: KvAutoSaveRepository,
    saves: AtomicUsize,
    last: Mutex<Option<(AutoSaveKey, DesignDocument)>>,
    fail: AtomicBool,
}

impl RecordingAutoSaves {
    pub fn new(inner: KvAutoSaveRepository) -> Self {
        Self {
            inner,
            saves: AtomicUsize::new(0),
            last: Mutex::new(None),
            fail: AtomicBool::new(false),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn last_saved(&self) -> Option<(AutoSaveKey, DesignDocument)> {
        self.last.lock().unwrap().clone()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AutoSaveRepository for RecordingAutoSaves {
    async fn load(&self, key: &AutoSaveKey) -> Option<AutoSaveSnapshot> {
        self.inner.load(key).await
    }

    async fn save(&self, key: &AutoSaveKey, document: DesignDocument) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DesignError::persistence("Storage quota exceeded"));
        }
        self.inner.save(key, document.clone()).await?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((key.clone(), document));
        Ok(())
    }

    async fn clear(&self, key: &AutoSaveKey) -> Result<()> {
        self.inner.clear(key).await
    }
}

/// Export pipeline that records requests and the busy label shown while each
/// one ran.
#[derive(Default)]
pub struct RecordingExporter {
    requests: Mutex<Vec<ExportRequest>>,
    busy_seen: Mutex<Vec<Option<String>>>,
    status: Mutex<Option<watch::Receiver<SessionStatus>>>,
    fail: AtomicBool,
}

impl RecordingExporter {
    pub fn observe(&self, status: watch::Receiver<SessionStatus>) {
        *self.status.lock().unwrap() = Some(status);
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<ExportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn busy_seen(&self) -> Vec<Option<String>> {
        self.busy_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExportPipeline for RecordingExporter {
    async fn export(&self, request: ExportRequest) -> Result<()> {
        if let Some(status) = self.status.lock().unwrap().as_ref() {
            let busy = status.borrow().busy.clone();
            self.busy_seen.lock().unwrap().push(busy);
        }
        self.requests.lock().unwrap().push(request);

        if self.fail.load(Ordering::SeqCst) {
            return Err(DesignError::export("renderer unavailable"));
        }
        Ok(())
    }
}

/// A full set of in-memory collaborators sharing one store.
pub struct TestRig {
    pub store: MemoryKeyValueStore,
    pub editor: Arc<FakeEditor>,
    pub scheduler: Arc<ManualScheduler>,
    pub autosaves: Arc<RecordingAutoSaves>,
    pub exporter: Arc<RecordingExporter>,
    pub services: SessionServices,
}

impl TestRig {
    pub fn new() -> Self {
        let store = MemoryKeyValueStore::new();
        let editor = Arc::new(FakeEditor::default());
        let scheduler = Arc::new(ManualScheduler::default());
        let autosaves = Arc::new(RecordingAutoSaves::new(KvAutoSaveRepository::new(Arc::new(
            store.clone(),
        ))));
        let exporter = Arc::new(RecordingExporter::default());

        let services = SessionServices {
            designs: Arc::new(KvDesignRepository::new(Arc::new(store.clone()))),
            autosaves: autosaves.clone(),
            editor: editor.clone(),
            scheduler: scheduler.clone(),
            exporter: Some(exporter.clone()),
        };

        Self {
            store,
            editor,
            scheduler,
            autosaves,
            exporter,
            services,
        }
    }

    /// Makes every further store write fail as if the quota were exhausted.
    pub fn fail_store_writes(&self) {
        self.store.set_quota(Some(1));
    }
}
