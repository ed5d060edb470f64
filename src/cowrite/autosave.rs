//! # Autosave Driver
//!
//! Runs an [`EditorSession`] on its own tokio task and gives it a clock.
//!
//! The task owns the session outright; everything else talks to it through
//! an [`AutosaveHandle`] that sends commands over a channel. All session and
//! store work therefore happens on a single logical thread, in the order the
//! commands were sent, and no locks are involved.
//!
//! ```text
//!  UI events ──▶ AutosaveHandle ──mpsc──▶ task { session, debouncer }
//!                     ▲                          │
//!                     └──── watch: status, list revision ◀──┘
//! ```
//!
//! Each edit re-arms a [`Debouncer`] with the `auto_save_interval` setting.
//! Only the latest deadline fires; when it does the session saves whatever
//! the buffer holds at that moment. An explicit [`AutosaveHandle::save`]
//! bypasses the timer.
//!
//! Every command waits for the task to acknowledge it, so once an `edit_*`
//! call returns the debounce deadline has been measured from that instant.

use crate::debounce::Debouncer;
use crate::error::{CowriteError, Result};
use crate::listing::{DocumentQuery, DocumentSummary};
use crate::model::{Document, DEFAULT_AUTO_SAVE_INTERVAL_MS};
use crate::save_state::{Effect, SaveStatus};
use crate::session::{EditBuffer, EditorSession};
use crate::store::StorageBackend;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub current: Option<Uuid>,
    pub buffer: EditBuffer,
    pub status: SaveStatus,
    pub word_count: usize,
    /// A debounced save is scheduled and has not fired yet.
    pub save_pending: bool,
}

enum Command {
    EditTitle(String, oneshot::Sender<SaveStatus>),
    EditContent(String, oneshot::Sender<SaveStatus>),
    Save(oneshot::Sender<SaveStatus>),
    Load(Uuid, oneshot::Sender<Result<bool>>),
    NewDocument(oneshot::Sender<Result<Document>>),
    Delete(Uuid, oneshot::Sender<Result<()>>),
    Duplicate(Uuid, oneshot::Sender<Result<Option<Document>>>),
    Documents(DocumentQuery, oneshot::Sender<Result<Vec<DocumentSummary>>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

pub struct Autosave;

impl Autosave {
    /// Move `session` onto a new task. The debounce interval is read from the
    /// stored settings once, here.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<B>(session: EditorSession<B>) -> AutosaveHandle<B>
    where
        B: StorageBackend + Send + 'static,
    {
        let interval = session.auto_save_interval().unwrap_or_else(|e| {
            warn!(error = %e, "cannot read settings, using default autosave interval");
            Duration::from_millis(DEFAULT_AUTO_SAVE_INTERVAL_MS)
        });

        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(session.status());
        let (revision_tx, revision_rx) = watch::channel(session.list_revision());

        let task = tokio::spawn(run(
            session,
            rx,
            Debouncer::new(interval),
            status_tx,
            revision_tx,
        ));

        AutosaveHandle {
            tx,
            status: status_rx,
            revisions: revision_rx,
            task,
        }
    }
}

async fn run<B: StorageBackend>(
    mut session: EditorSession<B>,
    mut rx: mpsc::Receiver<Command>,
    mut debouncer: Debouncer,
    status_tx: watch::Sender<SaveStatus>,
    revision_tx: watch::Sender<u64>,
) -> EditorSession<B> {
    debug!(interval_ms = debouncer.delay().as_millis() as u64, "autosave started");
    loop {
        tokio::select! {
            // An elapsed deadline is handled before any queued command
            biased;

            _ = debouncer.elapsed() => {
                let status = session.timer_fired();
                debug!(%status, "debounced save");
            }
            cmd = rx.recv() => match cmd {
                None | Some(Command::Shutdown) => break,
                Some(cmd) => handle(&mut session, &mut debouncer, cmd),
            },
        }

        let status = session.status();
        status_tx.send_if_modified(|current| replace_if_changed(current, status));
        let revision = session.list_revision();
        revision_tx.send_if_modified(|current| replace_if_changed(current, revision));
    }
    debug!("autosave stopped");
    session
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn handle<B: StorageBackend>(
    session: &mut EditorSession<B>,
    debouncer: &mut Debouncer,
    cmd: Command,
) {
    // A dropped reply receiver just means the caller stopped waiting
    match cmd {
        Command::EditTitle(title, reply) => {
            if session.edit_title(title) == Some(Effect::ArmTimer) {
                debouncer.schedule();
            }
            let _ = reply.send(session.status());
        }
        Command::EditContent(content, reply) => {
            if session.edit_content(content) == Some(Effect::ArmTimer) {
                debouncer.schedule();
            }
            let _ = reply.send(session.status());
        }
        Command::Save(reply) => {
            debouncer.cancel();
            let _ = reply.send(session.save());
        }
        Command::Load(id, reply) => {
            let result = session.load_document(&id);
            if matches!(result, Ok(true)) {
                debouncer.cancel();
            }
            let _ = reply.send(result);
        }
        Command::NewDocument(reply) => {
            let result = session.new_document();
            if result.is_ok() {
                debouncer.cancel();
            }
            let _ = reply.send(result);
        }
        Command::Delete(id, reply) => {
            let before = session.current_document_id();
            let result = session.delete_document(&id);
            if session.current_document_id() != before {
                debouncer.cancel();
            }
            let _ = reply.send(result);
        }
        Command::Duplicate(id, reply) => {
            let result = session.duplicate_document(&id);
            if matches!(result, Ok(Some(_))) {
                debouncer.cancel();
            }
            let _ = reply.send(result);
        }
        Command::Documents(query, reply) => {
            let _ = reply.send(session.documents(&query));
        }
        Command::Snapshot(reply) => {
            let _ = reply.send(SessionSnapshot {
                current: session.current_document_id(),
                buffer: session.buffer().clone(),
                status: session.status(),
                word_count: session.word_count(),
                save_pending: debouncer.is_pending(),
            });
        }
        Command::Shutdown => {}
    }
}

/// Client side of a running autosave task.
pub struct AutosaveHandle<B: StorageBackend> {
    tx: mpsc::Sender<Command>,
    status: watch::Receiver<SaveStatus>,
    revisions: watch::Receiver<u64>,
    task: JoinHandle<EditorSession<B>>,
}

impl<B: StorageBackend> AutosaveHandle<B> {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| CowriteError::SessionClosed)?;
        reply_rx.await.map_err(|_| CowriteError::SessionClosed)
    }

    pub async fn edit_title(&self, title: impl Into<String>) -> Result<SaveStatus> {
        let title = title.into();
        self.request(|reply| Command::EditTitle(title, reply)).await
    }

    pub async fn edit_content(&self, content: impl Into<String>) -> Result<SaveStatus> {
        let content = content.into();
        self.request(|reply| Command::EditContent(content, reply)).await
    }

    /// Save now, regardless of the debounce timer.
    pub async fn save(&self) -> Result<SaveStatus> {
        self.request(Command::Save).await
    }

    pub async fn load_document(&self, id: Uuid) -> Result<bool> {
        self.request(|reply| Command::Load(id, reply)).await?
    }

    pub async fn new_document(&self) -> Result<Document> {
        self.request(Command::NewDocument).await?
    }

    pub async fn delete_document(&self, id: Uuid) -> Result<()> {
        self.request(|reply| Command::Delete(id, reply)).await?
    }

    pub async fn duplicate_document(&self, id: Uuid) -> Result<Option<Document>> {
        self.request(|reply| Command::Duplicate(id, reply)).await?
    }

    pub async fn documents(&self, query: DocumentQuery) -> Result<Vec<DocumentSummary>> {
        self.request(|reply| Command::Documents(query, reply)).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Receiver for the save indicator.
    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Receiver that changes whenever the document list should re-render.
    pub fn list_revisions(&self) -> watch::Receiver<u64> {
        self.revisions.clone()
    }

    /// Stop the task and take the session back. A pending debounced save is
    /// dropped; unsaved edits remain in the returned session's buffer.
    pub async fn shutdown(self) -> Result<EditorSession<B>> {
        // The task also stops once every sender is gone
        let _ = self.tx.send(Command::Shutdown).await;
        drop(self.tx);
        self.task.await.map_err(|_| CowriteError::SessionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentPatch, SettingsPatch};
    use crate::store::mem_backend::MemBackend;
    use crate::store::DocumentStore;
    use tokio::time::{advance, Instant};

    struct Harness {
        backend: MemBackend,
        handle: AutosaveHandle<MemBackend>,
        doc_id: Uuid,
    }

    fn start(interval_ms: u64) -> Harness {
        let backend = MemBackend::new();
        let store = DocumentStore::with_backend(backend.clone());
        store
            .update_settings(SettingsPatch {
                auto_save_interval: Some(interval_ms),
                ..Default::default()
            })
            .unwrap();
        let mut session = EditorSession::new(store);
        let doc_id = session.open_initial(None).unwrap();
        let handle = Autosave::spawn(session);
        Harness {
            backend,
            handle,
            doc_id,
        }
    }

    fn stored_content(backend: &MemBackend, id: &Uuid) -> String {
        DocumentStore::with_backend(backend.clone())
            .get_document(id)
            .unwrap()
            .unwrap()
            .content
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_shows_saving_until_quiet_period_elapses() {
        let h = start(2000);
        let writes = h.backend.write_count();

        let status = h.handle.edit_content("<p>draft</p>").await.unwrap();
        assert_eq!(status, SaveStatus::Saving);

        advance(Duration::from_millis(1999)).await;
        let snap = h.handle.snapshot().await.unwrap();
        assert_eq!(snap.status, SaveStatus::Saving);
        assert!(snap.save_pending);
        assert_eq!(h.backend.write_count(), writes);

        advance(Duration::from_millis(1)).await;
        let snap = h.handle.snapshot().await.unwrap();
        assert_eq!(snap.status, SaveStatus::Saved);
        assert!(!snap.save_pending);
        assert_eq!(h.backend.write_count(), writes + 1);
        assert_eq!(stored_content(&h.backend, &h.doc_id), "<p>draft</p>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_coalesce_into_one_save() {
        let h = start(2000);
        let writes = h.backend.write_count();
        let start = Instant::now();

        h.handle.edit_content("a").await.unwrap();
        advance(Duration::from_millis(100)).await;
        h.handle.edit_content("a b").await.unwrap();
        advance(Duration::from_millis(50)).await;
        h.handle.edit_content("a b c").await.unwrap();

        advance(Duration::from_millis(1999)).await;
        h.handle.snapshot().await.unwrap();
        assert_eq!(h.backend.write_count(), writes);
        assert_eq!(start.elapsed(), Duration::from_millis(2149));

        advance(Duration::from_millis(1)).await;
        let snap = h.handle.snapshot().await.unwrap();
        assert_eq!(snap.status, SaveStatus::Saved);
        assert_eq!(h.backend.write_count(), writes + 1);
        assert_eq!(stored_content(&h.backend, &h.doc_id), "a b c");

        // Nothing else fires later
        advance(Duration::from_secs(10)).await;
        h.handle.snapshot().await.unwrap();
        assert_eq!(h.backend.write_count(), writes + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_save_bypasses_timer() {
        let h = start(2000);

        h.handle.edit_title("Now").await.unwrap();
        assert_eq!(h.handle.save().await.unwrap(), SaveStatus::Saved);

        let snap = h.handle.snapshot().await.unwrap();
        assert!(!snap.save_pending);
        let store = DocumentStore::with_backend(h.backend.clone());
        assert_eq!(store.get_document(&h.doc_id).unwrap().unwrap().title, "Now");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_autosave_reports_error_and_keeps_buffer() {
        let h = start(500);
        let mut status = h.handle.status();

        h.backend.set_simulate_write_error(true);
        h.handle.edit_content("keep me").await.unwrap();
        advance(Duration::from_millis(500)).await;

        let snap = h.handle.snapshot().await.unwrap();
        assert_eq!(snap.status, SaveStatus::Error);
        assert_eq!(snap.buffer.content, "keep me");
        assert_eq!(*status.borrow_and_update(), SaveStatus::Error);

        h.backend.set_simulate_write_error(false);
        assert_eq!(h.handle.save().await.unwrap(), SaveStatus::Saved);
        assert_eq!(stored_content(&h.backend, &h.doc_id), "keep me");
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_abandons_pending_save() {
        let h = start(2000);
        let other = DocumentStore::with_backend(h.backend.clone())
            .create_document(Some("Other"), Some("other body"))
            .unwrap();

        h.handle.edit_content("never saved").await.unwrap();
        assert!(h.handle.load_document(other.id).await.unwrap());
        advance(Duration::from_secs(5)).await;

        let snap = h.handle.snapshot().await.unwrap();
        assert_eq!(snap.current, Some(other.id));
        assert_eq!(snap.buffer.content, "other body");
        assert_eq!(snap.status, SaveStatus::Saved);
        assert_eq!(stored_content(&h.backend, &h.doc_id), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_bumps_list_revision() {
        let h = start(2000);
        let revisions = h.handle.list_revisions();
        let before = *revisions.borrow();

        h.handle.edit_title("Renamed").await.unwrap();
        h.handle.save().await.unwrap();
        h.handle.snapshot().await.unwrap();

        assert!(*revisions.borrow() > before);
        let rows = h.handle.documents(DocumentQuery::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Renamed");
        assert!(rows[0].active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_actions_switch_documents() {
        let h = start(2000);

        let created = h.handle.new_document().await.unwrap();
        assert_eq!(h.handle.snapshot().await.unwrap().current, Some(created.id));

        let copy = h.handle.duplicate_document(created.id).await.unwrap().unwrap();
        assert_eq!(copy.title, "Untitled (Copy)");
        assert_eq!(h.handle.snapshot().await.unwrap().current, Some(copy.id));

        h.handle.delete_document(copy.id).await.unwrap();
        let snap = h.handle.snapshot().await.unwrap();
        assert!(snap.current.is_some());
        assert_ne!(snap.current, Some(copy.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_returns_session_with_unsaved_buffer() {
        let h = start(2000);
        h.handle.edit_content("pending").await.unwrap();

        let session = h.handle.shutdown().await.unwrap();

        assert_eq!(session.buffer().content, "pending");
        assert!(session.store().get_document(&h.doc_id).unwrap().is_some());
        let stored = session.store().get_document(&h.doc_id).unwrap().unwrap();
        assert_eq!(stored.content, "");

        // The store is still usable after the task is gone
        session
            .store()
            .update_document(&h.doc_id, DocumentPatch::content("later"))
            .unwrap();
    }
}
