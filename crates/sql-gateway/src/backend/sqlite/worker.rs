use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
};

use rusqlite::{Connection, InterruptHandle, OpenFlags};

use super::{query, registry::SharedRegistry};
use crate::{
    core::types::{ExecutionId, QueryState},
    error::{AppError, AppResult},
};

/// VM instructions between checks of the abort flag.
const ABORT_CHECK_OPS: i32 = 1_000;

/// One worker thread per database file, each owning a read-only connection.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    inner: Arc<Mutex<HashMap<PathBuf, WorkerHandle>>>,
    registry: SharedRegistry,
    busy_timeout_ms: u64,
}

impl WorkerPool {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            registry,
            busy_timeout_ms: 2_000,
        }
    }

    pub fn ensure_worker(&self, db_path: &Path) -> AppResult<WorkerHandle> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| AppError::Internal("poisoned lock".into()))?;
        if let Some(h) = guard.get(db_path) {
            return Ok(h.clone());
        }

        let h = WorkerHandle::spawn(db_path.to_path_buf(), self.busy_timeout_ms, self.registry.clone())?;
        guard.insert(db_path.to_path_buf(), h.clone());
        Ok(h)
    }
}

#[derive(Clone)]
pub struct WorkerHandle {
    tx: std::sync::mpsc::Sender<Task>,
    interrupt: Arc<InterruptHandle>,
    abort: Arc<AtomicBool>,
    pub db_path: PathBuf,
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

struct Task {
    id: ExecutionId,
    sql: String,
}

impl WorkerHandle {
    fn spawn(db_path: PathBuf, busy_timeout_ms: u64, registry: SharedRegistry) -> AppResult<Self> {
        let conn = open_conn(&db_path, busy_timeout_ms)?;
        let interrupt = Arc::new(conn.get_interrupt_handle());
        let abort = Arc::new(AtomicBool::new(false));
        install_abort_check(&conn, abort.clone());
        let (tx, rx) = std::sync::mpsc::channel::<Task>();
        let path_for_thread = db_path.clone();
        let abort_for_thread = abort.clone();
        thread::Builder::new()
            .name(format!("sqlite-worker:{}", db_path.display()))
            .spawn(move || db_worker_main(conn, path_for_thread, registry, abort_for_thread, rx))?;
        Ok(Self {
            tx,
            interrupt,
            abort,
            db_path,
        })
    }

    pub fn enqueue(&self, id: ExecutionId, sql: String) -> AppResult<()> {
        self.tx
            .send(Task { id, sql })
            .map_err(|_| AppError::Internal("db worker unavailable".into()))
    }

    /// Aborts whatever statement is running on this worker's connection.
    ///
    /// SQLite drops an interrupt that arrives before the statement's first
    /// step, so the abort flag stays raised until the next task starts.
    pub fn interrupt(&self) {
        self.abort.store(true, Ordering::Release);
        self.interrupt.interrupt();
    }
}

fn db_worker_main(
    conn: Connection,
    db_path: PathBuf,
    registry: SharedRegistry,
    abort: Arc<AtomicBool>,
    rx: std::sync::mpsc::Receiver<Task>,
) {
    while let Ok(Task { id, sql }) = rx.recv() {
        match registry.lock() {
            Ok(mut reg) => match reg.get_mut(&id) {
                Ok(exec) if exec.state == QueryState::Queued => {
                    abort.store(false, Ordering::Release);
                    exec.start();
                }
                // Cancelled while queued, or already evicted.
                _ => continue,
            },
            Err(e) => {
                tracing::error!(error = %e, path = %db_path.display(), "registry unavailable; stopping worker");
                return;
            }
        }

        let outcome = query::run_statement(&conn, &sql);
        if let Err(e) = &outcome {
            tracing::debug!(execution_id = %id, error = %e, "statement failed");
        }

        match registry.lock() {
            Ok(mut reg) => {
                if let Ok(exec) = reg.get_mut(&id) {
                    exec.finish(outcome);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, path = %db_path.display(), "registry unavailable; stopping worker");
                return;
            }
        }
    }
}

/// A raised flag makes the running statement fail with SQLITE_INTERRUPT.
fn install_abort_check(conn: &Connection, abort: Arc<AtomicBool>) {
    conn.progress_handler(
        ABORT_CHECK_OPS,
        Some(move || abort.load(Ordering::Acquire)),
    );
}

fn open_conn(path: &Path, busy_timeout_ms: u64) -> AppResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|source| AppError::DbOpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let _ = conn.busy_timeout(std::time::Duration::from_millis(busy_timeout_ms));
    Ok(conn)
}

/// Database names map to file names, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub(crate) fn is_safe_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else { return false };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
