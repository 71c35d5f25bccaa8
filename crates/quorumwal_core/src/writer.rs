//! The WAL writer.
//!
//! Messages are written to disk before they are processed, so that after a
//! crash the consensus engine can be replayed through the exact same inputs.
//! `save` and `write_end_height` block until the frame is durably flushed;
//! the consensus step they belong to must not become externally visible
//! before they return.
//!
//! ## Failure policy
//!
//! Once the writer is running, any encode, append, short-write, or flush
//! failure is unrecoverable: a gap or torn write at that point would break
//! replay determinism for every future recovery, which is strictly worse
//! than stopping. The writer logs full diagnostic context and panics instead
//! of returning an error the caller might be tempted to swallow.

use crate::config::WalConfig;
use crate::dir::WalDir;
use crate::error::{WalError, WalResult};
use crate::frame;
use crate::marker;
use crate::message::{TimedMessage, WalMessage};
use parking_lot::Mutex;
use quorumwal_codec::Encode;
use quorumwal_storage::{FileBackend, StorageBackend};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;
use tracing::{debug, error, info, trace};

/// The write side of a WAL, as seen by the consensus engine.
///
/// Implemented by [`Wal`], by [`NopWal`], and by `Option<W>` so an absent
/// writer is a safe no-op at every call site.
pub trait WalWriter {
    /// Persists a consensus message (subject to light-mode filtering).
    fn save(&self, msg: WalMessage);

    /// Persists the boundary marker for a completed height.
    fn write_end_height(&self, height: u64);
}

/// A crash-safe, append-only write-ahead log for consensus messages.
///
/// The store is exclusively owned: it is moved in at construction and no
/// shared-handle API is exposed. Lifecycle is Stopped -> Running -> Stopped;
/// `save` on a stopped writer is a no-op so shutdown races cannot corrupt
/// the log.
pub struct Wal {
    /// Exclusively owned store; the mutex serializes the append+flush pair.
    backend: Mutex<Box<dyn StorageBackend>>,
    /// Filtering policy, fixed at construction.
    light: bool,
    /// Lifecycle flag: accepting writes only while true.
    running: AtomicBool,
    /// Held for the directory lock when opened from a path.
    _dir: Option<WalDir>,
}

impl Wal {
    /// Creates a stopped writer over an injected store.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>, light: bool) -> Self {
        Self {
            backend: Mutex::new(backend),
            light,
            running: AtomicBool::new(false),
            _dir: None,
        }
    }

    /// Opens a stopped writer over a WAL directory, taking its exclusive
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::Locked`] if another process owns the directory,
    /// or [`WalError::StoreUnavailable`] if it cannot be opened.
    pub fn open(config: &WalConfig) -> WalResult<Self> {
        let dir = WalDir::open(&config.path, true)?;
        let backend = FileBackend::open(&dir.wal_path())
            .map_err(|e| WalError::store_unavailable(e.to_string()))?;

        Ok(Self {
            backend: Mutex::new(Box::new(backend)),
            light: config.light,
            running: AtomicBool::new(false),
            _dir: Some(dir),
        })
    }

    /// Starts the writer.
    ///
    /// On a fresh (zero-byte) store, the height-0 boundary marker is written
    /// and flushed before any other write is accepted. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::StoreUnavailable`] if the store cannot be sized,
    /// or the underlying error if the initial marker cannot be written.
    /// Start failures are ordinary errors - the caller may retry.
    pub fn start(&self) -> WalResult<()> {
        let mut backend = self.backend.lock();
        let size = backend
            .size()
            .map_err(|e| WalError::store_unavailable(e.to_string()))?;

        if size == 0 {
            append_frame(backend.as_mut(), &marker::end_height_payload(0))?;
            backend.flush()?;
            debug!("initialized empty log with height 0 boundary marker");
        }

        self.running.store(true, Ordering::SeqCst);
        info!(size, light = self.light, "write-ahead log started");
        Ok(())
    }

    /// Stops the writer, flushing and syncing the store.
    ///
    /// Subsequent `save`/`write_end_height` calls are safe no-ops. The
    /// directory lock is released when the writer is dropped.
    ///
    /// # Errors
    ///
    /// Returns the underlying storage error if the final flush fails.
    pub fn stop(&self) -> WalResult<()> {
        self.running.store(false, Ordering::SeqCst);

        let mut backend = self.backend.lock();
        backend.flush()?;
        backend.sync()?;
        info!("write-ahead log stopped");
        Ok(())
    }

    /// Whether the writer is accepting writes.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether light-mode filtering is enabled.
    #[must_use]
    pub fn is_light(&self) -> bool {
        self.light
    }

    /// Current size of the store in bytes.
    ///
    /// # Errors
    ///
    /// Returns the underlying storage error.
    pub fn size(&self) -> WalResult<u64> {
        Ok(self.backend.lock().size()?)
    }

    /// Persists a consensus message.
    ///
    /// The message is timestamped, encoded, framed, appended, and flushed
    /// before this returns. In light mode, messages received from peers are
    /// dropped. A stopped writer drops everything (shutdown-race
    /// resilience).
    ///
    /// # Panics
    ///
    /// Panics on any encode, append, short-write, or flush failure: the
    /// process must never continue past an unconfirmed write.
    pub fn save(&self, msg: WalMessage) {
        if !self.running.load(Ordering::SeqCst) {
            trace!(kind = msg.kind(), "writer stopped, dropping message");
            return;
        }

        if self.light {
            if let WalMessage::Peer(pm) = &msg {
                if !pm.is_local() {
                    trace!(peer = pm.peer.as_deref(), "light mode, dropping peer message");
                    return;
                }
            }
        }

        let timed = TimedMessage::new(SystemTime::now(), msg);
        let payload = match timed.encode() {
            Ok(payload) => payload,
            Err(e) => fatal_write_failure("encoding message", &e.into(), &timed),
        };

        let mut backend = self.backend.lock();
        if let Err(e) = append_frame(backend.as_mut(), &payload) {
            fatal_write_failure("appending message", &e, &timed);
        }
        if let Err(e) = backend.flush() {
            fatal_write_failure("flushing message", &e.into(), &timed);
        }
    }

    /// Persists the boundary marker for a completed height.
    ///
    /// Markers carry no envelope and bypass light-mode filtering. A stopped
    /// writer no-ops.
    ///
    /// # Panics
    ///
    /// Same policy as [`Wal::save`].
    pub fn write_end_height(&self, height: u64) {
        if !self.running.load(Ordering::SeqCst) {
            debug!(height, "writer stopped, dropping boundary marker");
            return;
        }

        let payload = marker::end_height_payload(height);

        let mut backend = self.backend.lock();
        if let Err(e) = append_frame(backend.as_mut(), &payload) {
            fatal_marker_failure(height, &e);
        }
        if let Err(e) = backend.flush() {
            fatal_marker_failure(height, &e.into());
        }
        trace!(height, "boundary marker written");
    }
}

impl WalWriter for Wal {
    fn save(&self, msg: WalMessage) {
        Wal::save(self, msg);
    }

    fn write_end_height(&self, height: u64) {
        Wal::write_end_height(self, height);
    }
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal")
            .field("light", &self.light)
            .field("running", &self.running.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// A writer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopWal;

impl WalWriter for NopWal {
    fn save(&self, _msg: WalMessage) {}

    fn write_end_height(&self, _height: u64) {}
}

impl<W: WalWriter> WalWriter for Option<W> {
    fn save(&self, msg: WalMessage) {
        if let Some(wal) = self {
            wal.save(msg);
        }
    }

    fn write_end_height(&self, height: u64) {
        if let Some(wal) = self {
            wal.write_end_height(height);
        }
    }
}

/// Frames a payload and appends it, treating a short write as an error.
fn append_frame(backend: &mut dyn StorageBackend, payload: &[u8]) -> WalResult<()> {
    let bytes = frame::encode(payload);
    let written = backend.append(&bytes)?;
    if written < bytes.len() {
        return Err(WalError::ShortWrite {
            wanted: bytes.len(),
            written,
        });
    }
    Ok(())
}

fn fatal_write_failure(context: &str, err: &WalError, timed: &TimedMessage) -> ! {
    error!(
        error = %err,
        kind = timed.msg.kind(),
        message = ?timed.msg,
        "unrecoverable write-ahead log failure while {context}"
    );
    panic!(
        "unrecoverable write-ahead log failure while {context}: {err}\n\nmessage: {:?}",
        timed.msg
    );
}

fn fatal_marker_failure(height: u64, err: &WalError) -> ! {
    error!(
        error = %err,
        height,
        "unrecoverable write-ahead log failure while writing boundary marker"
    );
    panic!("unrecoverable write-ahead log failure while writing boundary marker for height {height}: {err}");
}
