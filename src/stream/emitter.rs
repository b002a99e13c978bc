//! Character-paced text output on a background worker.
//!
//! A [`TextEmitter`] owns one worker thread and one unbounded FIFO. Callers
//! enqueue chunks with [`put`](TextEmitter::put) and block on
//! [`wait_until_done`](TextEmitter::wait_until_done) when they need the output
//! to have caught up. Only the worker writes to the sink.
//!
//! Lifecycle is stopped → running → stopped. Stopping abandons queued chunks
//! and cuts the chunk in flight short.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use super::jitter::{self, Jitter, RandomJitter};

/// Destination of emitted text.
pub type Sink = Box<dyn Write + Send>;

/// Pacing and shutdown settings for one emitter.
#[derive(Debug, Clone, Copy)]
pub struct EmitterOptions {
    /// Base delay after each character
    pub interval: Duration,
    /// How long `stop` waits for the worker before detaching it
    pub stop_timeout: Duration,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(20),
            stop_timeout: Duration::from_secs(1),
        }
    }
}

enum Chunk {
    /// Written one character at a time
    Paced(String),
    /// Written in one piece
    Immediate(String),
}

/// State of one started run, shared between the handle and that run's worker.
///
/// Every `start` creates a fresh one, so a worker detached by a timed-out
/// `stop` can neither resume nor touch the counters of a later run.
struct RunState {
    running: AtomicBool,
    /// Chunks enqueued but not yet fully written
    pending: Mutex<usize>,
    drained: Condvar,
}

impl RunState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            pending: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn chunk_finished(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.drained.notify_all();
        }
    }

    fn abandon_all(&self) {
        let mut pending = self.pending.lock();
        *pending = 0;
        self.drained.notify_all();
    }
}

fn write_all(sink: &Mutex<Sink>, text: &str) -> io::Result<()> {
    let mut sink = sink.lock();
    sink.write_all(text.as_bytes())?;
    sink.flush()
}

struct Worker {
    state: Arc<RunState>,
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

/// Background writer that streams text chunks character by character.
pub struct TextEmitter {
    name: String,
    options: EmitterOptions,
    jitter: Arc<dyn Jitter>,
    sink: Arc<Mutex<Sink>>,
    sender: Option<Sender<Chunk>>,
    worker: Option<Worker>,
}

impl TextEmitter {
    /// Create a stopped emitter writing to `sink` with random jitter.
    pub fn new(name: impl Into<String>, sink: Sink, options: EmitterOptions) -> Self {
        Self::with_jitter(name, sink, options, Arc::new(RandomJitter))
    }

    pub fn with_jitter(
        name: impl Into<String>,
        sink: Sink,
        options: EmitterOptions,
        jitter: Arc<dyn Jitter>,
    ) -> Self {
        Self {
            name: name.into(),
            options,
            jitter,
            sink: Arc::new(Mutex::new(sink)),
            sender: None,
            worker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| w.state.is_running())
    }

    /// Spawn the worker. Does nothing when already running.
    pub fn start(&mut self) -> io::Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let (sender, receiver) = crossbeam_channel::unbounded();
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let state = Arc::new(RunState::new());
        let worker_state = Arc::clone(&state);
        let sink = Arc::clone(&self.sink);
        let jitter = Arc::clone(&self.jitter);
        let interval = self.options.interval;
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(format!("emitter-{}", self.name))
            .spawn(move || {
                run_worker(
                    &name,
                    receiver,
                    &worker_state,
                    &sink,
                    interval,
                    jitter.as_ref(),
                );
                let _ = done_tx.send(());
            })?;

        debug!("Emitter '{}' started", self.name);
        self.sender = Some(sender);
        self.worker = Some(Worker {
            state,
            handle,
            done: done_rx,
        });
        Ok(())
    }

    /// Enqueue `text` to be written character by character. Never blocks.
    ///
    /// On a stopped emitter the text is dropped.
    pub fn put(&self, text: impl Into<String>) {
        self.enqueue(Chunk::Paced(text.into()));
    }

    /// Enqueue `text` to be written in one piece, in order with paced chunks.
    pub fn put_immediate(&self, text: impl Into<String>) {
        self.enqueue(Chunk::Immediate(text.into()));
    }

    fn enqueue(&self, chunk: Chunk) {
        let (Some(sender), Some(worker)) = (self.sender.as_ref(), self.worker.as_ref()) else {
            debug!("Emitter '{}' is stopped, dropping chunk", self.name);
            return;
        };

        *worker.state.pending.lock() += 1;
        if sender.send(chunk).is_err() {
            worker.state.chunk_finished();
        }
    }

    /// Block until every enqueued chunk has been written.
    ///
    /// Returns immediately on a stopped emitter.
    pub fn wait_until_done(&self) {
        let Some(worker) = self.worker.as_ref() else {
            return;
        };
        let state = &worker.state;
        let mut pending = state.pending.lock();
        while *pending > 0 && state.is_running() {
            state.drained.wait(&mut pending);
        }
    }

    /// Stop the worker and wait up to the stop timeout for it to exit.
    ///
    /// Queued chunks are abandoned. Does nothing when already stopped.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        worker.state.running.store(false, Ordering::Release);
        // Closing the channel wakes a worker blocked on an empty queue
        self.sender = None;
        {
            let _pending = worker.state.pending.lock();
            worker.state.drained.notify_all();
        }

        match worker.done.recv_timeout(self.options.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    warn!("Emitter '{}' worker panicked", self.name);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Emitter '{}' did not stop within {:?}, detaching worker",
                    self.name, self.options.stop_timeout
                );
            }
        }

        worker.state.abandon_all();
        debug!("Emitter '{}' stopped", self.name);
    }
}

impl Drop for TextEmitter {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TextEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEmitter")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish()
    }
}

fn run_worker(
    name: &str,
    receiver: Receiver<Chunk>,
    state: &RunState,
    sink: &Mutex<Sink>,
    interval: Duration,
    jitter: &dyn Jitter,
) {
    while state.is_running() {
        let Ok(chunk) = receiver.recv() else {
            break;
        };
        if !state.is_running() {
            state.chunk_finished();
            break;
        }

        let result = match &chunk {
            Chunk::Immediate(text) => write_all(sink, text),
            Chunk::Paced(text) => emit_paced(text, state, sink, interval, jitter),
        };
        if let Err(e) = result {
            warn!("Emitter '{name}' failed to write: {e}");
        }
        state.chunk_finished();
    }

    let abandoned = receiver.try_iter().count();
    if abandoned > 0 {
        debug!("Emitter '{name}' abandoned {abandoned} queued chunks");
    }
}

fn emit_paced(
    text: &str,
    state: &RunState,
    sink: &Mutex<Sink>,
    interval: Duration,
    jitter: &dyn Jitter,
) -> io::Result<()> {
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        if !state.is_running() {
            break;
        }
        write_all(sink, ch.encode_utf8(&mut buf))?;
        if !interval.is_zero() {
            thread::sleep(jitter::scaled(interval, jitter));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::NoJitter;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    fn instant() -> EmitterOptions {
        EmitterOptions {
            interval: Duration::ZERO,
            stop_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_chunks_are_written_in_order() {
        let capture = Capture::default();
        let mut emitter =
            TextEmitter::with_jitter("t", Box::new(capture.clone()), instant(), Arc::new(NoJitter));
        emitter.start().unwrap();

        emitter.put_immediate("Answer: ");
        emitter.put("héllo");
        emitter.put(" wörld");
        emitter.wait_until_done();

        assert_eq!(capture.text(), "Answer: héllo wörld");
        emitter.stop();
        assert!(!emitter.is_running());
    }

    #[test]
    fn test_stopped_emitter_drops_and_returns() {
        let capture = Capture::default();
        let mut emitter =
            TextEmitter::with_jitter("t", Box::new(capture.clone()), instant(), Arc::new(NoJitter));

        emitter.put("never written");
        emitter.wait_until_done();
        assert_eq!(capture.text(), "");

        emitter.start().unwrap();
        emitter.start().unwrap();
        emitter.put("ok");
        emitter.wait_until_done();
        emitter.stop();
        emitter.stop();
        assert_eq!(capture.text(), "ok");
    }

    #[test]
    fn test_restart_after_stop() {
        let capture = Capture::default();
        let mut emitter =
            TextEmitter::with_jitter("t", Box::new(capture.clone()), instant(), Arc::new(NoJitter));
        emitter.start().unwrap();
        emitter.put("a");
        emitter.wait_until_done();
        emitter.stop();

        emitter.start().unwrap();
        emitter.put("b");
        emitter.wait_until_done();
        assert_eq!(capture.text(), "ab");
    }
}
