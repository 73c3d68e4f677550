use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use image::RgbaImage;

use crate::foundation::core::WorkerOpts;
use crate::foundation::error::{ChatError, ChatResult};
use crate::render::replay::ChatReplay;

/// Message consumed by the render worker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChatMsg {
    /// Draw at this playback timestamp.
    Tick(f64),
    /// Restart from this playback timestamp.
    Seek(f64),
}

#[derive(Debug, Default)]
struct Pending {
    seek: Option<f64>,
    tick: Option<f64>,
    closed: bool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-slot handoff between playback and the render worker.
///
/// Posting never blocks and only the latest value survives: a tick replaces a pending tick, a
/// seek replaces a pending seek and discards any pending tick. A pending seek is delivered
/// before a pending tick.
#[derive(Debug, Default)]
pub struct Mailbox {
    state: Mutex<Pending>,
    ready: Condvar,
}

impl Mailbox {
    /// Empty, open mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `msg`, replacing what it supersedes. Ignored once closed.
    pub fn post(&self, msg: ChatMsg) {
        let mut p = lock(&self.state);
        if p.closed {
            return;
        }
        match msg {
            ChatMsg::Seek(t) => {
                p.seek = Some(t);
                p.tick = None;
            }
            ChatMsg::Tick(t) => p.tick = Some(t),
        }
        self.ready.notify_one();
    }

    /// Close the mailbox; blocked and future receivers get `None`.
    pub fn close(&self) {
        lock(&self.state).closed = true;
        self.ready.notify_all();
    }

    /// Take the next message without waiting.
    pub fn try_recv(&self) -> Option<ChatMsg> {
        let mut p = lock(&self.state);
        if p.closed {
            return None;
        }
        take(&mut p)
    }

    /// Wait for the next message; `None` once closed.
    pub fn recv(&self) -> Option<ChatMsg> {
        let mut p = lock(&self.state);
        loop {
            if p.closed {
                return None;
            }
            if let Some(msg) = take(&mut p) {
                return Some(msg);
            }
            p = self.ready.wait(p).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

fn take(p: &mut Pending) -> Option<ChatMsg> {
    p.seek
        .take()
        .map(ChatMsg::Seek)
        .or_else(|| p.tick.take().map(ChatMsg::Tick))
}

/// Destination for rendered chat frames.
pub trait ChatSurface: Send {
    /// Show `frame`, the full scroll buffer after a draw.
    fn present(&mut self, frame: &RgbaImage) -> ChatResult<()>;
}

#[derive(Debug, Default)]
struct SurfaceState {
    latest: Option<RgbaImage>,
    presented: usize,
}

/// Surface keeping the latest frame in memory. Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct InMemorySurface {
    shared: Arc<(Mutex<SurfaceState>, Condvar)>,
}

impl InMemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest presented frame.
    pub fn latest(&self) -> Option<RgbaImage> {
        lock(&self.shared.0).latest.clone()
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> usize {
        lock(&self.shared.0).presented
    }

    /// Block until at least `count` frames were presented or `timeout` elapses.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let (state, cvar) = &*self.shared;
        let guard = lock(state);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |s| s.presented < count)
            .unwrap_or_else(PoisonError::into_inner);
        guard.presented >= count
    }
}

impl ChatSurface for InMemorySurface {
    fn present(&mut self, frame: &RgbaImage) -> ChatResult<()> {
        let (state, cvar) = &*self.shared;
        let mut s = lock(state);
        s.latest = Some(frame.clone());
        s.presented += 1;
        cvar.notify_all();
        Ok(())
    }
}

/// Dedicated thread owning a [`ChatReplay`].
pub struct RenderWorker;

impl RenderWorker {
    /// Start the worker. It is the only code touching `replay` until the handle is shut down.
    pub fn spawn(
        mut replay: ChatReplay,
        mut surface: impl ChatSurface + 'static,
        opts: WorkerOpts,
    ) -> ChatResult<ReplayHandle> {
        let mailbox = Arc::new(Mailbox::new());
        let inbox = Arc::clone(&mailbox);
        let worker = std::thread::Builder::new()
            .name(opts.thread_name.clone())
            .spawn(move || {
                tracing::info!(thread = %opts.thread_name, "render worker started");
                while let Some(msg) = inbox.recv() {
                    match msg {
                        ChatMsg::Seek(t) => replay.seek(t),
                        ChatMsg::Tick(t) => {
                            let frame = replay.draw(t);
                            if let Err(err) = surface.present(frame) {
                                tracing::warn!(%err, "chat surface rejected frame");
                            }
                            std::thread::sleep(opts.tick);
                        }
                    }
                }
                tracing::info!("render worker stopped");
            })
            .context("spawn render worker")?;

        Ok(ReplayHandle {
            mailbox,
            worker: Some(worker),
        })
    }
}

/// Control side of a running [`RenderWorker`]. Dropping it stops and joins the worker.
pub struct ReplayHandle {
    mailbox: Arc<Mailbox>,
    worker: Option<JoinHandle<()>>,
}

impl ReplayHandle {
    /// Ask for a frame at playback time `t`. Never blocks; an undrawn earlier request is replaced.
    pub fn post_timestamp(&self, t: f64) {
        self.mailbox.post(ChatMsg::Tick(t));
    }

    /// Ask the worker to restart from `t` before drawing again.
    pub fn seek(&self, t: f64) {
        self.mailbox.post(ChatMsg::Seek(t));
    }

    /// Stop the worker after its current cycle and wait for it.
    pub fn shutdown(mut self) -> ChatResult<()> {
        self.stop()
    }

    fn stop(&mut self) -> ChatResult<()> {
        self.mailbox.close();
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| ChatError::validation("render worker panicked")),
            None => Ok(()),
        }
    }
}

impl Drop for ReplayHandle {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(%err, "render worker did not stop cleanly");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
