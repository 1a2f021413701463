// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Single-worker message queue.
//!
//! Messages are handled strictly in arrival order on one background thread,
//! so handlers never run concurrently and the graph needs no per-operation
//! locking beyond the session mutex. Enqueueing never blocks on handling.

use std::collections::{BTreeSet, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::protocol::{Action, Message, Response};

/// Handles one message and produces its response.
pub type Handler = Arc<dyn Fn(&Message) -> Response + Send + Sync>;

/// Receives every response, in handling order.
pub type Callback = Arc<dyn Fn(Response) + Send + Sync>;

/// Payload key tracking how often a message has been re-enqueued.
pub const RETRY_COUNT_KEY: &str = "_retry";

/// A failed retryable message is re-enqueued at most this often.
pub const MAX_RETRIES: u64 = 1;

const RETRY_DELAY: Duration = Duration::from_millis(200);
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<Message>,
    running: bool,
    worker_alive: bool,
}

#[derive(Debug)]
struct QueueInner {
    state: Mutex<QueueState>,
    cv: Condvar,
}

/// FIFO queue with one worker thread and an optional failure-retry policy.
pub struct MessageQueue {
    inner: Arc<QueueInner>,
    retry_actions: BTreeSet<Action>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::with_retry_actions(BTreeSet::new())
    }

    /// Failed messages whose action is in `retry_actions` are re-enqueued
    /// once after a short delay.
    pub fn with_retry_actions(retry_actions: BTreeSet<Action>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                cv: Condvar::new(),
            }),
            retry_actions,
            worker: Mutex::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().expect("queue lock poisoned").queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().expect("queue lock poisoned").running
    }

    /// Append a message. Never blocks on handling; accepted even while the
    /// worker is stopped (the backlog drains on the next `start`).
    pub fn enqueue(&self, message: Message) {
        let mut state = self.inner.state.lock().expect("queue lock poisoned");
        state.queue.push_back(message);
        self.inner.cv.notify_one();
    }

    /// Start the worker. A previous worker, if any, is stopped first; the
    /// queued backlog survives the restart.
    pub fn start(&self, handler: Handler, callback: Callback) {
        self.shutdown_worker();

        {
            let mut state = self.inner.state.lock().expect("queue lock poisoned");
            state.running = true;
            state.worker_alive = true;
        }

        let inner = self.inner.clone();
        let retry_actions = self.retry_actions.clone();
        let handle = std::thread::Builder::new()
            .name("naiad-dispatch".to_owned())
            .spawn(move || run_worker(inner, retry_actions, handler, callback))
            .expect("spawn dispatch worker thread");

        *self.worker.lock().expect("queue worker handle poisoned") = Some(handle);
    }

    /// Stop the worker and drop any unhandled backlog. The in-flight message,
    /// if any, finishes and its response is still delivered.
    pub fn stop(&self) {
        self.shutdown_worker();
        self.inner
            .state
            .lock()
            .expect("queue lock poisoned")
            .queue
            .clear();
    }

    fn shutdown_worker(&self) {
        {
            let mut state = self.inner.state.lock().expect("queue lock poisoned");
            if !state.running && !state.worker_alive {
                return;
            }
            state.running = false;
        }
        self.inner.cv.notify_all();

        let deadline = Instant::now() + STOP_JOIN_TIMEOUT;
        let mut state = self.inner.state.lock().expect("queue lock poisoned");
        while state.worker_alive {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let (next, _timeout) = self
                .inner
                .cv
                .wait_timeout(state, deadline - now)
                .expect("queue cv poisoned");
            state = next;
        }
        let worker_exited = !state.worker_alive;
        drop(state);

        let handle = self.worker.lock().expect("queue worker handle poisoned").take();
        if let Some(handle) = handle {
            if worker_exited {
                let _ = handle.join();
            }
            // A stuck worker is detached rather than joined forever.
        }
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

fn retry_count(message: &Message) -> u64 {
    message
        .payload
        .get(RETRY_COUNT_KEY)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

fn run_worker(
    inner: Arc<QueueInner>,
    retry_actions: BTreeSet<Action>,
    handler: Handler,
    callback: Callback,
) {
    loop {
        let message = {
            let mut state = inner.state.lock().expect("queue lock poisoned");
            loop {
                if !state.running {
                    state.worker_alive = false;
                    inner.cv.notify_all();
                    return;
                }
                if let Some(message) = state.queue.pop_front() {
                    break message;
                }
                state = inner.cv.wait(state).expect("queue cv poisoned");
            }
        };

        // A panicking handler fails the message instead of killing the worker.
        let response = match catch_unwind(AssertUnwindSafe(|| handler(&message))) {
            Ok(response) => response,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_owned());
                log::error!(
                    "handler panicked on {} ({}): {detail}",
                    message.action,
                    message.message_id
                );
                Response::failed(message.action, format!("handler panicked: {detail}"))
            }
        };

        let failed = response.error.is_some();
        callback(response);

        if failed && retry_actions.contains(&message.action) && retry_count(&message) < MAX_RETRIES
        {
            std::thread::sleep(RETRY_DELAY);

            let mut retry = message.retry();
            retry.payload.insert(
                RETRY_COUNT_KEY.to_owned(),
                Value::from(retry_count(&message) + 1),
            );

            let mut state = inner.state.lock().expect("queue lock poisoned");
            // Discard the retry if the queue stopped during the delay.
            if state.running {
                state.queue.push_back(retry);
            }
        }
    }
}
