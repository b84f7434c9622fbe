// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Capacity-bounded event log with synchronous fan-out.
//!
//! ```text
//!   agent / arbiter ── append ──► MessageBuffer ──► subscriber 1 (local view)
//!                                       │      └──► subscriber 2 (remote relay)
//!                                       └ oldest evicted past capacity
//! ```
//!
//! Every subscriber receives the full ordered view, first once on attach and
//! then after every `append`.  Callbacks run with the buffer unlocked, so a
//! callback may append, take a snapshot or unsubscribe (itself included).
//! Only one thread delivers at a time: an `append` made while a delivery is
//! running bumps the sequence number and the running delivery loop picks it
//! up, so a subscriber may see two appends folded into one view but never an
//! older view after a newer one.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::warn;

use crate::SessionEvent;

pub const DEFAULT_CAPACITY: usize = 1000;

type Callback = Box<dyn FnMut(&[SessionEvent]) -> anyhow::Result<()> + Send>;

struct Slot {
    id: u64,
    /// `None` while the callback is out being run.
    callback: Option<Callback>,
    /// Sequence number of the last view handed to this subscriber.
    seen: Option<u64>,
}

impl Slot {
    fn wants(&self, seq: u64) -> bool {
        self.callback.is_some() && self.seen.map_or(true, |n| n < seq)
    }
}

struct Inner {
    events: VecDeque<SessionEvent>,
    capacity: usize,
    /// Bumped on every append.
    seq: u64,
    subscribers: Vec<Slot>,
    next_subscriber_id: u64,
    delivering: bool,
    view: Option<(u64, Arc<[SessionEvent]>)>,
}

impl Inner {
    fn current_view(&mut self) -> Arc<[SessionEvent]> {
        match &self.view {
            Some((seq, view)) if *seq == self.seq => view.clone(),
            _ => {
                let view: Arc<[SessionEvent]> = self.events.iter().cloned().collect();
                self.view = Some((self.seq, view.clone()));
                view
            }
        }
    }
}

/// Shared handle to the session's event log.  Cloning is cheap.
#[derive(Clone)]
pub struct MessageBuffer {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MessageBuffer {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                events: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                capacity,
                seq: 0,
                subscribers: Vec::new(),
                next_subscriber_id: 0,
                delivering: false,
                view: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    /// Append to the tail, evict from the head past capacity, then notify.
    pub fn append(&self, event: SessionEvent) {
        let mut inner = self.lock();
        inner.events.push_back(event);
        while inner.events.len() > inner.capacity {
            inner.events.pop_front();
        }
        inner.seq += 1;
        self.deliver(inner);
    }

    /// Register `callback`.  It is invoked once with the current snapshot and
    /// then after every subsequent [`append`](Self::append).  The first call
    /// happens before `subscribe` returns unless another thread is delivering
    /// at the same moment, in which case that thread makes it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&[SessionEvent]) -> anyhow::Result<()> + Send + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        inner.subscribers.push(Slot { id, callback: Some(Box::new(callback)), seen: None });
        self.deliver(inner);

        Subscription { id, buffer: Arc::downgrade(&self.inner) }
    }

    /// Run the delivery loop unless one is already running, in which case it
    /// will see whatever the caller just changed.
    fn deliver<'a>(&'a self, mut inner: MutexGuard<'a, Inner>) {
        if inner.delivering {
            return;
        }
        inner.delivering = true;

        loop {
            let seq = inner.seq;
            let Some(pos) = inner.subscribers.iter().position(|s| s.wants(seq)) else {
                inner.delivering = false;
                return;
            };
            let view = inner.current_view();
            let slot = &mut inner.subscribers[pos];
            slot.seen = Some(seq);
            let id = slot.id;
            let Some(mut callback) = slot.callback.take() else {
                continue;
            };
            drop(inner);

            match panic::catch_unwind(AssertUnwindSafe(|| callback(&view[..]))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(subscriber = id, "session subscriber failed: {e:#}"),
                Err(payload) => {
                    warn!(subscriber = id, "session subscriber panicked: {}", panic_message(&*payload))
                }
            }

            inner = self.lock();
            // Gone if it unsubscribed during the call; the callback is then
            // dropped after the lock is released.
            let leftover = match inner.subscribers.iter_mut().find(|s| s.id == id) {
                Some(slot) => {
                    slot.callback = Some(callback);
                    None
                }
                None => Some(callback),
            };
            if leftover.is_some() {
                drop(inner);
                drop(leftover);
                inner = self.lock();
            }
        }
    }

    /// Copy of the current ordered view.
    pub fn snapshot(&self) -> Vec<SessionEvent> {
        self.lock().events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poison| poison.into_inner())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Handle returned by [`MessageBuffer::subscribe`].
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe) explicitly.
#[derive(Debug, Default)]
pub struct Subscription {
    id: u64,
    buffer: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Stop receiving updates.  Idempotent, safe from inside the subscriber's
    /// own callback, and a no-op on a default (never attached) handle or after
    /// the buffer itself is gone.
    pub fn unsubscribe(&self) {
        let Some(inner) = self.buffer.upgrade() else {
            return;
        };
        let removed = {
            let mut inner = lock_inner(&inner);
            let pos = inner.subscribers.iter().position(|s| s.id == self.id);
            pos.map(|pos| inner.subscribers.remove(pos))
        };
        // A callback may hold resources whose drop touches the buffer.
        drop(removed);
    }
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("events", &self.events.len())
            .field("capacity", &self.capacity)
            .field("seq", &self.seq)
            .field("subscribers", &self.subscribers.len())
            .field("delivering", &self.delivering)
            .finish()
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(view: &[SessionEvent]) -> Vec<String> {
        view.iter().map(|e| e.content().to_string()).collect()
    }

    fn recorder(buffer: &MessageBuffer) -> (Subscription, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = buffer.subscribe(move |view| {
            sink.lock().unwrap().push(contents(view));
            Ok(())
        });
        (sub, seen)
    }

    #[test]
    fn late_subscriber_gets_snapshot_then_updates() {
        let buffer = MessageBuffer::new(10);
        buffer.append(SessionEvent::user("hi"));
        let (_sub, seen) = recorder(&buffer);
        buffer.append(SessionEvent::assistant("hello"));

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![vec!["hi".to_string()], vec!["hi".into(), "hello".into()]]);
    }

    #[test]
    fn subscriber_on_empty_buffer_gets_empty_snapshot() {
        let buffer = MessageBuffer::new(10);
        let (_sub, seen) = recorder(&buffer);
        assert_eq!(*seen.lock().unwrap(), vec![Vec::<String>::new()]);
    }

    #[test]
    fn eviction_keeps_most_recent() {
        let buffer = MessageBuffer::new(3);
        for i in 0..5 {
            buffer.append(SessionEvent::user(format!("m{i}")));
        }
        assert_eq!(contents(&buffer.snapshot()), vec!["m2", "m3", "m4"]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let buffer = MessageBuffer::new(0);
        buffer.append(SessionEvent::user("a"));
        buffer.append(SessionEvent::user("b"));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(contents(&buffer.snapshot()), vec!["b"]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let buffer = MessageBuffer::new(10);
        let (sub, seen) = recorder(&buffer);
        sub.unsubscribe();
        sub.unsubscribe();
        buffer.append(SessionEvent::user("ignored"));
        assert_eq!(seen.lock().unwrap().len(), 1, "only the attach snapshot");
        assert_eq!(buffer.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_on_detached_handle_is_noop() {
        Subscription::default().unsubscribe();

        let buffer = MessageBuffer::new(1);
        let (sub, _) = recorder(&buffer);
        drop(buffer);
        sub.unsubscribe();
    }

    #[test]
    fn failing_subscriber_does_not_block_others() {
        let buffer = MessageBuffer::new(10);
        let _bad = buffer.subscribe(|_| anyhow::bail!("renderer gone"));
        let (_good, seen) = recorder(&buffer);

        buffer.append(SessionEvent::user("x"));
        buffer.append(SessionEvent::user("y"));

        assert_eq!(seen.lock().unwrap().last().unwrap(), &vec!["x".to_string(), "y".into()]);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.subscriber_count(), 2);
    }

    #[test]
    fn unsubscribe_from_own_callback_does_not_block_append() {
        use std::sync::mpsc;
        use std::time::Duration;

        let (done_tx, done_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let buffer = MessageBuffer::new(10);
            let handle: Arc<Mutex<Option<Subscription>>> = Arc::default();
            let calls = Arc::new(Mutex::new(0usize));

            let (h, c) = (handle.clone(), calls.clone());
            let sub = buffer.subscribe(move |_| {
                let mut calls = c.lock().unwrap();
                *calls += 1;
                if *calls == 2 {
                    if let Some(sub) = h.lock().unwrap().as_ref() {
                        sub.unsubscribe();
                    }
                }
                Ok(())
            });
            *handle.lock().unwrap() = Some(sub);

            buffer.append(SessionEvent::user("a"));
            buffer.append(SessionEvent::user("b"));
            let _ = done_tx.send((*calls.lock().unwrap(), buffer.subscriber_count(), buffer.len()));
        });

        let (calls, subscribers, len) =
            done_rx.recv_timeout(Duration::from_secs(5)).expect("append must return");
        assert_eq!(calls, 2, "attach snapshot plus the first append");
        assert_eq!(subscribers, 0);
        assert_eq!(len, 2);
    }

    #[test]
    fn append_from_callback_is_delivered_after_the_current_view() {
        let buffer = MessageBuffer::new(10);
        let inner = buffer.clone();
        let _echo = buffer.subscribe(move |view| {
            if view.last().is_some_and(|e| e.content() == "ping") {
                inner.append(SessionEvent::assistant("pong"));
            }
            Ok(())
        });
        let (_sub, seen) = recorder(&buffer);

        buffer.append(SessionEvent::user("ping"));

        assert_eq!(contents(&buffer.snapshot()), vec!["ping", "pong"]);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().unwrap(), &vec!["ping".to_string(), "pong".into()]);
        for pair in seen.windows(2) {
            assert!(pair[0].len() <= pair[1].len(), "views never go backwards: {seen:?}");
        }
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let buffer = MessageBuffer::new(10);
        let _bad = buffer.subscribe(|view| {
            if !view.is_empty() {
                panic!("renderer bug");
            }
            Ok(())
        });
        let (_good, seen) = recorder(&buffer);

        buffer.append(SessionEvent::user("x"));
        buffer.append(SessionEvent::user("y"));

        assert_eq!(seen.lock().unwrap().len(), 3);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.subscriber_count(), 2);
    }
}
