//! Ordering guarantees of the message buffer across attach points.
use std::sync::{Arc, Mutex};

use tandem_session::{EventKind, MessageBuffer, SessionEvent};
use uuid::Uuid;

fn ids(view: &[SessionEvent]) -> Vec<Uuid> {
    view.iter().map(SessionEvent::id).collect()
}

/// For every attach point: the first delivery equals the snapshot at attach
/// time, and each later delivery extends the previous one by exactly the
/// newly appended event (modulo eviction at the head).
#[test]
fn every_attach_point_sees_snapshot_then_each_append() {
    const TOTAL: usize = 12;
    const CAPACITY: usize = 5;

    for attach_at in 0..=TOTAL {
        let buffer = MessageBuffer::new(CAPACITY);
        let mut appended: Vec<SessionEvent> = Vec::new();
        let deliveries: Arc<Mutex<Vec<Vec<Uuid>>>> = Arc::default();

        let mut sub = None;
        for i in 0..TOTAL {
            if i == attach_at {
                let sink = deliveries.clone();
                sub = Some(buffer.subscribe(move |view| {
                    sink.lock().unwrap().push(ids(view));
                    Ok(())
                }));
            }
            let ev = SessionEvent::new(EventKind::Assistant, format!("e{i}"));
            appended.push(ev.clone());
            buffer.append(ev);
        }
        if attach_at == TOTAL {
            let sink = deliveries.clone();
            sub = Some(buffer.subscribe(move |view| {
                sink.lock().unwrap().push(ids(view));
                Ok(())
            }));
        }

        let deliveries = deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), TOTAL - attach_at + 1, "attach_at={attach_at}");

        for (n, delivered) in deliveries.iter().enumerate() {
            let upto = attach_at + n;
            let start = upto.saturating_sub(CAPACITY);
            let expected: Vec<Uuid> = appended[start..upto].iter().map(SessionEvent::id).collect();
            assert_eq!(delivered, &expected, "attach_at={attach_at} delivery={n}");
        }

        if let Some(sub) = sub {
            sub.unsubscribe();
        }
    }
}

#[test]
fn two_subscribers_observe_the_same_order() {
    let buffer = MessageBuffer::new(100);
    let a: Arc<Mutex<Vec<Uuid>>> = Arc::default();
    let b: Arc<Mutex<Vec<Uuid>>> = Arc::default();

    let sink = a.clone();
    let _sa = buffer.subscribe(move |view| {
        *sink.lock().unwrap() = ids(view);
        Ok(())
    });
    let sink = b.clone();
    let _sb = buffer.subscribe(move |view| {
        *sink.lock().unwrap() = ids(view);
        Ok(())
    });

    for i in 0..20 {
        buffer.append(SessionEvent::user(format!("u{i}")));
    }
    assert_eq!(*a.lock().unwrap(), *b.lock().unwrap());
    assert_eq!(a.lock().unwrap().len(), 20);
}
