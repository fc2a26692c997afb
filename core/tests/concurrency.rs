//! Many workers sharing one fetcher, each on its own slot.
//!
//! The pool starts small so workers race to grow it while others are already
//! mid-call on their records.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fetch_core::{Fetcher, OutboundRequest, ResponseSink, Transport, TransportError};

/// Echoes the URL back as the body and counts calls.
#[derive(Default)]
struct Echo {
    calls: AtomicUsize,
}

impl Transport for Echo {
    fn perform(
        &self,
        request: &OutboundRequest<'_>,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
        sink.status(200);
        sink.header_line(format!("X-Url: {}\r\n", request.url).as_bytes());
        for line in request.headers {
            sink.header_line(format!("X-Seen: {line}\r\n").as_bytes());
        }
        sink.body_chunk(request.url.as_bytes());
        Ok(())
    }
}

const WORKERS: usize = 32;
const ROUNDS: u64 = 20;

#[test]
fn workers_on_distinct_slots_never_see_each_other() {
    let fetcher = Arc::new(Fetcher::with_slots(Echo::default(), 2));

    let handles: Vec<_> = (0..WORKERS)
        .map(|slot| {
            let fetcher = Arc::clone(&fetcher);
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let xid = round + 1;
                    let session = fetcher.session(slot, xid);
                    assert_eq!(session.status(), 0, "slot {slot} round {round} not reset");
                    assert_eq!(session.body(), "");

                    let url = format!("http://backend/{slot}/{round}");
                    session.header_add(&format!("X-Slot: {slot}"));
                    session.get(&url);

                    assert_eq!(session.status(), 200);
                    assert_eq!(session.body(), url);
                    assert_eq!(session.header("x-url"), Some(url));
                    assert_eq!(
                        session.header("x-seen"),
                        Some(format!("X-Slot: {slot}"))
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(fetcher.pool().capacity() >= WORKERS);
    assert!(fetcher.pool().capacity().is_power_of_two());
    assert_eq!(
        fetcher.transport().calls.load(Ordering::SeqCst),
        WORKERS * ROUNDS as usize
    );
}

#[test]
fn every_acquired_slot_records_latest_transaction() {
    let fetcher = Fetcher::with_slots(Echo::default(), 1);
    for slot in [0, 5, 17, 3, 64] {
        for xid in [10, 11, 11, 12] {
            let session = fetcher.session(slot, xid);
            assert_eq!(session.slot(), slot);
            let state = fetcher.pool().acquire(slot, xid);
            assert_eq!(state.lock().xid(), Some(xid));
        }
    }
}
