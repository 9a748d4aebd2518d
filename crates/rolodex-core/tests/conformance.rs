//! Conformance of the bundled store and service implementations.

use rolodex_core::fixtures::{exercise_service, exercise_store};
use rolodex_core::{ContactService, DomainError, MemoryStore, ReportingService, StoreService};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn memory_store_conforms() {
    exercise_store(&MemoryStore::new());
}

#[test]
fn store_service_conforms() {
    exercise_service(&StoreService::new(MemoryStore::new()));
}

#[test]
fn reporting_service_conforms_and_reports() {
    let reported = Arc::new(AtomicUsize::new(0));
    let counter = reported.clone();
    let service = ReportingService::new(
        StoreService::new(MemoryStore::new()),
        Arc::new(move |err: &DomainError| {
            assert!(err.is_not_found());
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    exercise_service(&service);
    assert_eq!(reported.load(Ordering::SeqCst), 1);
}

#[test]
fn dyn_service_conforms() {
    let service: Arc<dyn ContactService> =
        Arc::new(ReportingService::logging(StoreService::new(MemoryStore::new())));
    exercise_service(&service);
}

#[test]
fn concurrent_creates_are_all_stored() {
    let store = Arc::new(MemoryStore::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    rolodex_core::ContactStore::create(&*store, Default::default()).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.len(), 400);
}
