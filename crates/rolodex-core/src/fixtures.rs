//! Conformance checks for [`ContactStore`] and [`ContactService`]
//! implementations.
//!
//! Each check drives an implementation through a full create, read, update,
//! list and delete cycle and panics with a descriptive message on the first
//! deviation. Call them from the implementation's own tests.

use crate::{Contact, ContactId, ContactService, ContactStore, DomainError};
use chrono::NaiveDate;

fn sample(firstname: &str) -> Contact {
    let birthday = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap_or_default();
    Contact::new(firstname, "smith", birthday)
}

/// Runs the store conformance cycle against an empty `store`.
pub fn exercise_store<S: ContactStore + ?Sized>(store: &S) {
    let id = store.create(sample("john")).expect("create");
    assert!(!id.is_nil(), "create must assign an id");

    let read = store.read(id).expect("read after create");
    assert_eq!(read.id, id, "read must return the stored id");
    assert_eq!(read.firstname, "john");

    store.update(id, sample("jane")).expect("update");
    let read = store.read(id).expect("read after update");
    assert_eq!(read.firstname, "jane", "update must replace the contact");
    assert_eq!(read.id, id, "update must keep the id");

    let second = store.create(sample("jim")).expect("second create");
    assert_ne!(id, second, "ids must be unique");
    let listed: Vec<ContactId> = store
        .list(0, 10)
        .expect("list")
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(listed, vec![id, second], "list must follow creation order");
    assert_eq!(store.list(1, 1).expect("paged list").len(), 1);

    store.delete(id).expect("delete");
    assert_eq!(store.read(id), Err(DomainError::NotFound));
    assert_eq!(store.delete(id), Err(DomainError::NotFound));
    assert_eq!(store.update(id, sample("x")), Err(DomainError::NotFound));
    store.delete(second).expect("delete second");
}

/// Runs the service conformance cycle against a service over an empty store.
pub fn exercise_service<S: ContactService + ?Sized>(service: &S) {
    let id = service.create(sample("john")).expect("create");
    assert_eq!(service.read(id).expect("read").firstname, "john");

    service.update(id, sample("jane")).expect("update");
    assert_eq!(service.read(id).expect("read").firstname, "jane");
    assert_eq!(service.list(0, 100).expect("list").len(), 1);

    service.delete(id).expect("delete");
    assert_eq!(service.read(id), Err(DomainError::NotFound));
}
