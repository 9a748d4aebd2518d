//! Contact service layer.
//!
//! HTTP handlers talk to a [`ContactService`]. [`StoreService`] is the plain
//! implementation over a [`ContactStore`]; [`ReportingService`] wraps any
//! service and reports every failure before handing it back unchanged.

use crate::{Contact, ContactId, ContactStore, DomainError, DomainResult};
use std::fmt;
use std::sync::Arc;

/// Application-level contact operations.
pub trait ContactService: Send + Sync + 'static {
    /// Creates a contact and returns its ID.
    fn create(&self, contact: Contact) -> DomainResult<ContactId>;

    /// Returns the contact with the given ID.
    fn read(&self, id: ContactId) -> DomainResult<Contact>;

    /// Replaces the contact with the given ID.
    fn update(&self, id: ContactId, contact: Contact) -> DomainResult<()>;

    /// Removes the contact with the given ID.
    fn delete(&self, id: ContactId) -> DomainResult<()>;

    /// Returns up to `limit` contacts starting at `offset`.
    fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<Contact>>;
}

/// [`ContactService`] that delegates every call to a [`ContactStore`].
#[derive(Debug)]
pub struct StoreService<S> {
    store: S,
}

impl<S: ContactStore> StoreService<S> {
    /// Creates a service backed by `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ContactStore> ContactService for StoreService<S> {
    fn create(&self, contact: Contact) -> DomainResult<ContactId> {
        self.store.create(contact)
    }

    fn read(&self, id: ContactId) -> DomainResult<Contact> {
        self.store.read(id)
    }

    fn update(&self, id: ContactId, contact: Contact) -> DomainResult<()> {
        self.store.update(id, contact)
    }

    fn delete(&self, id: ContactId) -> DomainResult<()> {
        self.store.delete(id)
    }

    fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<Contact>> {
        self.store.list(offset, limit)
    }
}

/// Callback invoked with each error a [`ReportingService`] observes.
pub type ErrorReporter = Arc<dyn Fn(&DomainError) + Send + Sync>;

/// Wraps a [`ContactService`] and reports every failed call.
///
/// The reporter runs synchronously on the calling task, so it observes the
/// caller's current `tracing` span.
///
/// # Example
///
/// ```
/// use rolodex_core::{ContactId, ContactService, MemoryStore, ReportingService, StoreService};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = seen.clone();
/// let service = ReportingService::new(
///     StoreService::new(MemoryStore::new()),
///     Arc::new(move |_err: &rolodex_core::DomainError| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }),
/// );
///
/// assert!(service.read(ContactId::new()).is_err());
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct ReportingService<S> {
    inner: S,
    reporter: ErrorReporter,
}

impl<S: ContactService> ReportingService<S> {
    /// Wraps `inner`, sending its errors to `reporter`.
    pub fn new(inner: S, reporter: ErrorReporter) -> Self {
        Self { inner, reporter }
    }

    /// Wraps `inner` with a reporter that logs each error at error level.
    pub fn logging(inner: S) -> Self {
        Self::new(
            inner,
            Arc::new(|err: &DomainError| {
                tracing::error!(error = %err, "service error");
            }),
        )
    }

    fn report<T>(&self, result: DomainResult<T>) -> DomainResult<T> {
        if let Err(err) = &result {
            (self.reporter)(err);
        }
        result
    }
}

impl<S> fmt::Debug for ReportingService<S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportingService")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S: ContactService> ContactService for ReportingService<S> {
    fn create(&self, contact: Contact) -> DomainResult<ContactId> {
        self.report(self.inner.create(contact))
    }

    fn read(&self, id: ContactId) -> DomainResult<Contact> {
        self.report(self.inner.read(id))
    }

    fn update(&self, id: ContactId, contact: Contact) -> DomainResult<()> {
        self.report(self.inner.update(id, contact))
    }

    fn delete(&self, id: ContactId) -> DomainResult<()> {
        self.report(self.inner.delete(id))
    }

    fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<Contact>> {
        self.report(self.inner.list(offset, limit))
    }
}

impl<T: ContactService + ?Sized> ContactService for Arc<T> {
    fn create(&self, contact: Contact) -> DomainResult<ContactId> {
        (**self).create(contact)
    }

    fn read(&self, id: ContactId) -> DomainResult<Contact> {
        (**self).read(id)
    }

    fn update(&self, id: ContactId, contact: Contact) -> DomainResult<()> {
        (**self).update(id, contact)
    }

    fn delete(&self, id: ContactId) -> DomainResult<()> {
        (**self).delete(id)
    }

    fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<Contact>> {
        (**self).list(offset, limit)
    }
}
