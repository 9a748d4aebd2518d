//! Contact storage.

use crate::{Contact, ContactId, DomainError, DomainResult};
use indexmap::IndexMap;
use parking_lot::Mutex;

/// Storage backend for contacts.
///
/// Implementations must be safe to share between request tasks. Every
/// lookup by ID returns [`DomainError::NotFound`] when the ID is absent.
pub trait ContactStore: Send + Sync + 'static {
    /// Stores a new contact and returns its freshly assigned ID.
    ///
    /// Any ID already present on `contact` is ignored.
    fn create(&self, contact: Contact) -> DomainResult<ContactId>;

    /// Returns the contact with the given ID.
    fn read(&self, id: ContactId) -> DomainResult<Contact>;

    /// Replaces the contact with the given ID.
    fn update(&self, id: ContactId, contact: Contact) -> DomainResult<()>;

    /// Removes the contact with the given ID.
    fn delete(&self, id: ContactId) -> DomainResult<()>;

    /// Returns up to `limit` contacts starting at `offset`, in creation order.
    fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<Contact>>;
}

/// Volatile, in-process [`ContactStore`].
///
/// Contacts are kept in insertion order behind a single mutex.
///
/// # Example
///
/// ```
/// use rolodex_core::{Contact, ContactStore, MemoryStore};
/// use chrono::NaiveDate;
///
/// let store = MemoryStore::new();
/// let birthday = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
/// let id = store.create(Contact::new("john", "smith", birthday)).unwrap();
/// assert_eq!(store.read(id).unwrap().lastname, "smith");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    contacts: Mutex<IndexMap<ContactId, Contact>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the given contacts.
    pub fn with_contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let store = Self::new();
        {
            let mut map = store.contacts.lock();
            for mut contact in contacts {
                let id = fresh_id(&map);
                contact.id = id;
                map.insert(id, contact);
            }
        }
        store
    }

    /// Returns the number of stored contacts.
    pub fn len(&self) -> usize {
        self.contacts.lock().len()
    }

    /// Returns `true` if the store holds no contacts.
    pub fn is_empty(&self) -> bool {
        self.contacts.lock().is_empty()
    }
}

fn fresh_id(map: &IndexMap<ContactId, Contact>) -> ContactId {
    loop {
        let id = ContactId::new();
        if !map.contains_key(&id) {
            return id;
        }
    }
}

impl ContactStore for MemoryStore {
    fn create(&self, mut contact: Contact) -> DomainResult<ContactId> {
        let mut map = self.contacts.lock();
        let id = fresh_id(&map);
        contact.id = id;
        map.insert(id, contact);
        Ok(id)
    }

    fn read(&self, id: ContactId) -> DomainResult<Contact> {
        self.contacts
            .lock()
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    fn update(&self, id: ContactId, mut contact: Contact) -> DomainResult<()> {
        let mut map = self.contacts.lock();
        let slot = map.get_mut(&id).ok_or(DomainError::NotFound)?;
        contact.id = id;
        *slot = contact;
        Ok(())
    }

    fn delete(&self, id: ContactId) -> DomainResult<()> {
        self.contacts
            .lock()
            .shift_remove(&id)
            .map(|_| ())
            .ok_or(DomainError::NotFound)
    }

    fn list(&self, offset: usize, limit: usize) -> DomainResult<Vec<Contact>> {
        Ok(self
            .contacts
            .lock()
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
