//! Transactional in-memory store implementing every repository port.
//!
//! Writes made through `create_tx` are staged on the [`MemoryTransaction`]
//! and only become visible when it commits; a rollback or a drop discards
//! them. Ids come from a sequence that, like a database sequence, is not
//! rewound by rollbacks. Faults can be injected at each step of a saga to
//! exercise rollback paths without a database.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::address::Address;
use crate::domain::category::{UserCategoryRelation, UserContactRelation};
use crate::domain::contact::Contact;
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::repositories::{
    AddressRepository, CategoryRelationRepository, ContactRelationRepository, ContactRepository,
    Repositories, Transaction, UserRepository,
};
use crate::domain::status::EntityStatus;
use crate::domain::user::User;
use crate::domain::validation::{require_id, Validate};
use crate::domain::versioning::{
    self, StatusChange, VersionStamp, VersionedRows, VersionedStatus,
};

/// Step at which a fault can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    CreateUser,
    CreateAddress,
    CreateContact,
    CreateContactRelation,
    CreateCategoryRelation,
    Commit,
    Rollback,
}

impl FailPoint {
    fn error(self) -> StoreError {
        let reason = format!("injected failure at {:?}", self);
        match self {
            FailPoint::Begin | FailPoint::Commit | FailPoint::Rollback => {
                StoreError::transaction(reason)
            }
            FailPoint::CreateUser => StoreError::create("user", reason),
            FailPoint::CreateAddress => StoreError::create("address", reason),
            FailPoint::CreateContact => StoreError::create("contact", reason),
            FailPoint::CreateContactRelation => StoreError::create("user contact", reason),
            FailPoint::CreateCategoryRelation => StoreError::create("user category", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Fail,
    Panic,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    addresses: BTreeMap<i64, Address>,
    contacts: BTreeMap<i64, Contact>,
    categories: BTreeSet<i64>,
    user_categories: Vec<UserCategoryRelation>,
    user_contacts: Vec<UserContactRelation>,
}

enum StagedWrite {
    User(User),
    Address(Address),
    Contact(Contact),
    CategoryRelation(UserCategoryRelation),
    ContactRelation(UserContactRelation),
}

impl Tables {
    fn apply(&mut self, write: StagedWrite) {
        match write {
            StagedWrite::User(user) => {
                self.users.insert(user.id, user);
            }
            StagedWrite::Address(address) => {
                self.addresses.insert(address.id, address);
            }
            StagedWrite::Contact(contact) => {
                self.contacts.insert(contact.id, contact);
            }
            StagedWrite::CategoryRelation(relation) => self.user_categories.push(relation),
            StagedWrite::ContactRelation(relation) => self.user_contacts.push(relation),
        }
    }
}

struct Shared {
    tables: Mutex<Tables>,
    faults: Mutex<HashMap<FailPoint, Fault>>,
    next_id: AtomicI64,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    writes: AtomicUsize,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults(&self) -> MutexGuard<'_, HashMap<FailPoint, Fault>> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trip(&self, point: FailPoint) -> StoreResult<()> {
        let fault = self.faults().get(&point).copied();
        match fault {
            None => Ok(()),
            Some(Fault::Fail) => Err(point.error()),
            Some(Fault::Panic) => panic!("injected panic at {:?}", point),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn wrote(&self, count: usize) {
        self.writes.fetch_add(count, Ordering::SeqCst);
    }
}

/// Open transaction on an [`InMemoryStore`]
///
/// Dropping an unfinished transaction discards its writes and counts as a
/// rollback.
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    staged: Vec<StagedWrite>,
    finished: bool,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.finished {
            return Err(StoreError::transaction("transaction already finished"));
        }
        Ok(())
    }

    fn staged_users(&self) -> impl Iterator<Item = &User> {
        self.staged.iter().filter_map(|write| match write {
            StagedWrite::User(user) => Some(user),
            _ => None,
        })
    }

    fn has_staged_contact(&self, id: i64) -> bool {
        self.staged
            .iter()
            .any(|write| matches!(write, StagedWrite::Contact(contact) if contact.id == id))
    }

    fn has_staged_category_relation(&self, relation: &UserCategoryRelation) -> bool {
        self.staged
            .iter()
            .any(|write| matches!(write, StagedWrite::CategoryRelation(r) if r == relation))
    }

    fn has_staged_contact_relation(&self, relation: &UserContactRelation) -> bool {
        self.staged
            .iter()
            .any(|write| matches!(write, StagedWrite::ContactRelation(r) if r == relation))
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        self.shared.trip(FailPoint::Commit)?;

        let staged = std::mem::take(&mut self.staged);
        let count = staged.len();
        {
            let mut tables = self.shared.tables();
            for write in staged {
                tables.apply(write);
            }
        }
        self.finished = true;
        self.shared.committed.fetch_add(1, Ordering::SeqCst);
        self.shared.wrote(count);
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        if self.finished {
            return Ok(());
        }
        self.staged.clear();
        self.finished = true;
        self.shared.rolled_back.fetch_add(1, Ordering::SeqCst);
        self.shared.trip(FailPoint::Rollback)
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.rolled_back.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Row stored in one of the versioned tables
trait Record: Clone + Send + Sync + 'static {
    const ENTITY: &'static str;
    const CREATE: FailPoint;

    fn table(tables: &Tables) -> &BTreeMap<i64, Self>;
    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<i64, Self>;
    fn staged(self) -> StagedWrite;

    fn id(&self) -> i64;
    fn version(&self) -> i64;
    fn status(&self) -> EntityStatus;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
    fn born(&mut self, id: i64, now: DateTime<Utc>);
    fn touch(&mut self, now: DateTime<Utc>);
    fn set_status(&mut self, status: EntityStatus);
    /// Copies the columns an update is allowed to change
    fn absorb(&mut self, update: &Self);
}

macro_rules! record {
    ($ty:ty, $entity:literal, $fail:expr, $table:ident, $staged:path, |$dst:ident, $src:ident| $absorb:block) => {
        impl Record for $ty {
            const ENTITY: &'static str = $entity;
            const CREATE: FailPoint = $fail;

            fn table(tables: &Tables) -> &BTreeMap<i64, Self> {
                &tables.$table
            }

            fn table_mut(tables: &mut Tables) -> &mut BTreeMap<i64, Self> {
                &mut tables.$table
            }

            fn staged(self) -> StagedWrite {
                $staged(self)
            }

            fn id(&self) -> i64 {
                self.id
            }

            fn version(&self) -> i64 {
                self.version
            }

            fn status(&self) -> EntityStatus {
                self.status
            }

            fn updated_at(&self) -> Option<DateTime<Utc>> {
                self.updated_at
            }

            fn born(&mut self, id: i64, now: DateTime<Utc>) {
                self.id = id;
                self.version = 0;
                self.created_at = Some(now);
                self.updated_at = Some(now);
            }

            fn touch(&mut self, now: DateTime<Utc>) {
                self.version += 1;
                self.updated_at = Some(now);
            }

            fn set_status(&mut self, status: EntityStatus) {
                self.status = status;
            }

            fn absorb(&mut self, $src: &Self) {
                let $dst = self;
                $absorb
            }
        }
    };
}

record!(User, "user", FailPoint::CreateUser, users, StagedWrite::User, |dst, src| {
    dst.username = src.username.clone();
    dst.email = src.email.clone();
});

record!(
    Address,
    "address",
    FailPoint::CreateAddress,
    addresses,
    StagedWrite::Address,
    |dst, src| {
        dst.owner = src.owner;
        dst.street = src.street.clone();
        dst.number = src.number.clone();
        dst.complement = src.complement.clone();
        dst.district = src.district.clone();
        dst.city = src.city.clone();
        dst.state = src.state.clone();
        dst.country = src.country.clone();
        dst.postal_code = src.postal_code.clone();
    }
);

record!(
    Contact,
    "contact",
    FailPoint::CreateContact,
    contacts,
    StagedWrite::Contact,
    |dst, src| {
        dst.owner = src.owner;
        dst.contact_name = src.contact_name.clone();
        dst.email = src.email.clone();
        dst.phone = src.phone.clone();
        dst.cellphone = src.cellphone.clone();
    }
);

/// Repository over one versioned table of an [`InMemoryStore`]
pub struct MemoryRepository<T> {
    shared: Arc<Shared>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> MemoryRepository<T> {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            _record: PhantomData,
        }
    }

    fn insert_now(&self, record: &T) -> StoreResult<T> {
        self.shared.trip(T::CREATE)?;
        let mut row = record.clone();
        row.born(self.shared.next_id(), Utc::now());
        T::table_mut(&mut self.shared.tables()).insert(row.id(), row.clone());
        self.shared.wrote(1);
        Ok(row)
    }

    fn stage(&self, tx: &mut MemoryTransaction, record: &T) -> StoreResult<T> {
        tx.ensure_open()?;
        self.shared.trip(T::CREATE)?;
        let mut row = record.clone();
        row.born(self.shared.next_id(), Utc::now());
        tx.staged.push(row.clone().staged());
        Ok(row)
    }

    fn find(&self, id: i64) -> StoreResult<Option<T>> {
        require_id(T::ENTITY, id)?;
        Ok(T::table(&self.shared.tables()).get(&id).cloned())
    }

    /// Compare-and-swap of the mutable columns; `None` when no row matched
    fn swap_row(
        &self,
        record: &T,
        check: impl FnOnce(&Tables) -> StoreResult<()>,
    ) -> StoreResult<Option<T>> {
        let mut tables = self.shared.tables();
        check(&*tables)?;
        let swapped = match T::table_mut(&mut *tables).get_mut(&record.id()) {
            Some(row) if row.version() == record.version() => {
                row.absorb(record);
                row.touch(Utc::now());
                Some(row.clone())
            }
            _ => None,
        };
        if swapped.is_some() {
            self.shared.wrote(1);
        }
        Ok(swapped)
    }

    async fn update_row(
        &self,
        record: &T,
        check: impl FnOnce(&Tables) -> StoreResult<()> + Send,
    ) -> StoreResult<T> {
        require_id(T::ENTITY, record.id())?;
        match self.swap_row(record, check)? {
            Some(row) => Ok(row),
            None => Err(versioning::settle_missed_swap(self, record.id(), record.version()).await),
        }
    }
}

#[async_trait]
impl<T: Record> VersionedRows for MemoryRepository<T> {
    fn entity(&self) -> &'static str {
        T::ENTITY
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        Ok(T::table(&self.shared.tables()).contains_key(&id))
    }

    async fn read_status(&self, id: i64) -> StoreResult<Option<VersionedStatus>> {
        Ok(T::table(&self.shared.tables()).get(&id).map(|row| VersionedStatus {
            status: row.status(),
            stamp: VersionStamp {
                version: row.version(),
                updated_at: row.updated_at().unwrap_or_else(Utc::now),
            },
        }))
    }

    async fn swap_status(
        &self,
        id: i64,
        expected: i64,
        status: EntityStatus,
    ) -> StoreResult<Option<VersionStamp>> {
        let mut tables = self.shared.tables();
        let stamp = match T::table_mut(&mut *tables).get_mut(&id) {
            Some(row) if row.version() == expected => {
                let now = Utc::now();
                row.set_status(status);
                row.touch(now);
                Some(VersionStamp {
                    version: row.version(),
                    updated_at: now,
                })
            }
            _ => None,
        };
        if stamp.is_some() {
            self.shared.wrote(1);
        }
        Ok(stamp)
    }
}

fn unique_user(existing: &mut dyn Iterator<Item = &User>, user: &User) -> StoreResult<()> {
    for other in existing {
        if other.id == user.id {
            continue;
        }
        if other.username == user.username {
            return Err(StoreError::create(
                "user",
                format!("duplicate key: username {:?} already exists", user.username),
            ));
        }
        if other.email == user.email {
            return Err(StoreError::create(
                "user",
                format!("duplicate key: email {:?} already exists", user.email),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository<MemoryTransaction> for MemoryRepository<User> {
    async fn begin_tx(&self) -> StoreResult<MemoryTransaction> {
        self.shared.trip(FailPoint::Begin)?;
        self.shared.begun.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            staged: Vec::new(),
            finished: false,
        })
    }

    async fn create(&self, user: &User) -> StoreResult<User> {
        user.validate_for_storage()?;
        unique_user(&mut self.shared.tables().users.values(), user)?;
        self.insert_now(user)
    }

    async fn create_tx(&self, tx: &mut MemoryTransaction, user: &User) -> StoreResult<User> {
        user.validate_for_storage()?;
        {
            let tables = self.shared.tables();
            let mut existing = tables.users.values().chain(tx.staged_users());
            unique_user(&mut existing, user)?;
        }
        self.stage(tx, user)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.find(id)
    }

    async fn update(&self, user: &User) -> StoreResult<User> {
        user.validate_profile()?;
        self.update_row(user, |tables| {
            unique_user(&mut tables.users.values(), user)
                .map_err(|e| StoreError::update("user", e.to_string()))
        })
        .await
    }

    async fn disable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(self, id, EntityStatus::Disabled).await
    }

    async fn enable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(self, id, EntityStatus::Enabled).await
    }
}

#[async_trait]
impl AddressRepository<MemoryTransaction> for MemoryRepository<Address> {
    async fn create(&self, address: &Address) -> StoreResult<Address> {
        address.validate()?;
        self.insert_now(address)
    }

    async fn create_tx(&self, tx: &mut MemoryTransaction, address: &Address) -> StoreResult<Address> {
        address.validate()?;
        self.stage(tx, address)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Address>> {
        self.find(id)
    }

    async fn update(&self, address: &Address) -> StoreResult<Address> {
        address.validate()?;
        self.update_row(address, |_| Ok(())).await
    }

    async fn disable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(self, id, EntityStatus::Disabled).await
    }

    async fn enable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(self, id, EntityStatus::Enabled).await
    }
}

#[async_trait]
impl ContactRepository<MemoryTransaction> for MemoryRepository<Contact> {
    async fn create(&self, contact: &Contact) -> StoreResult<Contact> {
        contact.validate()?;
        self.insert_now(contact)
    }

    async fn create_tx(&self, tx: &mut MemoryTransaction, contact: &Contact) -> StoreResult<Contact> {
        contact.validate()?;
        self.stage(tx, contact)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Contact>> {
        self.find(id)
    }

    async fn update(&self, contact: &Contact) -> StoreResult<Contact> {
        contact.validate()?;
        self.update_row(contact, |_| Ok(())).await
    }

    async fn disable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(self, id, EntityStatus::Disabled).await
    }

    async fn enable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(self, id, EntityStatus::Enabled).await
    }
}

/// User/category join rows of an [`InMemoryStore`]
pub struct MemoryCategoryRelations {
    shared: Arc<Shared>,
}

impl MemoryCategoryRelations {
    fn check(
        &self,
        tables: &Tables,
        relation: &UserCategoryRelation,
        staged_user: bool,
        staged_duplicate: bool,
    ) -> StoreResult<()> {
        const ENTITY: &str = "user category";
        if !tables.users.contains_key(&relation.user_id) && !staged_user {
            return Err(StoreError::create(
                ENTITY,
                format!("foreign key violation: user {} does not exist", relation.user_id),
            ));
        }
        if !tables.categories.contains(&relation.category_id) {
            return Err(StoreError::create(
                ENTITY,
                format!(
                    "foreign key violation: category {} does not exist",
                    relation.category_id
                ),
            ));
        }
        if staged_duplicate || tables.user_categories.contains(relation) {
            return Err(StoreError::create(
                ENTITY,
                format!(
                    "duplicate key: user {} already has category {}",
                    relation.user_id, relation.category_id
                ),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRelationRepository<MemoryTransaction> for MemoryCategoryRelations {
    async fn create(&self, relation: &UserCategoryRelation) -> StoreResult<UserCategoryRelation> {
        relation.validate()?;
        self.shared.trip(FailPoint::CreateCategoryRelation)?;
        let mut tables = self.shared.tables();
        self.check(&tables, relation, false, false)?;
        tables.user_categories.push(*relation);
        self.shared.wrote(1);
        Ok(*relation)
    }

    async fn create_tx(
        &self,
        tx: &mut MemoryTransaction,
        relation: &UserCategoryRelation,
    ) -> StoreResult<UserCategoryRelation> {
        relation.validate()?;
        tx.ensure_open()?;
        self.shared.trip(FailPoint::CreateCategoryRelation)?;
        let staged_user = tx.staged_users().any(|u| u.id == relation.user_id);
        let staged_duplicate = tx.has_staged_category_relation(relation);
        self.check(&self.shared.tables(), relation, staged_user, staged_duplicate)?;
        tx.staged.push(StagedWrite::CategoryRelation(*relation));
        Ok(*relation)
    }

    async fn find_by_user(&self, user_id: i64) -> StoreResult<Vec<UserCategoryRelation>> {
        require_id("user", user_id)?;
        Ok(self
            .shared
            .tables()
            .user_categories
            .iter()
            .filter(|r| r.user_id == user_id)
            .copied()
            .collect())
    }
}

/// User/contact join rows of an [`InMemoryStore`]
pub struct MemoryContactRelations {
    shared: Arc<Shared>,
}

impl MemoryContactRelations {
    fn check(
        &self,
        tables: &Tables,
        relation: &UserContactRelation,
        staged_user: bool,
        staged_contact: bool,
        staged_duplicate: bool,
    ) -> StoreResult<()> {
        const ENTITY: &str = "user contact";
        if !tables.users.contains_key(&relation.user_id) && !staged_user {
            return Err(StoreError::create(
                ENTITY,
                format!("foreign key violation: user {} does not exist", relation.user_id),
            ));
        }
        if !tables.contacts.contains_key(&relation.contact_id) && !staged_contact {
            return Err(StoreError::create(
                ENTITY,
                format!(
                    "foreign key violation: contact {} does not exist",
                    relation.contact_id
                ),
            ));
        }
        if staged_duplicate || tables.user_contacts.contains(relation) {
            return Err(StoreError::create(
                ENTITY,
                format!(
                    "duplicate key: contact {} already shared with user {}",
                    relation.contact_id, relation.user_id
                ),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRelationRepository<MemoryTransaction> for MemoryContactRelations {
    async fn create(&self, relation: &UserContactRelation) -> StoreResult<UserContactRelation> {
        relation.validate()?;
        self.shared.trip(FailPoint::CreateContactRelation)?;
        let mut tables = self.shared.tables();
        self.check(&tables, relation, false, false, false)?;
        tables.user_contacts.push(*relation);
        self.shared.wrote(1);
        Ok(*relation)
    }

    async fn create_tx(
        &self,
        tx: &mut MemoryTransaction,
        relation: &UserContactRelation,
    ) -> StoreResult<UserContactRelation> {
        relation.validate()?;
        tx.ensure_open()?;
        self.shared.trip(FailPoint::CreateContactRelation)?;
        let staged_user = tx.staged_users().any(|u| u.id == relation.user_id);
        let staged_contact = tx.has_staged_contact(relation.contact_id);
        let staged_duplicate = tx.has_staged_contact_relation(relation);
        self.check(
            &self.shared.tables(),
            relation,
            staged_user,
            staged_contact,
            staged_duplicate,
        )?;
        tx.staged.push(StagedWrite::ContactRelation(*relation));
        Ok(*relation)
    }

    async fn find_by_user(&self, user_id: i64) -> StoreResult<Vec<UserContactRelation>> {
        require_id("user", user_id)?;
        Ok(self
            .shared
            .tables()
            .user_contacts
            .iter()
            .filter(|r| r.user_id == user_id)
            .copied()
            .collect())
    }
}

/// In-memory database with transaction staging and fault injection
///
/// # Example
/// ```
/// use storefront_backoffice::infrastructure::repositories::{FailPoint, InMemoryStore};
///
/// let store = InMemoryStore::with_categories([1, 2]);
/// store.fail_at(FailPoint::CreateContact);
/// assert_eq!(store.user_count(), 0);
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                faults: Mutex::new(HashMap::new()),
                next_id: AtomicI64::new(1),
                begun: AtomicUsize::new(0),
                committed: AtomicUsize::new(0),
                rolled_back: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Creates a store whose category table holds `ids`
    pub fn with_categories(ids: impl IntoIterator<Item = i64>) -> Self {
        let store = Self::new();
        store.shared.tables().categories.extend(ids);
        store
    }

    pub fn add_category(&self, id: i64) {
        self.shared.tables().categories.insert(id);
    }

    pub fn users(&self) -> MemoryRepository<User> {
        MemoryRepository::new(Arc::clone(&self.shared))
    }

    pub fn addresses(&self) -> MemoryRepository<Address> {
        MemoryRepository::new(Arc::clone(&self.shared))
    }

    pub fn contacts(&self) -> MemoryRepository<Contact> {
        MemoryRepository::new(Arc::clone(&self.shared))
    }

    pub fn category_relations(&self) -> MemoryCategoryRelations {
        MemoryCategoryRelations {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn contact_relations(&self) -> MemoryContactRelations {
        MemoryContactRelations {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn repositories(&self) -> Repositories<MemoryTransaction> {
        Repositories {
            users: Arc::new(self.users()),
            addresses: Arc::new(self.addresses()),
            contacts: Arc::new(self.contacts()),
            category_relations: Arc::new(self.category_relations()),
            contact_relations: Arc::new(self.contact_relations()),
        }
    }

    /// Makes every later pass through `point` fail with a storage error
    pub fn fail_at(&self, point: FailPoint) {
        self.shared.faults().insert(point, Fault::Fail);
    }

    /// Makes every later pass through `point` panic
    pub fn panic_at(&self, point: FailPoint) {
        self.shared.faults().insert(point, Fault::Panic);
    }

    pub fn clear_faults(&self) {
        self.shared.faults().clear();
    }

    pub fn user_count(&self) -> usize {
        self.shared.tables().users.len()
    }

    pub fn address_count(&self) -> usize {
        self.shared.tables().addresses.len()
    }

    pub fn contact_count(&self) -> usize {
        self.shared.tables().contacts.len()
    }

    pub fn category_relation_count(&self) -> usize {
        self.shared.tables().user_categories.len()
    }

    pub fn contact_relation_count(&self) -> usize {
        self.shared.tables().user_contacts.len()
    }

    /// Total rows written by commits, direct inserts and successful swaps
    pub fn writes(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    pub fn transactions_begun(&self) -> usize {
        self.shared.begun.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.shared.committed.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.shared.rolled_back.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User::new(name, format!("{}@x.com", name), "Secret123")
    }

    #[tokio::test]
    async fn staged_writes_are_invisible_until_commit() {
        let store = InMemoryStore::new();
        let users = store.users();

        let mut tx = users.begin_tx().await.unwrap();
        let created = users.create_tx(&mut tx, &user("ana")).await.unwrap();

        assert!(users.find_by_id(created.id).await.unwrap().is_none());
        tx.commit().await.unwrap();
        assert!(users.find_by_id(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryStore::new();
        let users = store.users();

        {
            let mut tx = users.begin_tx().await.unwrap();
            users.create_tx(&mut tx, &user("ana")).await.unwrap();
        }

        assert_eq!(store.user_count(), 0);
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn finished_transaction_rejects_writes() {
        let store = InMemoryStore::new();
        let users = store.users();

        let mut tx = users.begin_tx().await.unwrap();
        tx.rollback().await.unwrap();

        assert!(users.create_tx(&mut tx, &user("ana")).await.is_err());
        assert!(tx.rollback().await.is_ok());
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn duplicate_username_in_same_transaction_fails() {
        let store = InMemoryStore::new();
        let users = store.users();

        let mut tx = users.begin_tx().await.unwrap();
        users.create_tx(&mut tx, &user("ana")).await.unwrap();
        let mut twin = user("ana");
        twin.email = "other@x.com".to_string();

        let err = users.create_tx(&mut tx, &twin).await.unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }

    #[tokio::test]
    async fn category_relation_needs_existing_category() {
        let store = InMemoryStore::with_categories([1]);
        let created = store.users().create(&user("ana")).await.unwrap();
        let relations = store.category_relations();

        let missing = UserCategoryRelation {
            user_id: created.id,
            category_id: 2,
        };
        assert!(relations.create(&missing).await.is_err());

        let present = UserCategoryRelation {
            user_id: created.id,
            category_id: 1,
        };
        relations.create(&present).await.unwrap();
        assert_eq!(relations.find_by_user(created.id).await.unwrap(), vec![present]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_rollback() {
        let store = InMemoryStore::new();
        let users = store.users();

        let mut tx = users.begin_tx().await.unwrap();
        let first = users.create_tx(&mut tx, &user("ana")).await.unwrap();
        tx.rollback().await.unwrap();

        let second = users.create(&user("ana")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn injected_commit_failure_keeps_rows_out() {
        let store = InMemoryStore::new();
        let users = store.users();
        store.fail_at(FailPoint::Commit);

        let mut tx = users.begin_tx().await.unwrap();
        users.create_tx(&mut tx, &user("ana")).await.unwrap();

        assert!(tx.commit().await.is_err());
        tx.rollback().await.unwrap();
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.commits(), 0);
    }
}
