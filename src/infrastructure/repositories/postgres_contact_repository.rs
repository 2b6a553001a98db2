use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use super::postgres_transaction::PostgresTransaction;
use super::postgres_versioned_rows::PgVersionedRows;
use crate::domain::contact::Contact;
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::owner::OwnerRef;
use crate::domain::repositories::ContactRepository;
use crate::domain::status::EntityStatus;
use crate::domain::validation::{require_id, Validate};
use crate::domain::versioning::{self, StatusChange};

const CONTACT_COLUMNS: &str = "id, user_id, client_id, supplier_id, contact_name, email, phone, \
     cellphone, status, version, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i64,
    user_id: Option<i64>,
    client_id: Option<i64>,
    supplier_id: Option<i64>,
    contact_name: String,
    email: Option<String>,
    phone: Option<String>,
    cellphone: Option<String>,
    status: EntityStatus,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = StoreError;

    fn try_from(r: ContactRow) -> Result<Self, Self::Error> {
        let owner = OwnerRef::from_columns("contact", r.user_id, r.client_id, r.supplier_id)?;
        Ok(Contact {
            id: r.id,
            owner: Some(owner),
            contact_name: r.contact_name,
            email: r.email,
            phone: r.phone,
            cellphone: r.cellphone,
            status: r.status,
            version: r.version,
            created_at: Some(r.created_at),
            updated_at: Some(r.updated_at),
        })
    }
}

fn owner_columns(contact: &Contact) -> StoreResult<(Option<i64>, Option<i64>, Option<i64>)> {
    contact
        .owner
        .map(|owner| owner.columns())
        .ok_or_else(|| StoreError::invalid("contact", "an owner reference is required"))
}

async fn insert_contact<'e, E>(executor: E, contact: &Contact) -> StoreResult<Contact>
where
    E: PgExecutor<'e>,
{
    let (user_id, client_id, supplier_id) = owner_columns(contact)?;
    let sql = format!(
        r#"
        INSERT INTO contacts (
            user_id, client_id, supplier_id, contact_name, email, phone, cellphone, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        CONTACT_COLUMNS
    );

    let row = sqlx::query_as::<_, ContactRow>(&sql)
        .bind(user_id)
        .bind(client_id)
        .bind(supplier_id)
        .bind(&contact.contact_name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.cellphone)
        .bind(contact.status)
        .fetch_one(executor)
        .await
        .map_err(|e| StoreError::create("contact", e))?;

    row.try_into()
}

/// PostgreSQL implementation of ContactRepository
pub struct PostgresContactRepository {
    pool: PgPool,
    rows: PgVersionedRows,
}

impl PostgresContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            rows: PgVersionedRows::new(pool.clone(), "contacts", "contact"),
            pool,
        }
    }
}

#[async_trait]
impl ContactRepository<PostgresTransaction> for PostgresContactRepository {
    async fn create(&self, contact: &Contact) -> StoreResult<Contact> {
        contact.validate()?;
        insert_contact(&self.pool, contact).await
    }

    async fn create_tx(
        &self,
        tx: &mut PostgresTransaction,
        contact: &Contact,
    ) -> StoreResult<Contact> {
        contact.validate()?;
        insert_contact(tx.conn()?, contact).await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Contact>> {
        require_id("contact", id)?;
        let sql = format!("SELECT {} FROM contacts WHERE id = $1", CONTACT_COLUMNS);
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::query("contact", e))?;

        row.map(Contact::try_from).transpose()
    }

    async fn update(&self, contact: &Contact) -> StoreResult<Contact> {
        require_id("contact", contact.id)?;
        contact.validate()?;
        let (user_id, client_id, supplier_id) = owner_columns(contact)?;

        let sql = format!(
            r#"
            UPDATE contacts
            SET user_id = $3, client_id = $4, supplier_id = $5, contact_name = $6,
                email = $7, phone = $8, cellphone = $9,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        );
        let row = sqlx::query_as::<_, ContactRow>(&sql)
            .bind(contact.id)
            .bind(contact.version)
            .bind(user_id)
            .bind(client_id)
            .bind(supplier_id)
            .bind(&contact.contact_name)
            .bind(&contact.email)
            .bind(&contact.phone)
            .bind(&contact.cellphone)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::update("contact", e))?;

        match row {
            Some(row) => row.try_into(),
            None => Err(
                versioning::settle_missed_swap(&self.rows, contact.id, contact.version).await,
            ),
        }
    }

    async fn disable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(&self.rows, id, EntityStatus::Disabled).await
    }

    async fn enable(&self, id: i64) -> StoreResult<StatusChange> {
        versioning::set_status(&self.rows, id, EntityStatus::Enabled).await
    }
}
