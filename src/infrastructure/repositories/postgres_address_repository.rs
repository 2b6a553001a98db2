use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use super::postgres_transaction::PostgresTransaction;
use super::postgres_versioned_rows::PgVersionedRows;
use crate::domain::address::Address;
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::owner::OwnerRef;
use crate::domain::repositories::AddressRepository;
use crate::domain::status::EntityStatus;
use crate::domain::validation::{require_id, Validate};
use crate::domain::versioning::{self, StatusChange};

const ADDRESS_COLUMNS: &str = "id, user_id, client_id, supplier_id, street, number, complement, \
     district, city, state, country, postal_code, status, version, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i64,
    user_id: Option<i64>,
    client_id: Option<i64>,
    supplier_id: Option<i64>,
    street: String,
    number: Option<String>,
    complement: Option<String>,
    district: Option<String>,
    city: String,
    state: String,
    country: String,
    postal_code: String,
    status: EntityStatus,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = StoreError;

    fn try_from(r: AddressRow) -> Result<Self, Self::Error> {
        let owner = OwnerRef::from_columns("address", r.user_id, r.client_id, r.supplier_id)?;
        Ok(Address {
            id: r.id,
            owner: Some(owner),
            street: r.street,
            number: r.number,
            complement: r.complement,
            district: r.district,
            city: r.city,
            state: r.state,
            country: r.country,
            postal_code: r.postal_code,
            status: r.status,
            version: r.version,
            created_at: Some(r.created_at),
            updated_at: Some(r.updated_at),
        })
    }
}

fn owner_columns(address: &Address) -> StoreResult<(Option<i64>, Option<i64>, Option<i64>)> {
    address
        .owner
        .map(|owner| owner.columns())
        .ok_or_else(|| StoreError::invalid("address", "an owner reference is required"))
}

async fn insert_address<'e, E>(executor: E, address: &Address) -> StoreResult<Address>
where
    E: PgExecutor<'e>,
{
    let (user_id, client_id, supplier_id) = owner_columns(address)?;
    let sql = format!(
        r#"
        INSERT INTO addresses (
            user_id, client_id, supplier_id, street, number, complement,
            district, city, state, country, postal_code, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {}
        "#,
        ADDRESS_COLUMNS
    );

    let row = sqlx::query_as::<_, AddressRow>(&sql)
        .bind(user_id)
        .bind(client_id)
        .bind(supplier_id)
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.complement)
        .bind(&address.district)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .bind(address.status)
        .fetch_one(executor)
        .await
        .map_err(|e| StoreError::create("address", e))?;

    row.try_into()
}

/// PostgreSQL implementation of AddressRepository
pub struct PostgresAddressRepository {
    pool: PgPool,
    rows: PgVersionedRows,
}

impl PostgresAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            rows: PgVersionedRows::new(pool.clone(), "addresses", "address"),
            pool,
        }
    }
}

#[async_trait]
impl AddressRepository<PostgresTransaction> for PostgresAddressRepository {
    async fn create(&self, address: &Address) -> StoreResult<Address> {
        address.validate()?;
        insert_address(&self.pool, address).await
    }

    async fn create_tx(
        &self,
        tx: &mut PostgresTransaction,
        address: &Address,
    ) -> StoreResult<Address> {
        address.validate()?;
        insert_address(tx.conn()?, address).await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Address>> {
        require_id("address", id)?;
        let sql = format!("SELECT {} FROM addresses WHERE id = $1", ADDRESS_COLUMNS);
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::query("address", e))?;

        row.map(Address::try_from).transpose()
    }

    async fn update(&self, address: &Address) -> StoreResult<Address> {
        require_id("address", address.id)?;
        address.validate()?;
        let (user_id, client_id, supplier_id) = owner_columns(address)?;

        let sql = format!(
            r#"
            UPDATE addresses
            SET user_id = $3, client_id = $4, supplier_id = $5,
                street = $6, number = $7, complement = $8, district = $9,
                city = $10, state = $11, country = $12, postal_code = $13,
                version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(address.id)
            .bind(address.version)
            .bind(user_id)
            .bind(client_id)
            .bind(supplier_id)
            .bind(&address.street)
            .bind(&address.number)
            .bind(&address.complement)
            .bind(&address.district)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.country)
            .bind(&address.postal_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::update("address", e))?;

        match row {
            Some(row) => row.try_into(),
            None => Err(
                versioning::settle_missed_swap(&self.rows, address.id, address.version).await,
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
