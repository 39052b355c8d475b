//! Gift vouchers

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};
use tracing::debug;

use crate::{
    database::{Db, amount_to_i64, try_get_amount},
    domain::{
        owners::AccountId,
        products::{
            capability::{ExtraAttrs, Product, ProductKind},
            errors::ProductError,
            records::{ProductRef, ProductTypeTag, ProductUuid},
        },
        reservations::ReservationToken,
    },
};

const GET_VOUCHER_SQL: &str = include_str!("../sql/get_voucher.sql");
const CREATE_VOUCHER_SQL: &str = include_str!("../sql/create_voucher.sql");
const DELETE_VOUCHER_SQL: &str = include_str!("../sql/delete_voucher.sql");

/// A gift voucher worth a fixed amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voucher {
    pub uuid: ProductUuid,
    pub amount: u64,
    pub created_at: Timestamp,
}

#[async_trait]
impl Product for Voucher {
    fn product_ref(&self) -> ProductRef {
        ProductRef::new(ProductTypeTag::VOUCHER, self.uuid)
    }

    fn title(&self) -> String {
        "Gift voucher".to_string()
    }

    fn description(&self) -> String {
        format!("Gift voucher worth {}", format_minor_units(self.amount))
    }

    fn cost(&self) -> u64 {
        self.amount
    }

    async fn add_to_cart(
        &self,
        _token: &ReservationToken,
        _attrs: &ExtraAttrs,
    ) -> Result<(), ProductError> {
        if self.amount == 0 {
            return Err(ProductError::Rejected(
                "voucher amount must be positive".to_string(),
            ));
        }

        Ok(())
    }

    async fn checkout_callback(&self, _token: &ReservationToken) -> Result<(), ProductError> {
        debug!(product_uuid = %self.uuid, "voucher checked out");

        Ok(())
    }

    async fn transfer_to_user(&self, _account: AccountId) -> Result<(), ProductError> {
        Ok(())
    }

    async fn delete_callback(&self, _token: &ReservationToken) -> Result<(), ProductError> {
        Ok(())
    }
}

/// Voucher records in `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgVouchers {
    db: Db,
}

impl PgVouchers {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a voucher record.
    ///
    /// # Errors
    ///
    /// Returns an error when the insert fails.
    pub async fn create_voucher(&self, amount: u64) -> Result<Voucher, ProductError> {
        let voucher = query_as::<Postgres, Voucher>(CREATE_VOUCHER_SQL)
            .bind(ProductUuid::new().into_uuid())
            .bind(amount_to_i64(amount, "amount")?)
            .fetch_one(self.db.pool())
            .await?;

        Ok(voucher)
    }
}

#[async_trait]
impl ProductKind for PgVouchers {
    fn tag(&self) -> ProductTypeTag {
        ProductTypeTag::VOUCHER
    }

    async fn load(&self, uuid: ProductUuid) -> Result<Option<Box<dyn Product>>, ProductError> {
        let voucher = query_as::<Postgres, Voucher>(GET_VOUCHER_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(voucher.map(|v| Box::new(v) as Box<dyn Product>))
    }

    async fn delete(&self, uuid: ProductUuid) -> Result<u64, ProductError> {
        let rows_affected = query(DELETE_VOUCHER_SQL)
            .bind(uuid.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for Voucher {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            amount: try_get_amount(row, "amount")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}

/// Render minor units as a decimal amount, e.g. `1250` as `12.50`.
pub(crate) fn format_minor_units(amount: u64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}
