//! Subscription and multi-show packages

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

const GET_PACKAGE_SQL: &str = include_str!("../sql/get_package.sql");
const CREATE_PACKAGE_SQL: &str = include_str!("../sql/create_package.sql");
const DELETE_PACKAGE_SQL: &str = include_str!("../sql/delete_package.sql");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageProduct {
    pub uuid: ProductUuid,
    pub package_no: i64,
    pub title: String,
    pub cost: u64,
    pub created_at: Timestamp,
}

#[async_trait]
impl Product for PackageProduct {
    fn product_ref(&self) -> ProductRef {
        ProductRef::new(ProductTypeTag::PACKAGE, self.uuid)
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn description(&self) -> String {
        format!("Package {} ({})", self.package_no, self.title)
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    async fn add_to_cart(
        &self,
        _token: &ReservationToken,
        _attrs: &ExtraAttrs,
    ) -> Result<(), ProductError> {
        debug!(product_uuid = %self.uuid, package_no = self.package_no, "package added");

        Ok(())
    }

    async fn checkout_callback(&self, _token: &ReservationToken) -> Result<(), ProductError> {
        Ok(())
    }

    async fn transfer_to_user(&self, _account: AccountId) -> Result<(), ProductError> {
        Ok(())
    }

    async fn delete_callback(&self, _token: &ReservationToken) -> Result<(), ProductError> {
        Ok(())
    }
}

/// Package records in `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgPackages {
    db: Db,
}

impl PgPackages {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a package record.
    ///
    /// # Errors
    ///
    /// Returns an error when the insert fails.
    pub async fn create_package(
        &self,
        package_no: i64,
        title: &str,
        cost: u64,
    ) -> Result<PackageProduct, ProductError> {
        let package = query_as::<Postgres, PackageProduct>(CREATE_PACKAGE_SQL)
            .bind(ProductUuid::new().into_uuid())
            .bind(package_no)
            .bind(title)
            .bind(amount_to_i64(cost, "cost")?)
            .fetch_one(self.db.pool())
            .await?;

        Ok(package)
    }
}

#[async_trait]
impl ProductKind for PgPackages {
    fn tag(&self) -> ProductTypeTag {
        ProductTypeTag::PACKAGE
    }

    async fn load(&self, uuid: ProductUuid) -> Result<Option<Box<dyn Product>>, ProductError> {
        let package = query_as::<Postgres, PackageProduct>(GET_PACKAGE_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(package.map(|p| Box::new(p) as Box<dyn Product>))
    }

    async fn delete(&self, uuid: ProductUuid) -> Result<u64, ProductError> {
        let rows_affected = query(DELETE_PACKAGE_SQL)
            .bind(uuid.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for PackageProduct {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            package_no: row.try_get("package_no")?,
            title: row.try_get("title")?,
            cost: try_get_amount(row, "cost")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
