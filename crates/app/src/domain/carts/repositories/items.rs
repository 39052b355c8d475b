//! Cart Items Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        carts::{
            models::{CartItem, CartItemUuid, NewCartItem},
            repositories::{CartItemsRepository, OwnerLease},
        },
        owners::{AccountId, Owner, OwnerKind, SessionKey},
        products::{ProductRef, ProductTypeTag, ProductUuid},
    },
};

const LIST_CART_ITEMS_SQL: &str = include_str!("../sql/list_cart_items.sql");
const GET_CART_ITEM_SQL: &str = include_str!("../sql/get_cart_item.sql");
const CREATE_CART_ITEM_SQL: &str = include_str!("../sql/create_cart_item.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("../sql/delete_cart_item.sql");
const MARK_CART_ITEMS_PAID_SQL: &str = include_str!("../sql/mark_cart_items_paid.sql");
const REASSIGN_SESSION_ITEMS_SQL: &str = include_str!("../sql/reassign_session_items.sql");

#[derive(Debug, Clone)]
pub struct PgCartItemsRepository {
    db: Db,
}

impl PgCartItemsRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartItemsRepository for PgCartItemsRepository {
    async fn lock_owner(&self, owner: &Owner) -> Result<OwnerLease, sqlx::Error> {
        // Dropping the uncommitted transaction rolls it back, which releases the lock.
        let tx = self.db.begin_owner_transaction(owner).await?;

        Ok(OwnerLease::new(tx))
    }

    async fn list_items(
        &self,
        owner: &Owner,
        include_paid: bool,
    ) -> Result<Vec<CartItem>, sqlx::Error> {
        query_as::<Postgres, CartItem>(LIST_CART_ITEMS_SQL)
            .bind(owner.kind().as_str())
            .bind(owner.key())
            .bind(include_paid)
            .fetch_all(self.db.pool())
            .await
    }

    async fn get_item(
        &self,
        owner: &Owner,
        item: CartItemUuid,
    ) -> Result<Option<CartItem>, sqlx::Error> {
        query_as::<Postgres, CartItem>(GET_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(owner.kind().as_str())
            .bind(owner.key())
            .fetch_optional(self.db.pool())
            .await
    }

    async fn create_item(&self, item: NewCartItem) -> Result<CartItem, sqlx::Error> {
        query_as::<Postgres, CartItem>(CREATE_CART_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(item.owner.kind().as_str())
            .bind(item.owner.key())
            .bind(item.product.product_type.as_str())
            .bind(item.product.product_uuid.into_uuid())
            .fetch_one(self.db.pool())
            .await
    }

    async fn delete_item(&self, owner: &Owner, item: CartItemUuid) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(owner.kind().as_str())
            .bind(owner.key())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn mark_paid(
        &self,
        account: AccountId,
        items: &[CartItemUuid],
    ) -> Result<u64, sqlx::Error> {
        let uuids: Vec<Uuid> = items.iter().map(|item| item.into_uuid()).collect();

        let rows_affected = query(MARK_CART_ITEMS_PAID_SQL)
            .bind(account.to_string())
            .bind(uuids)
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn reassign_session(
        &self,
        session: &SessionKey,
        account: AccountId,
    ) -> Result<Vec<CartItem>, sqlx::Error> {
        let mut moved = query_as::<Postgres, CartItem>(REASSIGN_SESSION_ITEMS_SQL)
            .bind(session.as_str())
            .bind(account.to_string())
            .fetch_all(self.db.pool())
            .await?;

        // RETURNING has no ORDER BY.
        moved.sort_by_key(|item| item.uuid);

        Ok(moved)
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let owner_kind: String = row.try_get("owner_kind")?;
        let owner_key: String = row.try_get("owner_key")?;

        let owner =
            Owner::from_parts(&owner_kind, &owner_key).map_err(|e| sqlx::Error::ColumnDecode {
                index: "owner_kind".to_string(),
                source: Box::new(e),
            })?;

        let product_type: String = row.try_get("product_type")?;

        Ok(Self {
            uuid: CartItemUuid::from_uuid(row.try_get("uuid")?),
            owner,
            product: ProductRef::new(
                ProductTypeTag::new(product_type),
                ProductUuid::from_uuid(row.try_get("product_uuid")?),
            ),
            is_paid: row.try_get("is_paid")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
