//! Performance tickets held in the reservation system.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{Row, postgres::PgRow, query};
use tracing::{debug, info};

use crate::{
    database::{Db, amount_to_i64, try_get_amount},
    domain::{
        owners::AccountId,
        products::{
            capability::{ExtraAttrs, Product, ProductKind},
            errors::ProductError,
            records::{ProductRef, ProductTypeTag, ProductUuid},
            variants::vouchers::format_minor_units,
        },
        reservations::{ReservationClient, ReservationLine, ReservationToken, TransferTarget},
    },
};

const GET_TICKET_SQL: &str = include_str!("../sql/get_ticket.sql");
const CREATE_TICKET_SQL: &str = include_str!("../sql/create_ticket.sql");
const DELETE_TICKET_SQL: &str = include_str!("../sql/delete_ticket.sql");

/// Ticket row data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    pub uuid: ProductUuid,
    pub cost: u64,
    pub line: ReservationLine,
    pub created_at: Timestamp,
}

/// A ticket whose seat is held by the reservation system.
pub struct Ticket {
    record: TicketRecord,
    reservations: Arc<dyn ReservationClient>,
}

impl Ticket {
    #[must_use]
    pub fn new(record: TicketRecord, reservations: Arc<dyn ReservationClient>) -> Self {
        Self {
            record,
            reservations,
        }
    }

    #[must_use]
    pub const fn record(&self) -> &TicketRecord {
        &self.record
    }
}

impl Debug for Ticket {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Ticket")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Product for Ticket {
    fn product_ref(&self) -> ProductRef {
        ProductRef::new(ProductTypeTag::TICKET, self.record.uuid)
    }

    fn title(&self) -> String {
        format!("Ticket for performance {}", self.record.line.performance_no)
    }

    fn description(&self) -> String {
        format!(
            "Performance {}, line {}, {}",
            self.record.line.performance_no,
            self.record.line.line_seq_no,
            format_minor_units(self.record.cost)
        )
    }

    fn cost(&self) -> u64 {
        self.record.cost
    }

    fn reservation_line(&self) -> Option<ReservationLine> {
        Some(self.record.line)
    }

    async fn add_to_cart(
        &self,
        token: &ReservationToken,
        _attrs: &ExtraAttrs,
    ) -> Result<(), ProductError> {
        let snapshot = self.reservations.get_cart_snapshot(token).await?;

        if snapshot.is_some_and(|snapshot| snapshot.is_pending(self.record.line)) {
            debug!(
                product_uuid = %self.record.uuid,
                performance_no = self.record.line.performance_no,
                "reservation still pending"
            );

            return Err(ProductError::PendingConflict);
        }

        Ok(())
    }

    async fn checkout_callback(&self, _token: &ReservationToken) -> Result<(), ProductError> {
        debug!(product_uuid = %self.record.uuid, "ticket checked out");

        Ok(())
    }

    async fn transfer_to_user(&self, account: AccountId) -> Result<(), ProductError> {
        self.reservations
            .transfer_session(&TransferTarget::Account(account))
            .await?;

        info!(product_uuid = %self.record.uuid, account = %account, "moved ticket hold to account");

        Ok(())
    }

    async fn delete_callback(&self, token: &ReservationToken) -> Result<(), ProductError> {
        self.reservations
            .bulk_release(token, &[self.record.line])
            .await?;

        Ok(())
    }
}

/// Ticket records in `PostgreSQL`.
pub struct PgTickets {
    db: Db,
    reservations: Arc<dyn ReservationClient>,
}

impl PgTickets {
    #[must_use]
    pub fn new(db: Db, reservations: Arc<dyn ReservationClient>) -> Self {
        Self { db, reservations }
    }

    /// Record a ticket for a line the reservation system already holds.
    ///
    /// # Errors
    ///
    /// Returns an error when the insert fails.
    pub async fn create_ticket(
        &self,
        line: ReservationLine,
        cost: u64,
    ) -> Result<TicketRecord, ProductError> {
        let row = query(CREATE_TICKET_SQL)
            .bind(ProductUuid::new().into_uuid())
            .bind(amount_to_i64(cost, "cost")?)
            .bind(line.performance_no)
            .bind(line.line_seq_no)
            .fetch_one(self.db.pool())
            .await?;

        Ok(ticket_from_row(&row)?)
    }
}

impl Debug for PgTickets {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PgTickets")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProductKind for PgTickets {
    fn tag(&self) -> ProductTypeTag {
        ProductTypeTag::TICKET
    }

    async fn load(&self, uuid: ProductUuid) -> Result<Option<Box<dyn Product>>, ProductError> {
        let row = query(GET_TICKET_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(self.db.pool())
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let record = ticket_from_row(&row)?;

        Ok(Some(Box::new(Ticket::new(
            record,
            Arc::clone(&self.reservations),
        ))))
    }

    async fn delete(&self, uuid: ProductUuid) -> Result<u64, ProductError> {
        let rows_affected = query(DELETE_TICKET_SQL)
            .bind(uuid.into_uuid())
            .execute(self.db.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn ticket_from_row(row: &PgRow) -> Result<TicketRecord, sqlx::Error> {
    Ok(TicketRecord {
        uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
        cost: try_get_amount(row, "cost")?,
        line: ReservationLine {
            performance_no: row.try_get("performance_no")?,
            line_seq_no: row.try_get("line_seq_no")?,
        },
        created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
    })
}
