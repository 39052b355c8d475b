//! Carts service.

use std::{
    collections::BTreeSet,
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tokio::sync::OwnedMutexGuard;
use tracing::{Span, debug, info, warn};

use crate::domain::{
    carts::{
        errors::CartsServiceError,
        locks::OwnerLocks,
        models::{CartItem, CartItemUuid, CartLine, CartSummary, NewCartItem, REMOVED_ITEM_TITLE},
        reconciler::{ExpirationReconciler, Reconciliation, WhenUnavailable},
        repositories::{CartItemsRepository, OwnerLease},
        transfer::TransferService,
    },
    owners::{AccountId, Owner, SessionKey},
    products::{ExtraAttrs, ProductError, ProductRef, ProductRegistry, ProductTypeTag},
    reservations::{ReservationClient, ReservationToken, TransferTarget},
};

/// Cart item store backed by a [`CartItemsRepository`].
pub struct CartStore {
    repository: Arc<dyn CartItemsRepository>,
    registry: ProductRegistry,
    reservations: Arc<dyn ReservationClient>,
    locks: OwnerLocks,
    reconciler: ExpirationReconciler,
    transfers: TransferService,
}

impl CartStore {
    #[must_use]
    pub fn new(
        repository: Arc<dyn CartItemsRepository>,
        registry: ProductRegistry,
        reservations: Arc<dyn ReservationClient>,
    ) -> Self {
        Self {
            reconciler: ExpirationReconciler::new(
                Arc::clone(&repository),
                registry.clone(),
                Arc::clone(&reservations),
            ),
            transfers: TransferService::new(Arc::clone(&repository), registry.clone()),
            locks: OwnerLocks::new(),
            repository,
            registry,
            reservations,
        }
    }

    /// Hold the owner's cart against this store's tasks and against every
    /// other store over the same storage.
    async fn exclusive(
        &self,
        owner: &Owner,
    ) -> Result<(OwnerLease, OwnedMutexGuard<()>), CartsServiceError> {
        let local = self.locks.acquire(owner).await;
        let lease = self.repository.lock_owner(owner).await?;

        Ok((lease, local))
    }

    /// Run the item's delete hook, drop its product record, then the row.
    async fn delete_item(
        &self,
        owner: &Owner,
        token: &ReservationToken,
        item: &CartItem,
    ) -> Result<(), CartsServiceError> {
        if let Some(product) = self.registry.resolve(&item.product).await? {
            product.delete_callback(token).await?;

            self.registry.delete(&item.product).await?;
        }

        if self.repository.delete_item(owner, item.uuid).await? == 0 {
            return Err(CartsServiceError::NotFound);
        }

        Ok(())
    }

    /// Render an item, falling back to a zero-cost tombstone line.
    async fn line(&self, item: &CartItem) -> CartLine {
        let resolved = self
            .registry
            .resolve(&item.product)
            .await
            .unwrap_or_else(|error| {
                warn!(item_uuid = %item.uuid, product = %item.product, error = %error, "could not resolve product");

                None
            });

        let (title, cost) = resolved.map_or_else(
            || (REMOVED_ITEM_TITLE.to_string(), 0),
            |product| (product.title(), product.cost()),
        );

        CartLine {
            item: item.uuid,
            product: item.product.clone(),
            title,
            cost,
        }
    }
}

impl Debug for CartStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CartStore")
            .field("registry", &self.registry)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CartsService for CartStore {
    #[tracing::instrument(
        name = "carts.service.list",
        skip(self),
        fields(owner = %owner),
        err
    )]
    async fn list(
        &self,
        owner: &Owner,
        include_paid: bool,
    ) -> Result<Vec<CartItem>, CartsServiceError> {
        Ok(self.repository.list_items(owner, include_paid).await?)
    }

    #[tracing::instrument(
        name = "carts.service.add",
        skip(self, token, attrs),
        fields(owner = %owner, product = %product, item_uuid = tracing::field::Empty),
        err
    )]
    async fn add(
        &self,
        owner: &Owner,
        token: &ReservationToken,
        product: ProductRef,
        attrs: ExtraAttrs,
    ) -> Result<CartItem, CartsServiceError> {
        let _section = self.exclusive(owner).await?;

        self.reconciler
            .reconcile(owner, token, Timestamp::now(), WhenUnavailable::Keep)
            .await?;

        let resolved = self
            .registry
            .resolve(&product)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        if let Err(error) = resolved.add_to_cart(token, &attrs).await {
            if let Err(cleanup) = self.registry.delete(&product).await {
                warn!(product = %product, error = %cleanup, "could not delete refused product record");
            }

            if matches!(error, ProductError::PendingConflict) {
                info!(product = %product, "add lost a pending reservation race");

                return Err(CartsServiceError::PendingConflict(product));
            }

            return Err(error.into());
        }

        let item = self
            .repository
            .create_item(NewCartItem {
                uuid: CartItemUuid::new(),
                owner: owner.clone(),
                product,
            })
            .await?;

        Span::current().record("item_uuid", tracing::field::display(item.uuid));

        info!(item_uuid = %item.uuid, "added cart item");

        Ok(item)
    }

    #[tracing::instrument(
        name = "carts.service.remove",
        skip(self, token),
        fields(owner = %owner, item_uuid = %item),
        err
    )]
    async fn remove(
        &self,
        owner: &Owner,
        token: &ReservationToken,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError> {
        let _section = self.exclusive(owner).await?;

        let item = self
            .repository
            .get_item(owner, item)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        self.delete_item(owner, token, &item).await?;

        info!(item_uuid = %item.uuid, "removed cart item");

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.clear",
        skip(self, token),
        fields(owner = %owner),
        err
    )]
    async fn clear(
        &self,
        owner: &Owner,
        token: &ReservationToken,
    ) -> Result<usize, CartsServiceError> {
        let _section = self.exclusive(owner).await?;

        let items = self.repository.list_items(owner, false).await?;

        let mut removed = 0;

        for item in &items {
            match self.delete_item(owner, token, item).await {
                Ok(()) => removed += 1,
                Err(error) => {
                    warn!(item_uuid = %item.uuid, product = %item.product, error = %error, "could not clear cart item");
                }
            }
        }

        if let Err(error) = self
            .reservations
            .transfer_session(&TransferTarget::Session(token.clone()))
            .await
        {
            warn!(error = %error, "could not reset reservation session");
        }

        info!(removed, "cleared cart");

        Ok(removed)
    }

    #[tracing::instrument(
        name = "carts.service.total_cost",
        skip(self),
        fields(owner = %owner),
        err
    )]
    async fn total_cost(&self, owner: &Owner) -> Result<u64, CartsServiceError> {
        let items = self.repository.list_items(owner, false).await?;

        let mut total: u64 = 0;

        for item in &items {
            total = total.saturating_add(self.line(item).await.cost);
        }

        Ok(total)
    }

    async fn types(&self, owner: &Owner) -> Result<BTreeSet<ProductTypeTag>, CartsServiceError> {
        let items = self.repository.list_items(owner, false).await?;

        Ok(items
            .into_iter()
            .map(|item| item.product.product_type)
            .collect())
    }

    async fn is_only_packages(&self, owner: &Owner) -> Result<bool, CartsServiceError> {
        let items = self.repository.list_items(owner, false).await?;

        Ok(items.iter().all(|item| item.product.is_package()))
    }

    #[tracing::instrument(
        name = "carts.service.set_as_paid",
        skip(self, token),
        fields(owner = %owner, paid = tracing::field::Empty),
        err
    )]
    async fn set_as_paid(
        &self,
        owner: &Owner,
        token: &ReservationToken,
    ) -> Result<usize, CartsServiceError> {
        let Some(account) = owner.account() else {
            debug!("anonymous carts are never paid");

            return Ok(0);
        };

        let _section = self.exclusive(owner).await?;

        let items = self.repository.list_items(owner, false).await?;

        let mut payable = Vec::with_capacity(items.len());

        for item in &items {
            let checked_out = match self.registry.resolve(&item.product).await {
                Ok(Some(product)) => product.checkout_callback(token).await,
                Ok(None) => Ok(()),
                Err(error) => Err(error),
            };

            match checked_out {
                Ok(()) => payable.push(item.uuid),
                Err(error) => {
                    warn!(
                        item_uuid = %item.uuid,
                        product = %item.product,
                        error = %error,
                        "checkout hook failed, leaving item unpaid"
                    );
                }
            }
        }

        if payable.is_empty() {
            return Ok(0);
        }

        let paid = self.repository.mark_paid(account, &payable).await?;
        let paid = usize::try_from(paid).unwrap_or(usize::MAX);

        Span::current().record("paid", paid);

        info!(paid, "marked cart items paid");

        Ok(paid)
    }

    #[tracing::instrument(
        name = "carts.service.transfer_to_account",
        skip(self),
        fields(account = %account),
        err
    )]
    async fn transfer_to_account(
        &self,
        session: &SessionKey,
        account: AccountId,
    ) -> Result<usize, CartsServiceError> {
        self.transfers.transfer_to_account(session, account).await
    }

    #[tracing::instrument(
        name = "carts.service.summary",
        skip(self, token),
        fields(owner = %owner),
        err
    )]
    async fn summary(
        &self,
        owner: &Owner,
        token: &ReservationToken,
    ) -> Result<CartSummary, CartsServiceError> {
        let _section = self.exclusive(owner).await?;

        let mut fees = 0;
        let mut expires_at = None;

        if !self.repository.list_items(owner, false).await?.is_empty() {
            match self.reservations.get_cart_snapshot(token).await {
                Ok(Some(snapshot)) => {
                    fees = snapshot.handling_charges;

                    let outcome = self
                        .reconciler
                        .reconcile(owner, token, Timestamp::now(), WhenUnavailable::Evict)
                        .await?;

                    if let Reconciliation::Live { expires_at: live } = outcome {
                        expires_at = live;
                    }
                }
                Ok(None) => debug!("no remote cart for session"),
                Err(error) => {
                    warn!(error = %error, "could not read remote cart, evicting tickets");

                    self.reconciler.evict_tickets(owner, token).await?;
                }
            }
        }

        let items = self.repository.list_items(owner, false).await?;

        let mut lines = Vec::with_capacity(items.len());

        for item in &items {
            lines.push(self.line(item).await);
        }

        let sub_total = lines
            .iter()
            .fold(0_u64, |total, line| total.saturating_add(line.cost));

        if lines.is_empty() {
            expires_at = None;
        }

        Ok(CartSummary {
            lines,
            sub_total,
            fees,
            total: sub_total.saturating_add(fees),
            expires_at,
        })
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Items of the owner in insertion order, paid items only on request.
    async fn list(
        &self,
        owner: &Owner,
        include_paid: bool,
    ) -> Result<Vec<CartItem>, CartsServiceError>;

    /// Add a product to the owner's cart.
    ///
    /// Expired tickets are evicted first. When the product reports a pending
    /// external task its record is deleted and
    /// [`CartsServiceError::PendingConflict`] is returned; no item is created.
    async fn add(
        &self,
        owner: &Owner,
        token: &ReservationToken,
        product: ProductRef,
        attrs: ExtraAttrs,
    ) -> Result<CartItem, CartsServiceError>;

    /// Remove one item, releasing its product first.
    async fn remove(
        &self,
        owner: &Owner,
        token: &ReservationToken,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError>;

    /// Remove every unpaid item and reset the remote session.
    async fn clear(&self, owner: &Owner, token: &ReservationToken)
    -> Result<usize, CartsServiceError>;

    /// Sum of unpaid item costs; removed products count as zero.
    async fn total_cost(&self, owner: &Owner) -> Result<u64, CartsServiceError>;

    /// Distinct product type tags in the cart.
    async fn types(&self, owner: &Owner) -> Result<BTreeSet<ProductTypeTag>, CartsServiceError>;

    /// Whether the cart is empty or holds nothing but packages.
    async fn is_only_packages(&self, owner: &Owner) -> Result<bool, CartsServiceError>;

    /// Run checkout hooks and mark the items that passed as paid.
    async fn set_as_paid(
        &self,
        owner: &Owner,
        token: &ReservationToken,
    ) -> Result<usize, CartsServiceError>;

    /// Hand a session's cart over to an account.
    async fn transfer_to_account(
        &self,
        session: &SessionKey,
        account: AccountId,
    ) -> Result<usize, CartsServiceError>;

    /// Reconcile ticket holds and render the cart with fees.
    async fn summary(
        &self,
        owner: &Owner,
        token: &ReservationToken,
    ) -> Result<CartSummary, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use testresult::TestResult;

    use crate::{
        domain::{
            products::ProductUuid,
            reservations::{
                CartSnapshot, MockReservationClient, ReservationError, ReservationLine,
            },
        },
        test::{FakeProductSpec, HookCall, TestContext},
    };

    use super::*;

    const LINE_A: ReservationLine = ReservationLine {
        performance_no: 9,
        line_seq_no: 1,
    };

    const LINE_B: ReservationLine = ReservationLine {
        performance_no: 9,
        line_seq_no: 2,
    };

    fn visitor() -> Owner {
        Owner::AnonymousSession(SessionKey::new("visitor-1").unwrap())
    }

    fn member() -> Owner {
        Owner::AuthenticatedUser(AccountId::new())
    }

    #[tokio::test]
    async fn added_item_is_listed_once() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = visitor();
        let product = ctx.vouchers.create(FakeProductSpec::costing(10_00));

        let item = ctx
            .carts
            .add(&owner, &ctx.token, product.clone(), ExtraAttrs::new())
            .await?;

        let items = ctx.carts.list(&owner, false).await?;

        assert_eq!(items, vec![item.clone()]);
        assert_eq!(item.product, product);
        assert_eq!(item.session_key().map(SessionKey::as_str), Some("visitor-1"));
        assert_eq!(ctx.vouchers.calls(), vec![HookCall::AddToCart(product.product_uuid)]);

        Ok(())
    }

    #[tokio::test]
    async fn items_are_listed_in_insertion_order() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = member();

        let mut added = Vec::new();

        for cost in [1_00, 2_00, 3_00] {
            let product = ctx.vouchers.create(FakeProductSpec::costing(cost));

            added.push(
                ctx.carts
                    .add(&owner, &ctx.token, product, ExtraAttrs::new())
                    .await?
                    .uuid,
            );
        }

        let listed: Vec<_> = ctx
            .carts
            .list(&owner, false)
            .await?
            .into_iter()
            .map(|item| item.uuid)
            .collect();

        assert_eq!(listed, added);

        Ok(())
    }

    #[tokio::test]
    async fn pending_conflict_leaves_no_item_and_no_product() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = visitor();
        let product = ctx.tickets.create(FakeProductSpec::ticket(30_00, LINE_A).pending());

        let result = ctx
            .carts
            .add(&owner, &ctx.token, product.clone(), ExtraAttrs::new())
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::PendingConflict(ref p)) if *p == product),
            "expected PendingConflict, got {result:?}"
        );
        assert!(result.is_err_and(|e| e.is_retryable()));
        assert!(ctx.carts.list(&owner, false).await?.is_empty());
        assert!(!ctx.tickets.exists(&product));

        Ok(())
    }

    #[tokio::test]
    async fn refused_add_drops_the_product_record() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = visitor();
        let product = ctx
            .vouchers
            .create(FakeProductSpec::costing(0).rejecting());

        let result = ctx
            .carts
            .add(&owner, &ctx.token, product.clone(), ExtraAttrs::new())
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::Product(ProductError::Rejected(_)))),
            "expected a rejected product, got {result:?}"
        );
        assert!(ctx.carts.list(&owner, false).await?.is_empty());
        assert!(!ctx.vouchers.exists(&product));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let ctx = TestContext::new(MockReservationClient::new());

        let result = ctx
            .carts
            .add(
                &visitor(),
                &ctx.token,
                ProductRef::new(ProductTypeTag::VOUCHER, ProductUuid::new()),
                ExtraAttrs::new(),
            )
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn unregistered_product_type_is_reported() {
        let ctx = TestContext::new(MockReservationClient::new());

        let result = ctx
            .carts
            .add(
                &visitor(),
                &ctx.token,
                ProductRef::new(ProductTypeTag::new("donation"), ProductUuid::new()),
                ExtraAttrs::new(),
            )
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::UnknownProductType(_))),
            "expected UnknownProductType, got {result:?}"
        );
    }

    #[tokio::test]
    async fn add_evicts_expired_tickets_first() -> TestResult {
        let mut reservations = MockReservationClient::new();

        reservations
            .expect_get_expiration()
            .times(1)
            .returning(|_| Ok(Some(Timestamp::UNIX_EPOCH)));

        reservations
            .expect_bulk_release()
            .times(1)
            .returning(|_, _| Ok(()));

        let ctx = TestContext::new(reservations);
        let owner = visitor();
        let stale = ctx.tickets.create(FakeProductSpec::ticket(30_00, LINE_A));

        ctx.seed(&owner, stale.clone());

        let voucher = ctx.vouchers.create(FakeProductSpec::costing(5_00));

        ctx.carts
            .add(&owner, &ctx.token, voucher.clone(), ExtraAttrs::new())
            .await?;

        let products: Vec<_> = ctx
            .carts
            .list(&owner, false)
            .await?
            .into_iter()
            .map(|item| item.product)
            .collect();

        assert_eq!(products, vec![voucher]);
        assert!(!ctx.tickets.exists(&stale));

        Ok(())
    }

    #[tokio::test]
    async fn remove_runs_delete_hook_before_dropping_records() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = member();
        let product = ctx.vouchers.create(FakeProductSpec::costing(5_00));
        let item = ctx.seed(&owner, product.clone());

        ctx.carts.remove(&owner, &ctx.token, item.uuid).await?;

        assert_eq!(ctx.vouchers.calls(), vec![HookCall::Delete(product.product_uuid)]);
        assert!(!ctx.vouchers.exists(&product));
        assert!(ctx.carts.list(&owner, true).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn removing_unknown_item_is_not_found_and_changes_nothing() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = member();
        let item = ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(5_00)));

        let result = ctx
            .carts
            .remove(&owner, &ctx.token, CartItemUuid::new())
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
        assert_eq!(ctx.carts.list(&owner, false).await?, vec![item]);

        Ok(())
    }

    #[tokio::test]
    async fn removing_another_owners_item_is_not_found() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = member();
        let item = ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(5_00)));

        let result = ctx.carts.remove(&visitor(), &ctx.token, item.uuid).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
        assert_eq!(ctx.repository.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn total_cost_counts_unpaid_items_only() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let account = AccountId::new();
        let owner = Owner::AuthenticatedUser(account);

        let paid = ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(40_00)));
        ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(12_50)));
        ctx.seed(&owner, ctx.packages.create(FakeProductSpec::costing(7_50)));

        ctx.repository.mark_paid(account, &[paid.uuid]).await?;

        assert_eq!(ctx.carts.total_cost(&owner).await?, 20_00);

        Ok(())
    }

    #[tokio::test]
    async fn removed_products_cost_nothing() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = visitor();

        let gone = ctx.vouchers.create(FakeProductSpec::costing(99_00));
        ctx.seed(&owner, gone.clone());
        ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(3_00)));

        ctx.vouchers.forget(&gone);

        assert_eq!(ctx.carts.total_cost(&owner).await?, 3_00);

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_is_only_packages() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = visitor();

        assert!(ctx.carts.is_only_packages(&owner).await?);
        assert!(ctx.carts.types(&owner).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn package_and_voucher_cart_reports_both_types() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = visitor();

        ctx.seed(&owner, ctx.packages.create(FakeProductSpec::costing(80_00)));

        assert!(ctx.carts.is_only_packages(&owner).await?);

        ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(10_00)));

        assert!(!ctx.carts.is_only_packages(&owner).await?);
        assert_eq!(
            ctx.carts.types(&owner).await?,
            BTreeSet::from([ProductTypeTag::PACKAGE, ProductTypeTag::VOUCHER])
        );

        Ok(())
    }

    #[tokio::test]
    async fn set_as_paid_is_a_no_op_for_anonymous_owners() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = visitor();
        let product = ctx.vouchers.create(FakeProductSpec::costing(10_00));

        ctx.seed(&owner, product);

        assert_eq!(ctx.carts.set_as_paid(&owner, &ctx.token).await?, 0);
        assert!(ctx.vouchers.calls().is_empty());
        assert!(ctx.carts.list(&owner, true).await?.iter().all(|i| !i.is_paid));

        Ok(())
    }

    #[tokio::test]
    async fn set_as_paid_excludes_items_whose_checkout_fails() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let owner = member();

        let good = ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(10_00)));
        let bad = ctx.seed(
            &owner,
            ctx.vouchers.create(FakeProductSpec::costing(20_00).failing_checkout()),
        );

        assert_eq!(ctx.carts.set_as_paid(&owner, &ctx.token).await?, 1);

        let unpaid: Vec<_> = ctx
            .carts
            .list(&owner, false)
            .await?
            .into_iter()
            .map(|item| item.uuid)
            .collect();

        assert_eq!(unpaid, vec![bad.uuid]);
        assert_eq!(ctx.carts.total_cost(&owner).await?, 20_00);
        assert!(
            ctx.carts
                .list(&owner, true)
                .await?
                .iter()
                .any(|item| item.uuid == good.uuid && item.is_paid)
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_payments_from_two_stores_check_out_once() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let other = ctx.another_store();
        let owner = member();

        let product = ctx.vouchers.create(
            FakeProductSpec::costing(15_00).slow_checkout(Duration::from_millis(50)),
        );
        ctx.seed(&owner, product.clone());

        let (first, second) = tokio::join!(
            ctx.carts.set_as_paid(&owner, &ctx.token),
            other.set_as_paid(&owner, &ctx.token),
        );

        assert_eq!(first? + second?, 1);
        assert_eq!(
            ctx.vouchers.calls(),
            vec![HookCall::Checkout(product.product_uuid)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn transfer_moves_session_items_to_account() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let session = SessionKey::new("visitor-2")?;
        let anonymous = Owner::AnonymousSession(session.clone());
        let account = AccountId::new();
        let member = Owner::AuthenticatedUser(account);

        let first = ctx.vouchers.create(FakeProductSpec::costing(1_00));
        let second = ctx.packages.create(FakeProductSpec::costing(2_00));

        ctx.seed(&anonymous, first.clone());
        ctx.seed(&anonymous, second.clone());

        let before = ctx.carts.list(&anonymous, false).await?.len();

        assert_eq!(ctx.carts.transfer_to_account(&session, account).await?, 2);

        let moved = ctx.carts.list(&member, false).await?;

        assert_eq!(moved.len(), before);
        assert!(moved.iter().all(|item| item.owner == member));
        assert!(moved.iter().all(|item| item.session_key().is_none()));
        assert!(ctx.carts.list(&anonymous, true).await?.is_empty());
        assert_eq!(
            ctx.vouchers.calls(),
            vec![HookCall::Transfer(first.product_uuid, account)]
        );
        assert_eq!(
            ctx.packages.calls(),
            vec![HookCall::Transfer(second.product_uuid, account)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn transfer_is_idempotent() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());
        let session = SessionKey::new("visitor-3")?;
        let account = AccountId::new();

        ctx.seed(
            &Owner::AnonymousSession(session.clone()),
            ctx.vouchers.create(FakeProductSpec::costing(1_00)),
        );

        assert_eq!(ctx.carts.transfer_to_account(&session, account).await?, 1);

        let after_first = ctx
            .carts
            .list(&Owner::AuthenticatedUser(account), true)
            .await?;

        assert_eq!(ctx.carts.transfer_to_account(&session, account).await?, 0);
        assert_eq!(
            ctx.carts
                .list(&Owner::AuthenticatedUser(account), true)
                .await?,
            after_first
        );

        Ok(())
    }

    #[tokio::test]
    async fn clear_deletes_everything_and_resets_session() -> TestResult {
        let mut reservations = MockReservationClient::new();

        reservations
            .expect_transfer_session()
            .withf(|target| matches!(target, TransferTarget::Session(t) if t.as_str() == "token-1"))
            .times(1)
            .returning(|_| Err(ReservationError::Unavailable("down".to_string())));

        let ctx = TestContext::new(reservations);
        let owner = visitor();

        let ticket = ctx.tickets.create(FakeProductSpec::ticket(30_00, LINE_A));
        let voucher = ctx.vouchers.create(FakeProductSpec::costing(5_00));

        ctx.seed(&owner, ticket.clone());
        ctx.seed(&owner, voucher.clone());

        assert_eq!(ctx.carts.clear(&owner, &ctx.token).await?, 2);
        assert!(ctx.carts.list(&owner, true).await?.is_empty());
        assert!(!ctx.tickets.exists(&ticket));
        assert!(!ctx.vouchers.exists(&voucher));

        Ok(())
    }

    #[tokio::test]
    async fn clear_skips_items_whose_delete_hook_fails() -> TestResult {
        let mut reservations = MockReservationClient::new();

        reservations
            .expect_transfer_session()
            .returning(|_| Ok(()));

        let ctx = TestContext::new(reservations);
        let owner = visitor();

        let stuck = ctx.seed(
            &owner,
            ctx.vouchers.create(FakeProductSpec::costing(5_00).failing_delete()),
        );
        ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(6_00)));

        assert_eq!(ctx.carts.clear(&owner, &ctx.token).await?, 1);
        assert_eq!(ctx.carts.list(&owner, false).await?, vec![stuck]);

        Ok(())
    }

    #[tokio::test]
    async fn clear_keeps_paid_items() -> TestResult {
        let mut reservations = MockReservationClient::new();

        reservations
            .expect_transfer_session()
            .returning(|_| Ok(()));

        let ctx = TestContext::new(reservations);
        let owner = member();

        let paid = ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(10_00)));
        ctx.carts.set_as_paid(&owner, &ctx.token).await?;

        ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(4_00)));

        assert_eq!(ctx.carts.clear(&owner, &ctx.token).await?, 1);

        let remaining = ctx.carts.list(&owner, true).await?;

        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.first().map(|item| item.uuid), Some(paid.uuid));
        assert!(ctx.vouchers.exists(&paid.product));

        Ok(())
    }

    #[tokio::test]
    async fn summary_evicts_expired_tickets_even_when_release_fails() -> TestResult {
        let mut reservations = MockReservationClient::new();

        reservations.expect_get_cart_snapshot().returning(|_| {
            Ok(Some(CartSnapshot {
                handling_charges: 2_50,
                pending_lines: vec![],
            }))
        });

        reservations
            .expect_get_expiration()
            .returning(|_| Ok(Some(Timestamp::UNIX_EPOCH)));

        reservations
            .expect_bulk_release()
            .withf(|_, lines| lines.to_vec() == vec![LINE_A, LINE_B])
            .times(1)
            .returning(|_, _| Err(ReservationError::Unavailable("down".to_string())));

        let ctx = TestContext::new(reservations);
        let owner = visitor();

        let first = ctx.tickets.create(FakeProductSpec::ticket(30_00, LINE_A));
        let second = ctx.tickets.create(FakeProductSpec::ticket(30_00, LINE_B));

        ctx.seed(&owner, first.clone());
        ctx.seed(&owner, second.clone());

        let summary = ctx.carts.summary(&owner, &ctx.token).await?;

        assert!(summary.is_empty());
        assert_eq!(summary.sub_total, 0);
        assert_eq!(summary.total, 2_50);
        assert_eq!(summary.expires_at, None);
        assert!(ctx.carts.list(&owner, false).await?.is_empty());
        assert!(!ctx.tickets.exists(&first));
        assert!(!ctx.tickets.exists(&second));

        Ok(())
    }

    #[tokio::test]
    async fn summary_adds_fees_and_shows_expiration() -> TestResult {
        let mut reservations = MockReservationClient::new();

        reservations.expect_get_cart_snapshot().returning(|_| {
            Ok(Some(CartSnapshot {
                handling_charges: 1_75,
                pending_lines: vec![],
            }))
        });

        reservations
            .expect_get_expiration()
            .returning(|_| Ok(Some(Timestamp::MAX)));

        let ctx = TestContext::new(reservations);
        let owner = visitor();

        ctx.seed(&owner, ctx.tickets.create(FakeProductSpec::ticket(30_00, LINE_A)));

        let gone = ctx.vouchers.create(FakeProductSpec::costing(10_00));
        ctx.seed(&owner, gone.clone());
        ctx.vouchers.forget(&gone);

        let summary = ctx.carts.summary(&owner, &ctx.token).await?;

        assert_eq!(summary.sub_total, 30_00);
        assert_eq!(summary.fees, 1_75);
        assert_eq!(summary.total, 31_75);
        assert_eq!(summary.expires_at, Some(Timestamp::MAX));
        assert_eq!(summary.lines.len(), 2);
        assert!(summary.lines.iter().any(CartLine::is_removed));

        Ok(())
    }

    #[tokio::test]
    async fn summary_evicts_tickets_when_remote_cart_is_unreadable() -> TestResult {
        let mut reservations = MockReservationClient::new();

        reservations
            .expect_get_cart_snapshot()
            .returning(|_| Err(ReservationError::Unavailable("down".to_string())));

        reservations
            .expect_bulk_release()
            .times(1)
            .returning(|_, _| Ok(()));

        let ctx = TestContext::new(reservations);
        let owner = visitor();

        ctx.seed(&owner, ctx.tickets.create(FakeProductSpec::ticket(30_00, LINE_A)));
        let voucher = ctx.seed(&owner, ctx.vouchers.create(FakeProductSpec::costing(4_00)));

        let summary = ctx.carts.summary(&owner, &ctx.token).await?;

        assert_eq!(summary.fees, 0);
        assert_eq!(summary.total, 4_00);
        assert_eq!(
            summary.lines.iter().map(|line| line.item).collect::<Vec<_>>(),
            vec![voucher.uuid]
        );

        Ok(())
    }

    #[tokio::test]
    async fn summary_of_empty_cart_skips_the_reservation_system() -> TestResult {
        let ctx = TestContext::new(MockReservationClient::new());

        let summary = ctx.carts.summary(&visitor(), &ctx.token).await?;

        assert!(summary.is_empty());
        assert_eq!(summary.total, 0);

        Ok(())
    }
}
