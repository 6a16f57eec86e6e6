//! SQLite store implementation.
//!
//! Provides persistent storage for the catalog, orders, fee balances,
//! purchase history, prices, users and the error log using SQLite and
//! Diesel ORM. Cascades and the order reset/destroy rules live in the
//! schema (foreign keys and triggers), so every writer gets them.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use rust_decimal::Decimal;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{
    AssetRow, ErrorLogRow, ExecutionRow, FeeAssetRow, FeeBalanceRow, HopRow, NewErrorLogRow,
    NewExecutionRow, NewHopRow, OrderRow, OrderUpstreamChangeset, TokenPriceRow, UserRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    assets, error_log, execution_records, fee_assets, fee_balances, hops, orders, token_prices,
    users,
};
use crate::domain::hop::pair_key;
use crate::domain::{
    Amount, Asset, AssetAmount, AssetClass, ErrorLogEntry, ExecutionRecord, FeeSchedule, Hop,
    HopId, Order, OrderId, Path, ScheduleState, TokenPrice, UserAddress,
};
use crate::error::{Error, Result};
use crate::port::outbound::store::{
    BalanceStore, CatalogStore, ErrorLogStore, ExecutionStore, OrderStore, PriceStore, UserStore,
};

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

// Lets diesel transactions return the crate error directly.
impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// SQLite-backed implementation of every store port.
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }
}

/// Timestamps are stored as fixed-width RFC 3339 so text order is time order.
pub(crate) fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("timestamp {raw:?}: {e}")))
}

/// Digits in `u128::MAX`.
const AMOUNT_DIGITS: usize = 39;

/// Amounts are stored zero-padded to a fixed width so text order is numeric
/// order, which the schema triggers rely on.
pub(crate) fn to_db_amount(amount: Amount) -> String {
    format!("{amount:0width$}", width = AMOUNT_DIGITS)
}

pub(crate) fn from_db_amount(raw: &str, field: &'static str) -> Result<Amount> {
    Amount::from_str(raw).map_err(|e| Error::Parse(format!("{field} {raw:?}: {e}")))
}

fn asset_from_db(class: &str, id: String) -> Result<Asset> {
    let class = AssetClass::from_str(class)?;
    Ok(Asset::from_parts(class, id))
}

fn order_to_row(order: &Order) -> Result<OrderRow> {
    let (scheduled, next_run_at) = match order.schedule {
        ScheduleState::Unscheduled => (0, None),
        ScheduleState::Armed { next_run_at } => (1, Some(format_ts(next_run_at))),
    };
    Ok(OrderRow {
        id: order.id.to_string(),
        user_address: order.user.to_string(),
        chain_id: i64::try_from(order.chain_id)
            .map_err(|_| Error::Parse(format!("chain order id {} out of range", order.chain_id)))?,
        source_id: order.source.id().to_string(),
        source_class: order.source.class().to_string(),
        remaining: to_db_amount(order.remaining),
        token_allowance: to_db_amount(order.token_allowance),
        target_id: order.target.id().to_string(),
        target_class: order.target.class().to_string(),
        interval_secs: i64::try_from(order.interval_secs)
            .map_err(|_| Error::Parse(format!("interval {} out of range", order.interval_secs)))?,
        purchase_amount: to_db_amount(order.purchase_amount),
        max_hops: i32::try_from(order.max_hops)
            .map_err(|_| Error::Parse(format!("max_hops {} out of range", order.max_hops)))?,
        max_spread: order.max_spread.clone(),
        last_purchase_at: format_ts(order.last_purchase_at),
        scheduled,
        next_run_at,
    })
}

fn order_from_row(row: OrderRow) -> Result<Order> {
    let schedule = match (row.scheduled, row.next_run_at) {
        (0, None) => ScheduleState::Unscheduled,
        (1, Some(at)) => ScheduleState::Armed {
            next_run_at: parse_ts(&at)?,
        },
        (scheduled, at) => {
            return Err(Error::Database(format!(
                "order {} has inconsistent schedule: scheduled={scheduled}, next_run_at={at:?}",
                row.id
            )))
        }
    };
    Ok(Order {
        id: OrderId::from_raw(row.id),
        user: UserAddress::new(row.user_address),
        chain_id: u64::try_from(row.chain_id)
            .map_err(|_| Error::Parse(format!("chain order id is negative: {}", row.chain_id)))?,
        source: asset_from_db(&row.source_class, row.source_id)?,
        remaining: from_db_amount(&row.remaining, "remaining")?,
        token_allowance: from_db_amount(&row.token_allowance, "token_allowance")?,
        target: asset_from_db(&row.target_class, row.target_id)?,
        interval_secs: u64::try_from(row.interval_secs)
            .map_err(|_| Error::Parse(format!("interval is negative: {}", row.interval_secs)))?,
        purchase_amount: from_db_amount(&row.purchase_amount, "purchase_amount")?,
        max_hops: usize::try_from(row.max_hops)
            .map_err(|_| Error::Parse(format!("max_hops is negative: {}", row.max_hops)))?,
        max_spread: row.max_spread,
        last_purchase_at: parse_ts(&row.last_purchase_at)?,
        schedule,
    })
}

fn execution_from_row(row: ExecutionRow) -> Result<ExecutionRecord> {
    let path = row.path.as_deref().map(Path::decode).transpose()?;
    let fee_redeem: Vec<AssetAmount> = serde_json::from_str(&row.fee_redeem)?;
    Ok(ExecutionRecord {
        order_id: OrderId::from_raw(row.order_id),
        created_at: parse_ts(&row.created_at)?,
        source: asset_from_db(&row.source_class, row.source_id)?,
        target: asset_from_db(&row.target_class, row.target_id)?,
        amount: from_db_amount(&row.amount, "amount")?,
        remaining_before: from_db_amount(&row.remaining_before, "remaining_before")?,
        path,
        fee_redeem,
        success: row.success != 0,
        error: row.error,
        tx_ref: row.tx_ref,
    })
}

fn price_from_row(row: TokenPriceRow) -> Result<TokenPrice> {
    Ok(TokenPrice {
        asset: asset_from_db(&row.class, row.asset_id)?,
        price_usd: Decimal::from_str(&row.price_usd)
            .map_err(|e| Error::Parse(format!("price {:?}: {e}", row.price_usd)))?,
        conversion: u64::try_from(row.conversion)
            .map_err(|_| Error::Parse(format!("conversion is negative: {}", row.conversion)))?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

fn error_from_row(row: ErrorLogRow) -> Result<ErrorLogEntry> {
    Ok(ErrorLogEntry {
        created_at: parse_ts(&row.created_at)?,
        order_id: row.order_id.map(OrderId::from_raw),
        user: row.user_address.map(UserAddress::new),
        method: row.method,
        message: row.message,
    })
}

fn limit_of(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn upsert_asset(&self, asset: &Asset) -> Result<()> {
        let mut conn = self.conn()?;
        let row = AssetRow {
            id: asset.id().to_string(),
            class: asset.class().to_string(),
        };
        diesel::insert_into(assets::table)
            .values(&row)
            .on_conflict(assets::id)
            .do_update()
            .set(assets::class.eq(&row.class))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn retain_assets(&self, keep: &[Asset]) -> Result<usize> {
        let mut conn = self.conn()?;
        let ids: Vec<&str> = keep.iter().map(Asset::id).collect();
        let deleted = diesel::delete(assets::table.filter(assets::id.ne_all(ids)))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted)
    }

    async fn list_assets(&self) -> Result<Vec<Asset>> {
        let mut conn = self.conn()?;
        let rows: Vec<AssetRow> = assets::table
            .order(assets::id.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter()
            .map(|row| asset_from_db(&row.class, row.id))
            .collect()
    }

    async fn upsert_hop(&self, offer: &Asset, ask: &Asset) -> Result<Hop> {
        let mut conn = self.conn()?;
        let key = pair_key(offer, ask);
        let row: HopRow = conn.immediate_transaction(|conn| {
            diesel::insert_or_ignore_into(hops::table)
                .values(&NewHopRow {
                    pair_key: key.clone(),
                    offer_id: offer.id().to_string(),
                    ask_id: ask.id().to_string(),
                })
                .execute(conn)?;
            hops::table
                .filter(hops::pair_key.eq(&key))
                .select(HopRow::as_select())
                .first(conn)
        })?;

        let lookup: HashMap<String, Asset> = [offer, ask]
            .into_iter()
            .map(|a| (a.id().to_string(), a.clone()))
            .collect();
        hop_from_row(row, &lookup)
    }

    async fn retain_hops(&self, keep: &[String]) -> Result<usize> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(hops::table.filter(hops::pair_key.ne_all(keep)))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted)
    }

    async fn list_hops(&self) -> Result<Vec<Hop>> {
        let mut conn = self.conn()?;
        let asset_rows: Vec<AssetRow> = assets::table
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        let lookup = asset_rows
            .into_iter()
            .map(|row| {
                let asset = asset_from_db(&row.class, row.id.clone())?;
                Ok((row.id, asset))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let rows: Vec<HopRow> = hops::table
            .order(hops::id.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(|row| hop_from_row(row, &lookup)).collect()
    }

    async fn replace_fee_schedule(&self, schedule: &FeeSchedule) -> Result<()> {
        let rows = schedule
            .iter()
            .map(|(asset, fee)| {
                Ok(FeeAssetRow {
                    asset_id: asset.id().to_string(),
                    class: asset.class().to_string(),
                    fee_per_hop: to_db_amount(fee),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            diesel::delete(fee_assets::table).execute(conn)?;
            if !rows.is_empty() {
                diesel::insert_into(fee_assets::table)
                    .values(&rows)
                    .execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(())
        })?;
        Ok(())
    }

    async fn fee_schedule(&self) -> Result<FeeSchedule> {
        let mut conn = self.conn()?;
        let rows: Vec<FeeAssetRow> = fee_assets::table
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter()
            .map(|row| {
                let asset = asset_from_db(&row.class, row.asset_id)?;
                Ok((asset, from_db_amount(&row.fee_per_hop, "fee_per_hop")?))
            })
            .collect()
    }
}

fn hop_from_row(row: HopRow, lookup: &HashMap<String, Asset>) -> Result<Hop> {
    let endpoint = |id: &str| {
        lookup
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Database(format!("hop {} references unknown asset {id}", row.id)))
    };
    let id = u32::try_from(row.id).map_err(|_| Error::Parse(format!("hop id {}", row.id)))?;
    Ok(Hop::try_new(
        HopId::new(id),
        endpoint(&row.offer_id)?,
        endpoint(&row.ask_id)?,
    )?)
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[async_trait]
impl OrderStore for SqliteStore {
    async fn upsert_order(&self, order: &Order) -> Result<()> {
        let row = order_to_row(order)?;
        let upstream = OrderUpstreamChangeset {
            source_id: row.source_id.clone(),
            source_class: row.source_class.clone(),
            remaining: row.remaining.clone(),
            token_allowance: row.token_allowance.clone(),
            target_id: row.target_id.clone(),
            target_class: row.target_class.clone(),
            interval_secs: row.interval_secs,
            purchase_amount: row.purchase_amount.clone(),
            max_hops: row.max_hops,
            max_spread: row.max_spread.clone(),
            last_purchase_at: row.last_purchase_at.clone(),
        };

        let mut conn = self.conn()?;
        diesel::insert_into(orders::table)
            .values(&row)
            .on_conflict(orders::id)
            .do_update()
            .set(&upstream)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>> {
        let mut conn = self.conn()?;
        let row: Option<OrderRow> = orders::table
            .find(id.as_str())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(order_from_row).transpose()
    }

    async fn list_orders(&self, user: Option<&UserAddress>) -> Result<Vec<Order>> {
        let mut conn = self.conn()?;
        let mut query = orders::table.order(orders::id.asc()).into_boxed();
        if let Some(user) = user {
            query = query.filter(orders::user_address.eq(user.as_str().to_string()));
        }
        let rows: Vec<OrderRow> = query
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(order_from_row).collect()
    }

    async fn orders_needing_arming(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        let mut conn = self.conn()?;
        let now = format_ts(now);
        let rows: Vec<OrderRow> = orders::table
            .filter(
                orders::scheduled
                    .eq(0)
                    .or(orders::next_run_at.le(&now)),
            )
            .order(orders::id.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(order_from_row).collect()
    }

    async fn armed_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        let mut conn = self.conn()?;
        let now = format_ts(now);
        let rows: Vec<OrderRow> = orders::table
            .filter(orders::scheduled.eq(1))
            .filter(orders::next_run_at.gt(&now))
            .order(orders::id.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(order_from_row).collect()
    }

    async fn arm_order(
        &self,
        id: &OrderId,
        last_purchase_at: DateTime<Utc>,
        now: DateTime<Utc>,
        next_run_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = self.conn()?;
        let now = format_ts(now);
        let updated = diesel::update(
            orders::table
                .filter(orders::id.eq(id.as_str()))
                .filter(orders::last_purchase_at.eq(format_ts(last_purchase_at)))
                .filter(orders::scheduled.eq(0).or(orders::next_run_at.le(&now))),
        )
        .set((
            orders::scheduled.eq(1),
            orders::next_run_at.eq(Some(format_ts(next_run_at))),
        ))
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(updated > 0)
    }

    async fn record_consumption(&self, id: &OrderId, amount: Amount, at: DateTime<Utc>) -> Result<()> {
        let mut conn = self.conn()?;
        conn.immediate_transaction::<_, Error, _>(|conn| {
            let remaining: Option<String> = orders::table
                .find(id.as_str())
                .select(orders::remaining)
                .first(conn)
                .optional()?;
            let Some(remaining) = remaining else {
                return Ok(());
            };
            let left = from_db_amount(&remaining, "remaining")?.saturating_sub(amount);
            diesel::update(orders::table.find(id.as_str()))
                .set((
                    orders::remaining.eq(to_db_amount(left)),
                    orders::last_purchase_at.eq(format_ts(at)),
                ))
                .execute(conn)?;
            Ok(())
        })?;
        Ok(())
    }

    async fn retain_orders(&self, user: &UserAddress, keep: &[OrderId]) -> Result<usize> {
        let mut conn = self.conn()?;
        let ids: Vec<&str> = keep.iter().map(OrderId::as_str).collect();
        let deleted = diesel::delete(
            orders::table
                .filter(orders::user_address.eq(user.as_str()))
                .filter(orders::id.ne_all(ids)),
        )
        .execute(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted)
    }

    async fn delete_order(&self, id: &OrderId) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(orders::table.find(id.as_str()))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }
}

// ---------------------------------------------------------------------------
// Fee balances
// ---------------------------------------------------------------------------

#[async_trait]
impl BalanceStore for SqliteStore {
    async fn replace_fee_balances(&self, user: &UserAddress, balances: &[AssetAmount]) -> Result<()> {
        let rows = balances
            .iter()
            .enumerate()
            .map(|(position, balance)| {
                Ok(FeeBalanceRow {
                    user_address: user.to_string(),
                    asset_id: balance.asset.id().to_string(),
                    class: balance.asset.class().to_string(),
                    amount: to_db_amount(balance.amount),
                    position: i32::try_from(position)
                        .map_err(|_| Error::Parse("too many fee balances".into()))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            diesel::delete(fee_balances::table.filter(fee_balances::user_address.eq(user.as_str())))
                .execute(conn)?;
            if !rows.is_empty() {
                diesel::insert_into(fee_balances::table)
                    .values(&rows)
                    .execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(())
        })?;
        Ok(())
    }

    async fn fee_balances(&self, user: &UserAddress) -> Result<Vec<AssetAmount>> {
        let mut conn = self.conn()?;
        let rows: Vec<FeeBalanceRow> = fee_balances::table
            .filter(fee_balances::user_address.eq(user.as_str()))
            .order(fee_balances::position.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter()
            .map(|row| {
                Ok(AssetAmount::new(
                    asset_from_db(&row.class, row.asset_id)?,
                    from_db_amount(&row.amount, "tip balance")?,
                ))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Purchase history
// ---------------------------------------------------------------------------

#[async_trait]
impl ExecutionStore for SqliteStore {
    async fn record_execution(&self, record: &ExecutionRecord) -> Result<()> {
        let row = NewExecutionRow {
            order_id: record.order_id.to_string(),
            created_at: format_ts(record.created_at),
            source_id: record.source.id().to_string(),
            source_class: record.source.class().to_string(),
            target_id: record.target.id().to_string(),
            target_class: record.target.class().to_string(),
            amount: to_db_amount(record.amount),
            remaining_before: to_db_amount(record.remaining_before),
            path: record.path.as_ref().map(Path::encode),
            fee_redeem: serde_json::to_string(&record.fee_redeem)?,
            success: i32::from(record.success),
            error: record.error.clone(),
            tx_ref: record.tx_ref.clone(),
        };
        let mut conn = self.conn()?;
        diesel::insert_into(execution_records::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn executions(&self, order: Option<&OrderId>, limit: usize) -> Result<Vec<ExecutionRecord>> {
        let mut conn = self.conn()?;
        let mut query = execution_records::table
            .order(execution_records::id.desc())
            .limit(limit_of(limit))
            .into_boxed();
        if let Some(order) = order {
            query = query.filter(execution_records::order_id.eq(order.as_str().to_string()));
        }
        let rows: Vec<ExecutionRow> = query
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(execution_from_row).collect()
    }
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

#[async_trait]
impl PriceStore for SqliteStore {
    async fn upsert_price(&self, price: &TokenPrice) -> Result<()> {
        let row = TokenPriceRow {
            asset_id: price.asset.id().to_string(),
            class: price.asset.class().to_string(),
            price_usd: price.price_usd.to_string(),
            conversion: i64::try_from(price.conversion)
                .map_err(|_| Error::Parse(format!("conversion {} out of range", price.conversion)))?,
            updated_at: format_ts(price.updated_at),
        };
        let mut conn = self.conn()?;
        diesel::insert_into(token_prices::table)
            .values(&row)
            .on_conflict(token_prices::asset_id)
            .do_update()
            .set((
                token_prices::class.eq(&row.class),
                token_prices::price_usd.eq(&row.price_usd),
                token_prices::conversion.eq(row.conversion),
                token_prices::updated_at.eq(&row.updated_at),
            ))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn price(&self, asset: &Asset) -> Result<Option<TokenPrice>> {
        let mut conn = self.conn()?;
        let row: Option<TokenPriceRow> = token_prices::table
            .find(asset.id())
            .first(&mut conn)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.map(price_from_row).transpose()
    }

    async fn list_prices(&self) -> Result<Vec<TokenPrice>> {
        let mut conn = self.conn()?;
        let rows: Vec<TokenPriceRow> = token_prices::table
            .order(token_prices::asset_id.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(price_from_row).collect()
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[async_trait]
impl UserStore for SqliteStore {
    async fn add_user(&self, user: &UserAddress) -> Result<bool> {
        let mut conn = self.conn()?;
        let inserted = diesel::insert_or_ignore_into(users::table)
            .values(&UserRow {
                address: user.to_string(),
                created_at: format_ts(Utc::now()),
            })
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    async fn list_users(&self) -> Result<Vec<UserAddress>> {
        let mut conn = self.conn()?;
        let rows: Vec<UserRow> = users::table
            .order(users::address.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|r| UserAddress::new(r.address)).collect())
    }

    async fn remove_user(&self, user: &UserAddress) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(users::table.find(user.as_str()))
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }
}

// ---------------------------------------------------------------------------
// Error log
// ---------------------------------------------------------------------------

#[async_trait]
impl ErrorLogStore for SqliteStore {
    async fn log_error(&self, entry: &ErrorLogEntry) -> Result<()> {
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| {
            // References to rows that are already gone are dropped rather
            // than failing the foreign key.
            let order_id = match &entry.order_id {
                Some(id) => orders::table
                    .find(id.as_str())
                    .select(orders::id)
                    .first::<String>(conn)
                    .optional()?,
                None => None,
            };
            let user_address = match &entry.user {
                Some(user) => users::table
                    .find(user.as_str())
                    .select(users::address)
                    .first::<String>(conn)
                    .optional()?,
                None => None,
            };
            diesel::insert_into(error_log::table)
                .values(&NewErrorLogRow {
                    created_at: format_ts(entry.created_at),
                    order_id,
                    user_address,
                    method: entry.method.clone(),
                    message: entry.message.clone(),
                })
                .execute(conn)?;
            Ok::<_, diesel::result::Error>(())
        })?;
        Ok(())
    }

    async fn recent_errors(&self, limit: usize) -> Result<Vec<ErrorLogEntry>> {
        let mut conn = self.conn()?;
        let rows: Vec<ErrorLogRow> = error_log::table
            .order(error_log::id.desc())
            .limit(limit_of(limit))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(error_from_row).collect()
    }
}
