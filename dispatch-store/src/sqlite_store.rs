use async_trait::async_trait;
use chrono::Utc;
use dispatch_core::{reservation_id, DecisionRecord, DispatchStore, StoreError};
use dispatch_routing::cache::CacheError;
use dispatch_routing::DistanceCache;
use dispatch_shared::{Decision, DecisionMeta, Offer, RouteInfo, Warehouse, WarehouseStatus};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Durable store over embedded SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create the schema if needed.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        // in-memory databases exist per connection; a single connection
        // keeps one coherent database either way
        let pool = SqlitePoolOptions::new().max_connections(1).connect(url).await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS warehouses(
                warehouse_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                capacity_cbm REAL NOT NULL,
                used_cbm REAL NOT NULL,
                service_limit REAL NOT NULL,
                status TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS distance_cache(
                key TEXT PRIMARY KEY,
                a_lat REAL, a_lng REAL, b_lat REAL, b_lng REAL,
                km REAL NOT NULL,
                minutes REAL NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS decision_runs(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts INTEGER NOT NULL,
                offer_json TEXT NOT NULL,
                decision_json TEXT NOT NULL,
                meta_json TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert the given warehouses. With `force` false, an already-populated
    /// table is left alone.
    pub async fn seed(&self, warehouses: Vec<Warehouse>, force: bool) -> Result<(), sqlx::Error> {
        if !force {
            let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM warehouses")
                .fetch_one(&self.pool)
                .await?
                .try_get("n")?;
            if count > 0 {
                return Ok(());
            }
        }

        for warehouse in warehouses {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO warehouses
                    (warehouse_id, name, lat, lng, capacity_cbm, used_cbm, service_limit, status)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&warehouse.warehouse_id)
            .bind(&warehouse.name)
            .bind(warehouse.lat)
            .bind(warehouse.lng)
            .bind(warehouse.capacity_cbm)
            .bind(warehouse.used_cbm)
            .bind(warehouse.service_limit)
            .bind(warehouse.status.to_string())
            .execute(&self.pool)
            .await?;
        }
        info!("warehouse fleet seeded");
        Ok(())
    }

    /// Current snapshot of one warehouse, mainly for assertions and tooling.
    pub async fn warehouse(&self, warehouse_id: &str) -> Result<Option<Warehouse>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT warehouse_id, name, lat, lng, capacity_cbm, used_cbm, service_limit, status \
             FROM warehouses WHERE warehouse_id = ?",
        )
        .bind(warehouse_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| warehouse_from_row(&r)))
    }
}

fn warehouse_from_row(row: &sqlx::sqlite::SqliteRow) -> Warehouse {
    let status: String = row.get("status");
    Warehouse {
        warehouse_id: row.get("warehouse_id"),
        name: row.get("name"),
        lat: row.get("lat"),
        lng: row.get("lng"),
        capacity_cbm: row.get("capacity_cbm"),
        used_cbm: row.get("used_cbm"),
        service_limit: row.get("service_limit"),
        status: status.parse().unwrap_or(WarehouseStatus::Inactive),
    }
}

#[async_trait]
impl DistanceCache for SqliteStore {
    async fn get_route(&self, key: &str) -> Result<Option<RouteInfo>, CacheError> {
        let row = sqlx::query("SELECT km, minutes, expires_at FROM distance_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: i64 = row.get("expires_at");
        if expires_at < Utc::now().timestamp() {
            // lazy expiry; collect the dead row while we are here
            sqlx::query("DELETE FROM distance_cache WHERE key = ?")
                .bind(key)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        Ok(Some(RouteInfo {
            km: row.get("km"),
            minutes: row.get("minutes"),
        }))
    }

    async fn put_route(
        &self,
        key: &str,
        endpoints: ((f64, f64), (f64, f64)),
        km: f64,
        minutes: f64,
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        let ((a_lat, a_lng), (b_lat, b_lng)) = endpoints;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO distance_cache
                (key, a_lat, a_lng, b_lat, b_lng, km, minutes, expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(key)
        .bind(a_lat)
        .bind(a_lng)
        .bind(b_lat)
        .bind(b_lng)
        .bind(km)
        .bind(minutes)
        .bind(Utc::now().timestamp() + ttl_seconds as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DispatchStore for SqliteStore {
    async fn list_active_warehouses(&self) -> Result<Vec<Warehouse>, StoreError> {
        let rows = sqlx::query(
            "SELECT warehouse_id, name, lat, lng, capacity_cbm, used_cbm, service_limit, status \
             FROM warehouses WHERE UPPER(status) = 'ACTIVE' ORDER BY warehouse_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(warehouse_from_row).collect())
    }

    async fn try_hold_capacity(&self, warehouse_id: &str, offer_id: &str, volume_cbm: f64) -> Result<Option<String>, StoreError> {
        // the condition and the increment ride in one statement, so two
        // racing holds can never both pass the capacity check
        let result = sqlx::query(
            "UPDATE warehouses SET used_cbm = used_cbm + ? \
             WHERE warehouse_id = ? AND used_cbm + ? <= capacity_cbm",
        )
        .bind(volume_cbm)
        .bind(warehouse_id)
        .bind(volume_cbm)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            info!(warehouse_id, volume_cbm, "capacity held");
            Ok(Some(reservation_id(offer_id, warehouse_id)))
        } else {
            Ok(None)
        }
    }

    async fn release_capacity(&self, warehouse_id: &str, volume_cbm: f64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE warehouses SET used_cbm = MAX(used_cbm - ?, 0.0) WHERE warehouse_id = ?",
        )
        .bind(volume_cbm)
        .bind(warehouse_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_decision(&self, offer: &Offer, decision: &Decision, meta: &DecisionMeta) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO decision_runs(ts, offer_json, decision_json, meta_json) VALUES (?, ?, ?, ?)")
            .bind(Utc::now().timestamp())
            .bind(serde_json::to_string(offer)?)
            .bind(serde_json::to_string(decision)?)
            .bind(serde_json::to_string(meta)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn recent_decisions(&self, days: u32) -> Result<Vec<DecisionRecord>, StoreError> {
        let since = Utc::now().timestamp() - i64::from(days) * 24 * 3600;
        let rows = sqlx::query("SELECT ts, offer_json, decision_json FROM decision_runs WHERE ts >= ? ORDER BY ts ASC")
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let ts: i64 = row.get("ts");
            let offer_json: String = row.get("offer_json");
            let decision_json: String = row.get("decision_json");
            match (serde_json::from_str(&offer_json), serde_json::from_str(&decision_json)) {
                (Ok(offer), Ok(decision)) => records.push(DecisionRecord { ts, offer, decision }),
                _ => warn!(ts, "skipping malformed decision run"),
            }
        }
        Ok(records)
    }
}
