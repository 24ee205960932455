//! Durable stat persistence
//!
//! Append-only SQLite table of closed intervals. Appends are
//! fire-and-forget from the tracker's perspective: the writer task logs
//! persistence failures and keeps draining, so a lost row never affects
//! playback.

use sqlx::SqlitePool;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{error, info};

use signet_common::db::init_stat_database;
use signet_common::time::format_stat_timestamp;
use signet_common::Result;

use super::Stat;

/// Append-only store of closed stat records
#[derive(Clone)]
pub struct StatStore {
    pool: SqlitePool,
}

impl StatStore {
    /// Open (and if necessary create) the stat database at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = init_stat_database(db_path).await?;
        Ok(Self { pool })
    }

    /// Wrap an already-initialized pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one closed interval
    ///
    /// `item_id`/`tag` are stored as empty strings when absent. `sent`
    /// is written as 0; the transmission subsystem owns it from there.
    pub async fn append(&self, stat: &Stat) -> Result<()> {
        sqlx::query(
            "INSERT INTO stat (kind, fromdt, todt, schedule_id, layout_id, item_id, tag, sent) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(stat.kind.as_str())
        .bind(format_stat_timestamp(stat.from_dt))
        .bind(format_stat_timestamp(stat.to_dt))
        .bind(stat.schedule_id)
        .bind(stat.layout_id)
        .bind(stat.item_id.as_deref().unwrap_or(""))
        .bind(stat.tag.as_deref().unwrap_or(""))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Total number of recorded stats
    pub async fn total_recorded(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM stat")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of stats not yet collected by the transmission subsystem
    pub async fn total_unsent(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM stat WHERE sent = 0")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Background worker draining closed intervals into the store
///
/// Spawned once per player session:
///
/// ```no_run
/// # use signet_player::stats::{ProofOfPlayTracker, StatStore, StatWriter};
/// # async fn doc(store: StatStore) {
/// let (_tracker, rx) = ProofOfPlayTracker::new(true);
/// tokio::spawn(StatWriter::new(store, rx).run());
/// # }
/// ```
pub struct StatWriter {
    store: StatStore,
    rx: mpsc::UnboundedReceiver<Stat>,
}

impl StatWriter {
    pub fn new(store: StatStore, rx: mpsc::UnboundedReceiver<Stat>) -> Self {
        Self { store, rx }
    }

    /// Drain closed intervals until every tracker handle is dropped
    pub async fn run(mut self) {
        info!("Stat writer started");

        while let Some(stat) = self.rx.recv().await {
            if let Err(e) = self.store.append(&stat).await {
                error!(
                    schedule_id = stat.schedule_id,
                    layout_id = stat.layout_id,
                    item_id = ?stat.item_id,
                    "Error saving stat to database: {}",
                    e
                );
            }
        }

        info!("Stat writer stopped");
    }
}
