//! `block` table lifecycle
//!
//! The table is dropped and recreated at the start of every full rebuild.
//! Resetting while another run is writing to the same database loses that
//! run's rows; callers must not overlap runs.

use sqlx::PgPool;
use tracing::{info, warn};

use super::DbResult;

pub const BLOCK_TABLE: &str = "block";

const DROP_TABLE: &str = "DROP TABLE IF EXISTS block";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS block (
    id BIGSERIAL PRIMARY KEY,
    inetnum CIDR NOT NULL,
    netname TEXT,
    description TEXT,
    country TEXT,
    maintained_by TEXT,
    created TIMESTAMPTZ,
    last_modified TIMESTAMPTZ,
    source TEXT NOT NULL CHECK (source IN ('afrinic', 'apnic', 'arin', 'lacnic', 'ripe')),
    status TEXT,
    import_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Containment and full-text indexes first, then the search helpers
const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS ix_block_inetnum ON block USING gist (inetnum inet_ops)",
    "CREATE INDEX IF NOT EXISTS ix_block_description ON block USING gin (to_tsvector('english', description))",
    "CREATE INDEX IF NOT EXISTS ix_block_netname ON block (lower(netname))",
    "CREATE INDEX IF NOT EXISTS ix_block_country ON block (country)",
    "CREATE INDEX IF NOT EXISTS ix_block_source ON block (source)",
    "CREATE INDEX IF NOT EXISTS ix_block_last_modified ON block (last_modified)",
];

/// Owns DDL for the `block` table
pub struct SchemaManager {
    pool: PgPool,
}

impl SchemaManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop and recreate the table with its indexes, in one transaction
    ///
    /// Irreversible: every stored block is deleted.
    pub async fn reset(&self) -> DbResult<()> {
        warn!(table = BLOCK_TABLE, "Dropping and recreating table");
        let mut tx = self.pool.begin().await?;
        sqlx::query(DROP_TABLE).execute(&mut *tx).await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
        for statement in CREATE_INDEXES {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!(table = BLOCK_TABLE, indexes = CREATE_INDEXES.len(), "Schema reset");
        Ok(())
    }

    /// Create the table and indexes if they do not exist yet
    pub async fn ensure(&self) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
        for statement in CREATE_INDEXES {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
