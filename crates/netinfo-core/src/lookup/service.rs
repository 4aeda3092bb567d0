//! Containment lookup, text search and statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use super::validation::{
    clamp_limit, escape_like, exact_term, parse_ip_or_cidr, sanitize_country, sanitize_term,
};
use super::LookupError;

/// Upper bound on rows returned by [`LookupService::lookup`]
pub const MAX_LOOKUP_RESULTS: i64 = 50;

/// Stored block as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlockRecord {
    pub inetnum: String,
    pub netname: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub maintained_by: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub source: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: i64,
    /// Largest registry first
    pub by_source: Vec<SourceCount>,
}

const SELECT_BLOCK: &str = r#"
    SELECT
        inetnum::text AS inetnum,
        netname,
        description,
        country,
        maintained_by,
        created,
        last_modified,
        source,
        status
    FROM block
"#;

/// Stateless query handle; cheap to clone
#[derive(Debug, Clone)]
pub struct LookupService {
    pool: PgPool,
}

impl LookupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All blocks containing `ip` (an address or CIDR), most specific first
    ///
    /// Ties on prefix length go to the most recently created block.
    #[tracing::instrument(skip(self))]
    pub async fn lookup(&self, ip: &str) -> Result<Vec<BlockRecord>, LookupError> {
        let network = parse_ip_or_cidr(ip)?;

        let rows = sqlx::query_as::<_, BlockRecord>(&format!(
            r#"{SELECT_BLOCK}
            WHERE inetnum >>= $1::cidr
            ORDER BY masklen(inetnum) DESC, created DESC NULLS LAST, id DESC
            LIMIT $2
            "#
        ))
        .bind(network.to_string())
        .bind(MAX_LOOKUP_RESULTS)
        .fetch_all(&self.pool)
        .await?;

        debug!(network = %network, results = rows.len(), "Lookup finished");
        Ok(rows)
    }

    /// Netname search: case-insensitive equality when `exact`, substring otherwise
    ///
    /// A substring search drops characters [`sanitize_term`] strips. An exact
    /// search rejects them with [`LookupError::InexactTerm`].
    #[tracing::instrument(skip(self))]
    pub async fn search_by_netname(
        &self,
        name: &str,
        limit: Option<i64>,
        exact: bool,
    ) -> Result<Vec<BlockRecord>, LookupError> {
        let name = if exact {
            exact_term(name)?
        } else {
            sanitize_term(name)?
        };
        let limit = clamp_limit(limit);

        let (condition, pattern) = if exact {
            ("lower(netname) = lower($1)", name)
        } else {
            ("netname ILIKE $1", format!("%{}%", escape_like(&name)))
        };

        let rows = sqlx::query_as::<_, BlockRecord>(&format!(
            r#"{SELECT_BLOCK}
            WHERE {condition}
            ORDER BY last_modified DESC NULLS LAST, id DESC
            LIMIT $2
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Full-text search over descriptions, best match first
    #[tracing::instrument(skip(self))]
    pub async fn search_by_description(
        &self,
        text: &str,
        limit: Option<i64>,
    ) -> Result<Vec<BlockRecord>, LookupError> {
        let text = sanitize_term(text)?;
        let limit = clamp_limit(limit);

        let rows = sqlx::query_as::<_, BlockRecord>(&format!(
            r#"{SELECT_BLOCK}
            WHERE to_tsvector('english', description) @@ plainto_tsquery('english', $1)
            ORDER BY ts_rank(to_tsvector('english', description), plainto_tsquery('english', $1)) DESC,
                     id DESC
            LIMIT $2
            "#
        ))
        .bind(text)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Blocks whose country starts with `code`, optionally narrowed by a
    /// netname substring
    #[tracing::instrument(skip(self))]
    pub async fn search_by_country(
        &self,
        code: &str,
        limit: Option<i64>,
        netname_filter: Option<&str>,
    ) -> Result<Vec<BlockRecord>, LookupError> {
        let code = sanitize_country(code)?;
        let netname_pattern = netname_filter
            .map(sanitize_term)
            .transpose()?
            .map(|name| format!("%{}%", escape_like(&name)));
        let limit = clamp_limit(limit);

        let rows = sqlx::query_as::<_, BlockRecord>(&format!(
            r#"{SELECT_BLOCK}
            WHERE country ILIKE $1
              AND ($2::text IS NULL OR netname ILIKE $2)
            ORDER BY last_modified DESC NULLS LAST, id DESC
            LIMIT $3
            "#
        ))
        .bind(format!("{}%", escape_like(&code)))
        .bind(netname_pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Total rows and rows per registry
    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> Result<Stats, LookupError> {
        let by_source = sqlx::query_as::<_, SourceCount>(
            r#"
            SELECT source, COUNT(*) AS count
            FROM block
            GROUP BY source
            ORDER BY count DESC, source
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(Stats {
            total: by_source.iter().map(|s| s.count).sum(),
            by_source,
        })
    }
}
