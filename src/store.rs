use async_trait::async_trait;
use log::*;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Connection;

use crate::config::DbConfig;
use crate::error::PollError;
use crate::models::VoteTally;
use crate::schema;

/**
 * Durable home of the vote counters
 */
#[async_trait]
pub trait TallyStore: Send + Sync {
    /**
     * Add exactly one vote for `option_id`, creating its row on first use
     */
    async fn increment(&self, option_id: &str) -> Result<(), PollError>;

    /**
     * Every counter row currently stored, known option or not
     */
    async fn tallies(&self) -> Result<Vec<VoteTally>, PollError>;
}

#[derive(Clone, Debug)]
pub struct PgTallyStore {
    pool: PgPool,
}

impl PgTallyStore {
    /**
     * Build the pool without touching the network, connections are opened
     * on first use so the service can start while the database is down
     */
    pub fn connect_lazy(config: &DbConfig) -> Result<Self, PollError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_timeout(config.connect_timeout)
            .connect_lazy_with(config.connect_options()?);
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TallyStore for PgTallyStore {
    async fn increment(&self, option_id: &str) -> Result<(), PollError> {
        let mut conn = self.pool.acquire().await.map_err(|err| {
            error!("Error connecting to database: {:?}", err);
            PollError::DependencyUnavailable(err)
        })?;

        let mut tx = conn.begin().await.map_err(PollError::Internal)?;

        let outcome = sqlx::query(schema::UPSERT_VOTE)
            .bind(option_id)
            .execute(&mut tx)
            .await;

        match outcome {
            Ok(_) => tx.commit().await.map_err(|err| {
                error!("Failed to commit vote for {}: {:?}", option_id, err);
                PollError::Internal(err)
            }),
            Err(err) => {
                error!("Failed to record vote for {}: {:?}", option_id, err);
                if let Err(rollback) = tx.rollback().await {
                    warn!("Rollback after failed vote also failed: {:?}", rollback);
                }
                Err(PollError::Internal(err))
            }
        }
    }

    async fn tallies(&self) -> Result<Vec<VoteTally>, PollError> {
        let mut conn = self.pool.acquire().await.map_err(|err| {
            error!("Error connecting to database: {:?}", err);
            PollError::DependencyUnavailable(err)
        })?;

        sqlx::query_as::<_, VoteTally>(schema::SELECT_TALLIES)
            .fetch_all(&mut conn)
            .await
            .map_err(|err| {
                error!("Failed to fetch tallies: {:?}", err);
                PollError::Internal(err)
            })
    }
}

/**
 * Stores used by the HTTP and logic tests
 */
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct MemoryStore {
        counts: Mutex<HashMap<String, i64>>,
    }

    impl MemoryStore {
        pub fn with_rows(rows: &[(&str, i64)]) -> Self {
            let counts = rows.iter().map(|(id, n)| (id.to_string(), *n)).collect();
            Self {
                counts: Mutex::new(counts),
            }
        }
    }

    #[async_trait]
    impl TallyStore for MemoryStore {
        async fn increment(&self, option_id: &str) -> Result<(), PollError> {
            let mut counts = self.counts.lock().unwrap();
            *counts.entry(option_id.to_string()).or_insert(0) += 1;
            Ok(())
        }

        async fn tallies(&self) -> Result<Vec<VoteTally>, PollError> {
            let counts = self.counts.lock().unwrap();
            Ok(counts
                .iter()
                .map(|(id, n)| VoteTally {
                    option_id: id.clone(),
                    vote_count: *n,
                })
                .collect())
        }
    }

    /**
     * A store whose database can never be reached
     */
    #[derive(Debug, Default)]
    pub struct DownStore;

    #[async_trait]
    impl TallyStore for DownStore {
        async fn increment(&self, _option_id: &str) -> Result<(), PollError> {
            Err(PollError::DependencyUnavailable(sqlx::Error::PoolTimedOut))
        }

        async fn tallies(&self) -> Result<Vec<VoteTally>, PollError> {
            Err(PollError::DependencyUnavailable(sqlx::Error::PoolTimedOut))
        }
    }

    /**
     * Reachable, but every statement fails
     */
    #[derive(Debug, Default)]
    pub struct BrokenStore;

    #[async_trait]
    impl TallyStore for BrokenStore {
        async fn increment(&self, _option_id: &str) -> Result<(), PollError> {
            Err(PollError::Internal(sqlx::Error::RowNotFound))
        }

        async fn tallies(&self) -> Result<Vec<VoteTally>, PollError> {
            Err(PollError::Internal(sqlx::Error::RowNotFound))
        }
    }
}

/**
 * These run against a real PostgreSQL when TEST_DATABASE_URL is set and
 * are skipped otherwise
 */
#[cfg(test)]
mod pg_tests {
    use super::*;
    use std::time::Duration;

    async fn test_store() -> Option<PgTallyStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("failed to connect to TEST_DATABASE_URL");
        sqlx::query(schema::CREATE_VOTES)
            .execute(&pool)
            .await
            .expect("failed to create votes table");
        Some(PgTallyStore::from_pool(pool))
    }

    async fn count_for(store: &PgTallyStore, option_id: &str) -> i64 {
        store
            .tallies()
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.option_id == option_id)
            .map(|t| t.vote_count)
            .unwrap_or(0)
    }

    #[async_std::test]
    async fn upsert_creates_then_increments() {
        let store = match test_store().await {
            Some(store) => store,
            None => return,
        };

        let before = count_for(&store, "go").await;
        store.increment("go").await.unwrap();
        store.increment("go").await.unwrap();
        assert_eq!(count_for(&store, "go").await, before + 2);
    }

    #[async_std::test]
    async fn concurrent_increments_are_not_lost() {
        let store = match test_store().await {
            Some(store) => store,
            None => return,
        };

        let before = count_for(&store, "rust").await;
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                async_std::task::spawn(async move { store.increment("rust").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(count_for(&store, "rust").await, before + 20);
    }

    #[async_std::test]
    async fn unreachable_database_is_dependency_unavailable() {
        let config = DbConfig {
            host: "127.0.0.1".into(),
            port: 1,
            dbname: "poll_db".into(),
            user: "poll_user".into(),
            password: "poll_password".into(),
            url: None,
            max_connections: 1,
            connect_timeout: Duration::from_millis(500),
        };
        let store = PgTallyStore::connect_lazy(&config).unwrap();

        assert!(matches!(
            store.increment("go").await,
            Err(PollError::DependencyUnavailable(_))
        ));
        assert!(matches!(
            store.tallies().await,
            Err(PollError::DependencyUnavailable(_))
        ));
    }
}
