use super::Broker;
use crate::config::QUEUE_NAME;
use crate::error::BrokerError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Redis-backed `Broker`. `ConnectionManager` reconnects transparently and
/// is safe for concurrent use, which is what lets the ingress share a
/// single handle across all HTTP request tasks (§5's resource table).
#[derive(Clone)]
pub struct RedisBroker {
    conn: ConnectionManager,
}

impl RedisBroker {
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(url)
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn push_left(&self, item: String) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(QUEUE_NAME, item)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn blocking_pop_right(&self, timeout: Duration) -> Result<Option<String>, BrokerError> {
        let mut conn = self.conn.clone();
        let result: Option<(String, String)> = conn
            .brpop(QUEUE_NAME, timeout.as_secs_f64())
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(result.map(|(_, item)| item))
    }

    async fn length(&self) -> Result<i64, BrokerError> {
        let mut conn = self.conn.clone();
        let len: i64 = conn
            .llen(QUEUE_NAME)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(len)
    }
}
