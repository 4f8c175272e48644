mod redis_broker;

pub use redis_broker::RedisBroker;

use crate::error::BrokerError;
use async_trait::async_trait;
use std::time::Duration;

/// Broker adapter (C2): a thin wrapper over a FIFO list-broker.
///
/// Treated as a black box: `push_left` + `blocking_pop_right` together give
/// FIFO ordering with respect to a single enqueuer; with concurrent
/// enqueuers only "delivered exactly once to exactly one worker" is
/// required.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn push_left(&self, item: String) -> Result<(), BrokerError>;
    async fn blocking_pop_right(&self, timeout: Duration) -> Result<Option<String>, BrokerError>;
    async fn length(&self) -> Result<i64, BrokerError>;
}

/// An in-memory `Broker`, mirroring the role `InMemoryBus` plays for
/// `EventBus` in the platform's event-bus crate: same trait contract, no
/// external process required.
pub mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    pub struct InMemoryBroker {
        queue: Mutex<VecDeque<String>>,
        notify: Notify,
    }

    impl InMemoryBroker {
        pub fn new() -> Self {
            Self {
                queue: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl Broker for InMemoryBroker {
        async fn push_left(&self, item: String) -> Result<(), BrokerError> {
            self.queue.lock().unwrap().push_front(item);
            self.notify.notify_one();
            Ok(())
        }

        async fn blocking_pop_right(
            &self,
            timeout: Duration,
        ) -> Result<Option<String>, BrokerError> {
            if let Some(item) = self.queue.lock().unwrap().pop_back() {
                return Ok(Some(item));
            }

            let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
            Ok(self.queue.lock().unwrap().pop_back())
        }

        async fn length(&self) -> Result<i64, BrokerError> {
            Ok(self.queue.lock().unwrap().len() as i64)
        }
    }
}
