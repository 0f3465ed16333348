use crate::{GarminClient, GarminError, LoginInfo};
use std::time::Duration;

/// Bounded login retry with a fixed backoff between attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total login attempts, including the first one.
    pub max_attempts: u32,
    pub backoff: Duration,
    /// Rebuild the client (fresh HTTP session, no stale cookies or token)
    /// before every retry.
    pub recreate_client: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(5),
            recreate_client: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

pub type ClientFactory<C> = Box<dyn Fn() -> Result<C, GarminError> + Send + Sync>;

/// Owns the single client instance of a run and drives its login.
pub struct Reconnector<C: GarminClient> {
    client: C,
    factory: ClientFactory<C>,
    policy: RetryPolicy,
    state: ConnectionState,
}

impl<C: GarminClient> Reconnector<C> {
    pub fn new(policy: RetryPolicy, factory: ClientFactory<C>) -> Result<Self, GarminError> {
        let client = factory()?;
        Ok(Self {
            client,
            factory,
            policy,
            state: ConnectionState::Disconnected,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Log in, retrying up to the policy's budget. Each call re-attempts
    /// unconditionally, even when already connected.
    pub async fn connect(&mut self) -> Result<LoginInfo, GarminError> {
        self.state = ConnectionState::Connecting;
        let max = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max {
            match self.client.login().await {
                Ok(info) => {
                    tracing::info!(attempt, user = %info.display_name, "login successful");
                    self.state = ConnectionState::Connected;
                    return Ok(info);
                }
                Err(e) => {
                    tracing::info!(
                        attempt,
                        max_attempts = max,
                        connectivity = e.is_connectivity(),
                        error = %e,
                        "login failed"
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < max {
                tokio::time::sleep(self.policy.backoff).await;
                if self.policy.recreate_client {
                    match (self.factory)() {
                        Ok(fresh) => self.client = fresh,
                        Err(e) => {
                            tracing::warn!(error = %e, "could not recreate client; reusing the old one")
                        }
                    }
                }
            }
        }

        self.state = ConnectionState::Failed;
        tracing::error!(attempts = max, "can not connect");
        Err(GarminError::RetriesExhausted {
            attempts: max,
            last: last_error,
        })
    }
}
