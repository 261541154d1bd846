//! Configuration for a match server and its clients

use crate::game::pool::PoolPolicy;

/// Main configuration shared by the registry, the host and the clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Number of pieces generated per pool batch
    pub pool_size: usize,

    /// Behaviour when a player reaches the end of the pool
    pub pool_policy: PoolPolicy,

    /// Fixed seed for piece pools (None = fresh OS seed per pool)
    pub pool_seed: Option<u64>,

    /// Capacity of a new match when the creator does not set one
    pub default_max_players: usize,

    /// Upper bound accepted for a match capacity
    pub max_players_limit: usize,

    /// Key expression prefix for arena communication
    pub keyexpr_prefix: String,

    /// How long a client waits for a request reply (in milliseconds)
    pub request_timeout_ms: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            pool_size: 100,
            pool_policy: PoolPolicy::Fixed,
            pool_seed: None,
            default_max_players: 2,
            max_players_limit: 8,
            keyexpr_prefix: "tetris/arena".to_string(),
            request_timeout_ms: 3000,
        }
    }
}

impl ArenaConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool batch size
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Set the pool exhaustion policy
    pub fn with_pool_policy(mut self, policy: PoolPolicy) -> Self {
        self.pool_policy = policy;
        self
    }

    /// Use a reproducible pool seed
    pub fn with_pool_seed(mut self, seed: u64) -> Self {
        self.pool_seed = Some(seed);
        self
    }

    /// Set the default match capacity
    pub fn with_default_max_players(mut self, max_players: usize) -> Self {
        self.default_max_players = max_players.clamp(1, self.max_players_limit);
        self
    }

    /// Set the largest capacity a match may be configured with
    pub fn with_max_players_limit(mut self, limit: usize) -> Self {
        self.max_players_limit = limit.max(1);
        self.default_max_players = self.default_max_players.min(self.max_players_limit);
        self
    }

    /// Set the key expression prefix
    pub fn with_keyexpr_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.keyexpr_prefix = prefix.into();
        self
    }

    /// Set the request timeout in milliseconds
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}
