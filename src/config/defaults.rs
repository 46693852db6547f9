//! Built-in defaults and environment variable names.
//!
//! Defaults target the docker-compose network used in development, where
//! each store is reachable by its service name.

// ============================================================================
// Application
// ============================================================================

pub const ENVIRONMENT: &str = "development";

pub const LOG_LEVEL: &str = "INFO";

/// Bind address for the HTTP server.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";

/// Environment name that turns on development-only conveniences
/// (currently: the `/config` endpoint when `expose_config` is unset).
pub const DEVELOPMENT_ENVIRONMENT: &str = "development";

// ============================================================================
// Stores
// ============================================================================

pub const GRAPH_URL: &str = "neo4j://neo4j:7687";
pub const GRAPH_USERNAME: &str = "neo4j";
pub const GRAPH_PASSWORD: &str = "password";

/// Upper bound on pooled Bolt connections.
pub const GRAPH_MAX_CONNECTIONS: usize = 16;

pub const VECTOR_URL: &str = "http://qdrant:6333";

pub const CACHE_URL: &str = "redis://redis:6379";

// ============================================================================
// Timeouts
// ============================================================================

/// Bound on connect + first ping for each store at startup (seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Bound on a single liveness probe during `/health` (seconds).
pub const PROBE_TIMEOUT_SECS: u64 = 3;

// ============================================================================
// Config Sources
// ============================================================================

/// TOML file picked up from the working directory when no path is given.
pub const CONFIG_FILE: &str = "graphrag.toml";

/// Dotenv file picked up from the working directory when no path is given.
pub const ENV_FILE: &str = ".env";

/// Placeholder written over secrets when settings are printed.
pub const REDACTED: &str = "********";

// ============================================================================
// Environment Variables
// ============================================================================

pub mod env {
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    pub const FRONTEND_DOMAIN: &str = "FRONTEND_DOMAIN";
    pub const EXPOSE_CONFIG: &str = "EXPOSE_CONFIG";
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const NEO4J_URL: &str = "NEO4J_URL";
    pub const NEO4J_USERNAME: &str = "NEO4J_USERNAME";
    pub const NEO4J_PASSWORD: &str = "NEO4J_PASSWORD";
    pub const QDRANT_URL: &str = "QDRANT_URL";
    pub const QDRANT_API_KEY: &str = "QDRANT_API_KEY";
    pub const REDIS_URL: &str = "REDIS_URL";
    pub const CONNECT_TIMEOUT_SECS: &str = "CONNECT_TIMEOUT_SECS";
    pub const PROBE_TIMEOUT_SECS: &str = "PROBE_TIMEOUT_SECS";
}
