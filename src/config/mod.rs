//! Service Configuration
//!
//! ## Loading Order
//!
//! 1. Built-in defaults (docker-compose service names)
//! 2. TOML file: `--config` / `GRAPHRAG_CONFIG`, else `./graphrag.toml`
//! 3. `.env` file: `--env-file`, else `./.env`
//! 4. Process environment (`NEO4J_URL`, `REDIS_URL`, ...)
//!
//! ## Usage
//!
//! ```ignore
//! let loaded = Settings::load(&ConfigSources::discover(None, None))?;
//! let settings = Arc::new(loaded.settings);
//! ```
//!
//! Settings are loaded once in `main` and handed to each component that
//! needs them; there is no global accessor.

pub mod defaults;
mod settings;
pub mod validation;

pub use settings::*;
pub use validation::ValidationWarning;
