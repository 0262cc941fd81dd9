//! Platforms
//!
//! Each platform is one deployment of the compared database, reachable
//! through a uniform handle: configuration check, health check, ad-hoc
//! query, schema introspection and disconnect.

mod handle;
mod registry;
mod types;
mod values;

pub(crate) use handle::create_pool;
pub use handle::{describe_pg_error, Platform, PoolSettings};
pub use registry::PlatformRegistry;
pub use types::{HealthCheckResult, PlatformId, QueryResult};
pub use values::{is_binary_decodable, row_to_json, text_to_json};
