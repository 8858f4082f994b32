mod schema;

pub use schema::{BackendConfig, ChatDefaults, Config, StorageConfig};
