pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCredentialStore;
pub use in_memory::InMemoryRefreshTokenStore;
pub use postgres::PostgresCredentialStore;
pub use postgres::PostgresRefreshTokenStore;
