pub mod diesel_pool;

pub use diesel_pool::{
    check_diesel_health, create_diesel_pool, mask_connection_string, DatabaseHealth,
    DieselDatabaseConfig, DieselPool,
};
