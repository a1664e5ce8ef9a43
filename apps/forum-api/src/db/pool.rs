use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

pub type DbPool = Pool<AsyncPgConnection>;

/// Maximum number of pooled Postgres connections.
const MAX_CONNECTIONS: usize = 16;

/// Create a Diesel async connection pool.
pub async fn connect(database_url: &str) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(manager)
        .max_size(MAX_CONNECTIONS)
        .build()
        .expect("failed to build connection pool");

    tracing::info!(max_size = MAX_CONNECTIONS, "database pool created");

    pool
}
