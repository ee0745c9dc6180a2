mod schema;
pub mod from_row;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::TokenKeys;
use crate::email::EmailService;
use crate::payments::StripeClient;
use crate::registry::AdminRegistry;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every handler. All collaborators are
/// injected here at construction time so tests can substitute them.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub tokens: TokenKeys,
    pub stripe: Arc<StripeClient>,
    pub email: Arc<EmailService>,
    pub admin: Arc<AdminRegistry>,
    pub base_url: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
