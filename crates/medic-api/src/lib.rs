pub mod codes;
pub mod error;
pub mod init;
pub mod issue;
pub mod middleware;
pub mod notify;
pub mod trigger;

use std::sync::Arc;

use medic_db::Database;
use medic_gateway::dispatcher::Dispatcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub dispatcher: Dispatcher,
    pub jwt_secret: String,
}
