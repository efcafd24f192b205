pub mod analysis_handlers;
pub mod chat_handlers;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod router;
pub mod server;

pub use error::{ApiError, Result};
pub use repository::{CalculatorRepository, StoreRepository};
pub use router::{create_router, AppState, SharedState};
pub use server::{init_tracing, run_server};
