pub mod cex_api;

pub use cex_api::{create_cex_router, ApiError, CexApiState};
