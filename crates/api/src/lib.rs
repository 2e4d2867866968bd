mod env;
mod response;
mod routes;
mod utils;

pub use routes::{health_routes, serve};

pub use env::ApiServerEnv;
pub use utils::setup_tracing;
pub use response::{AppSuccess, GenericResponse};
