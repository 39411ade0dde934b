//! pathtrie Rust facade: build an `App` from a route file or the demo routes.

pub mod routes;

pub use pathtrie_core::{App, CoreError, Params, RegistrationPolicy, Request, ResponseWriter, ServerConfig};
pub use routes::{demo_routes, RouteFile, RouteSpec};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid route file: {0}")]
    RouteFile(#[from] toml::de::Error),
    #[error("cannot read route file: {0}")]
    Io(#[from] std::io::Error),
}
