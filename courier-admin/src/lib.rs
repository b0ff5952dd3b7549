pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod response;
pub mod server;

pub use server::{AdminState, build_admin_router, build_app, serve};
