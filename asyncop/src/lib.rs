mod async_error;
mod async_state;
mod auth;
mod execution_result;
mod operation;
mod response;
mod scope;
mod stream_ext;
pub mod mock;

#[cfg(test)]
mod unit_tests;

pub use async_error::*;
pub use async_state::*;
pub use auth::*;
pub use execution_result::*;
pub use operation::*;
pub use response::*;
pub use scope::*;
pub use stream_ext::*;
