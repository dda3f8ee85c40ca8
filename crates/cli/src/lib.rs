pub mod cli;
pub mod error;
pub mod scenario;

pub use error::Error;
