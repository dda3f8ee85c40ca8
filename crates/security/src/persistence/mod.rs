#![forbid(unsafe_code)]

mod memory;
mod repo;
mod transaction;

pub use memory::InMemoryRepository;
pub use repo::StatusRepository;
pub(crate) use transaction::Transaction;
