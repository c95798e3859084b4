pub mod filter;
pub mod orchestrator;
pub mod result;
pub mod select;
pub mod snapshot;
