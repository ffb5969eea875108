//! Repository implementations.
//!
//! - `local`: In-memory implementation for unit testing, local development,
//!   and embedding. Production deployments implement the port traits over
//!   their own store and plug in through the factory.

pub mod local;

pub use local::LocalRepository;
