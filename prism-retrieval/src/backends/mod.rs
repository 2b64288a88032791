//! Built-in backend adapters.

mod volatile;

pub use volatile::VolatileBackend;
