pub mod client;
pub mod retry;

pub use client::{MegaverseApi, MegaverseClient};
pub use retry::RetryPolicy;
