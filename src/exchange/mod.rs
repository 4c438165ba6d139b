pub mod client;
pub mod depth;
pub mod markets;
pub mod traits;

pub use client::ExchangeClient;
pub use traits::*;
