pub mod publisher;
pub mod reader;

pub use publisher::ResultPublisher;
pub use reader::{load_latest, ReadError};
