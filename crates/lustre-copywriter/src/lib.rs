pub mod client;
pub mod error;
pub mod types;

pub use client::CopywriterClient;
pub use error::CopywriterError;
pub use types::DescriptionRequest;
