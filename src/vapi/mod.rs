//! Vapi REST API client.

mod client;
pub mod transport;
pub mod types;

pub use self::client::VapiClient;
pub use self::transport::{HttpTransport, VapiRequest, VapiTransport};
pub use self::types::*;
