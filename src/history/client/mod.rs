pub mod http;
pub mod mock;

pub use http::HttpHistoryClient;
pub use mock::{MockHistoryClient, MockReply};
