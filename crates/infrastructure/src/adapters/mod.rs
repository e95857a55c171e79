//! Adapter implementations

mod reqwest_client;

pub use reqwest_client::{HttpClientConfig, ReqwestHttpClient};
