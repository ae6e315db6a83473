//! Integration tests against the public API

pub mod flush_test;
pub mod http_transport_test;
pub mod store_test;
