pub mod common_headers;
pub mod recover;
pub mod request_log;
