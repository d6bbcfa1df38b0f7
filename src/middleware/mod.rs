pub mod api_headers;

pub use api_headers::ApiHeaders;
