//! # Meridian Test
//!
//! In-memory testing for Meridian applications: requests go straight into a
//! [`Dispatcher`](meridian_server::Dispatcher), with no socket or port.
//!
//! ## Example
//!
//! ```ignore
//! use http::StatusCode;
//! use meridian_test::TestClient;
//!
//! #[tokio::test]
//! async fn test_get_user() {
//!     let client = TestClient::new(build_app().unwrap());
//!
//!     let response = client.get("/users/u1").bearer_token("secret").send().await;
//!     response.assert_status(StatusCode::OK);
//!     assert_eq!(response.json_value().unwrap()["id"], "u1");
//!
//!     client
//!         .get("/users/nobody")
//!         .send()
//!         .await
//!         .assert_api_error(StatusCode::NOT_FOUND, "object.notfound");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
