//! # Payment Network Kit
//!
//! A client for the Payment Network hosted payment page and direct API.
//! It builds signed gateway requests, renders the self-submitting form that
//! takes a cardholder to the hosted page, posts direct requests
//! server-to-server and verifies what the gateway sends back.
//!
//! Store glue (orders, addresses, sessions, page templates) stays with the
//! caller, which hands the kit a [`FieldMap`](types::FieldMap) and gets back a
//! [`RenderedForm`](form::RenderedForm) or a
//! [`ResponseOutcome`](response::ResponseOutcome).
//!
//! ## Components
//!
//! - **[`gateway`]**: The [`Gateway`](gateway::Gateway) client tying everything together.
//! - **[`config`]**: Merchant credentials, endpoints and timeouts.
//! - **[`response`]**: Signature checks and response-code dispatch.
//! - **[`form`]**: Hosted form rendering.
//! - **[`transport`]**: The [`DirectTransport`](transport::DirectTransport) seam and its
//!   `reqwest` implementation (feature `direct-client`, on by default).
//! - **[`audit`]**: Per-call audit records.
//! - **[`types`]**, **[`signature`]**, **[`encoding`]**: Re-exported from `paynet-core`.
//!
//! ## Hosted flow
//!
//! ```
//! use paynet_kit::{
//!     config::GatewayConfig,
//!     gateway::Gateway,
//!     response::ResponseOutcome,
//!     signature,
//!     types::FieldMap,
//! };
//!
//! let gateway = Gateway::new(
//!     GatewayConfig::builder()
//!         .merchant_id("100856")
//!         .merchant_secret("Circle4Take40Idea")
//!         .build(),
//! )
//! .unwrap();
//!
//! // 1. Render the form that sends the browser to the hosted page.
//! let form = gateway
//!     .hosted_request(
//!         FieldMap::new()
//!             .with("action", "SALE")
//!             .with("type", 1)
//!             .with("amount", 1001)
//!             .with("redirectURL", "https://shop.example.com/checkout/return"),
//!         None,
//!     )
//!     .unwrap();
//! assert!(form.as_str().starts_with(r#"<form id="silentPost""#));
//!
//! // 2. Verify what the gateway posts back to `redirectURL`.
//! let mut posted = FieldMap::new().with("responseCode", "0").with("xref", "21010101");
//! let signed = signature::sign(&posted, "Circle4Take40Idea", None).unwrap();
//! posted.insert("signature", signed);
//!
//! match gateway.verify_response(posted).unwrap() {
//!     ResponseOutcome::Success(fields) => assert_eq!(fields.get_text("xref"), Some("21010101")),
//!     ResponseOutcome::StepUpRequired(step_up) => panic!("3-D Secure v{}", step_up.version),
//!     ResponseOutcome::Declined(decline) => panic!("{decline}"),
//! }
//! ```

pub mod audit;
pub mod config;
pub mod errors;
pub mod form;
pub mod gateway;
pub mod origin;
pub mod response;
pub mod transport;

pub mod types {
    pub use paynet_core::types::*;
}

pub use paynet_core::{encoding, signature};
