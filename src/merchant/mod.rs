//! Store listings pulled from the Shopify Admin API. Uploaded exports go
//! through [`crate::parser`] instead.

pub mod shopify;

pub use shopify::ShopifyClient;
