//! Marketplace document types.
//!
//! These are the read models for the documents the application keeps in its
//! backing store. Creation and mutation happen through field-level writes in
//! the `market` crate's repositories, so the structs here only need to
//! deserialize what the store hands back (plus `Serialize` for fixtures).

pub mod notification;
pub mod order;
pub mod product;
pub mod profile;
pub mod review;
pub mod story;

pub use notification::Notification;
pub use order::{Order, OrderItem};
pub use product::Product;
pub use profile::{CartEntry, GeoPoint, UserProfile};
pub use review::Review;
pub use story::Story;
