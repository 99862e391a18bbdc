//! Persistence for advert subscriptions: subscribers register once, subscribe
//! to adverts, and can later be listed per advert.

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod model;
pub mod sql;

pub use db::{SqlSubscriberRepository, SubscriberRepository};
pub use error::{RepoError, StoreError};
pub use model::{Subscriber, Subscription};
