//! Concrete [`ShareConnector`](crate::share::ShareConnector) implementations.
//!
//! Network protocol clients are supplied by the host application; this
//! crate ships a filesystem-backed share for offline development and
//! tests.

pub mod local_share;

pub use local_share::{LocalShareClient, LocalShareConnector};
