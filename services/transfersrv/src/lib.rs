//! Catalog Transfer Service
//!
//! Keeps the web database's product and shop catalogs in step with the
//! production database. Runs are triggered over HTTP or from the command
//! line; the reconciliation itself lives in `catalog-recon`.

pub mod api;
pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod store;

pub use app_state::AppState;
pub use error::{Result, TransferSrvError};
