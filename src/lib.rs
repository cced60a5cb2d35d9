//! # Wrangler - Client for a Remote Dataset Service
//!
//! Wrangler imports tabular files into a dataset service over REST, lists what
//! the service holds, and lets you view and edit one dataset at a time as a
//! spreadsheet before saving it back. Parsing, storage, analysis and export
//! all happen on the server; this crate is the client side.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use wrangler::api::HttpDatasetApi;
//! use wrangler::config::ClientConfig;
//! use wrangler::controller::DatasetController;
//!
//! # async fn example() -> wrangler::error::Result<()> {
//! let api = HttpDatasetApi::new(&ClientConfig::default().with_env_overrides())?;
//! let controller = DatasetController::new(Arc::new(api));
//!
//! // Lists datasets and loads the first one
//! controller.refresh().await?;
//! let store = controller.store();
//! if let Some(active) = store.active() {
//!     println!("{active}: {} rows", store.grid().row_count());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`api`]: the [`api::DatasetApi`] trait and its reqwest implementation
//! - [`store`]: dataset list, active dataset and grid, with stale-response protection
//! - [`controller`]: async flows (refresh, select, save, delete, import, analyze, export)
//! - [`grid`]: labelled cell grid and its conversion to and from backend rows
//! - [`import`]: local validation of files before upload
//! - [`registry`]: tool names advertised by the server
//! - [`toolbar`] and [`route`]: what the shell offers and where it navigates
//! - [`gui`]: the eframe desktop application
//! - [`error`], [`config`], [`logging`]: ambient plumbing
//!
//! ## Concurrency
//!
//! Every request/response pair goes through the store as a ticket: the store
//! hands one out when a request starts and checks it when the response
//! arrives. A response for a selection the user has already moved away from
//! is dropped, so the grid always shows the dataset that was asked for last.

pub mod api;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod gui;
pub mod import;
pub mod logging;
pub mod registry;
pub mod route;
pub mod store;
pub mod theme;
pub mod toolbar;

pub use dataset::DatasetId;
pub use error::{Result, WranglerError};
