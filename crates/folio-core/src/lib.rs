//! folio-core - library for the folio portfolio site.
//!
//! This crate provides:
//! - `site`: the site configuration model
//! - `render`: HTML rendering of the page regions from the site config
//! - `worker`: the offline cache worker (install / activate / fetch)
//! - `eggs`: easter egg interaction state
//! - `config`: application settings

pub mod config;
pub mod eggs;
pub mod render;
pub mod site;
pub mod utils;
pub mod worker;
