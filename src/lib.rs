#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub(crate) mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod model;
pub mod observability;
pub mod pipeline;
pub(crate) mod schema;
pub mod util;
