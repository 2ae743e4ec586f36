//! Container bootstrap for the dataset worker: optional model hub login
//! followed by a hand-over to the worker program, plus the filestore
//! cleanup job that runs between downloads.

pub mod cli;
pub mod config;
pub mod error;
pub mod filestore;
pub mod launcher;
pub mod logging;
