//! sipsim: investment plan simulator over a daily price history.
//!
//! Hexagonal architecture: simulation logic in [`domain`], port traits in
//! [`ports`], concrete price sources and config files in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
