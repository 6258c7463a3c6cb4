//! cloudxfer Core - Domain types, configuration and ports
//!
//! This crate contains the hexagonal core of the transfer engine:
//! - **Domain types** - `TransferItem`, `RemoteEntry`, `TransferStats`, `TransferOutcome`
//! - **Configuration** - YAML-backed [`config::Config`] and the per-batch `TransferConfig`
//! - **Port definitions** - `IRemoteStorage` for the remote API, `ITokenStore` for credentials
//!
//! # Architecture
//!
//! The domain module holds plain data and pure logic with no I/O.
//! Ports define the trait interfaces the engine depends on; the HTTP
//! adapter lives in `cloudxfer-api`.

pub mod config;
pub mod domain;
pub mod ports;
