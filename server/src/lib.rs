// calliope_server/src/lib.rs

//! HTTP surface of the Calliope storefront: configuration, bearer-session
//! auth, the actix-web routes over [`calliope_ledger`], and demo seeding.

pub mod config;
pub mod errors;
pub mod seed;
pub mod services;
pub mod state;
pub mod web;
