//! Box office cart: dual-ownership carts of reservable products.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;

#[cfg(test)]
mod test;

mod uuids;
