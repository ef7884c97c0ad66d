// Library for tests to access modules

pub mod aggregate;
pub mod config;
pub mod models;
pub mod monitor;
pub mod numeric;
pub mod routes;
pub mod units;
