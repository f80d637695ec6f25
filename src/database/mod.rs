pub mod connect;
pub mod idgen;
pub mod models;
pub mod mutations;
pub mod queries;
pub mod store;

#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod memory;
