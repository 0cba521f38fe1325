pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod archive;
pub mod credentials;
pub mod handlers;
pub mod mail;
pub mod models;
pub mod stores;
pub mod utils;

#[cfg(test)]
mod testing;
