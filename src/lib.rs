pub mod bridge;
pub mod bus;
pub mod cli;
pub mod commands;
pub mod config;
pub mod event;
pub mod ingress;
pub mod logging;
pub mod normalizer;
pub mod relay;
pub mod store;
