pub mod adapters;
pub mod config;
pub mod cook;
pub mod error;
pub mod web;
