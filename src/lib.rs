pub mod db;
pub mod monitor;
pub mod server;
pub mod web;

pub mod version;
