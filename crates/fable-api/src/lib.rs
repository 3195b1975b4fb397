pub mod ai;
pub mod auth;
pub mod error;
pub mod flash;
pub mod middleware;
pub mod nodes;
pub mod pages;
pub mod player;
pub mod routes;
pub mod state;
pub mod stories;
mod view;
