pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod poll;
pub mod state;
pub mod storage;
pub mod store;

mod app;
mod conversation;
mod feed;
mod loading;
mod login;
mod members;
mod message;
mod nav;
mod notices;
mod reset;
mod verify;

pub use app::App;
