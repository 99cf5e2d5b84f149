#![warn(clippy::all, rust_2018_idioms)]

//! Immediate-mode front end of the fund desk.

pub mod app;
pub mod screens;
pub mod state;
pub mod widgets;

pub use app::{FundeskApp, Screen};
