#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod api;
pub mod contacts;
pub mod journey;
pub mod location_tracker;
mod logs;
pub mod main_db;
pub mod positioning;
pub mod storage;
pub mod uploader;
mod utils;
