#![allow(dead_code)]

#[macro_use]
extern crate lazy_static;

pub mod api;
pub mod callbacks;
pub mod error;
pub mod types;
