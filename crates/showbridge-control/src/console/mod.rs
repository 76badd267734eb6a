//! Console metadata scraping

mod client;
mod parse;

pub use client::ConsoleScraper;
pub use parse::{parse_executors, parse_show_name};
