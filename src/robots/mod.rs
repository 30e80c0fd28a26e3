//! Robots.txt handling module
//!
//! This module loads a site's robots.txt once per crawl and answers
//! "may this agent fetch URL X?" for the rest of the run.

mod gate;
mod parser;

pub use gate::{PolicyLoadError, RobotsGate};
pub use parser::ParsedRobots;
