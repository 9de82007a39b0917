#![cfg(test)]

pub mod common;
pub mod discovery_tests;
pub mod scenario_tests;
