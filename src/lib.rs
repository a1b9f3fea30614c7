// Kinesis Bench - Library root

pub mod bench;
pub mod client;
pub mod config;
pub mod error;
