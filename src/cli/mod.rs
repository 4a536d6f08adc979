pub mod cycle;
pub mod kv;
pub mod log;
pub mod run;
pub mod stats;
