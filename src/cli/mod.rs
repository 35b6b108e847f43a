pub mod config;
pub mod pack;
pub mod run;
