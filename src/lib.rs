pub mod camera;
pub mod cli;
pub mod config;
pub mod db;
pub mod logging;
pub mod metadata;
pub mod serve;
pub mod storage;
pub mod upload;
