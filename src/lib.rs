pub mod app;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod linker;
pub mod metrics;
pub mod output;
pub mod records;
pub mod segmentation;
pub mod slug;
pub mod tables;
pub mod validate;
pub mod writer;
