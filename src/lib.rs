pub mod caption;
pub mod cli;
pub mod config_file;
pub mod dataset;
pub mod image_processing;
pub mod review;
pub mod utils;
