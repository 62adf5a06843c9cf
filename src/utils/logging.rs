use env_logger;
use log::LevelFilter;

/// Enable info level logging for the treegrid crate only.
pub fn init_info() {
    env_logger::Builder::new()
        .filter_module("treegrid", LevelFilter::Info)
        .init();
}

/// Enable debug level logging for the treegrid crate only.
pub fn init_debug() {
    env_logger::Builder::new()
        .filter_module("treegrid", LevelFilter::Debug)
        .init();
}
