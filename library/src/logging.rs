use log::LevelFilter;

/// Installs the console logger for binary consumers. The library itself
/// only talks to the `log` facade, so tests and embedders can bring their
/// own backend (or none).
pub fn init_logging() {
    let init_result = simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .init();
    if let Err(e) = init_result {
        // Someone already installed a logger; keep theirs.
        log::debug!("Logging already initialized: {}", e);
    }
}
