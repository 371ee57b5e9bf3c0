use chrono::Local;
use log::{Level, Metadata, Record};

/// Writes log records to stderr, keeping stdout for results
pub struct StderrLogger {
    level: Level,
}

impl StderrLogger {
    pub fn init(verbose: bool) -> Result<(), log::SetLoggerError> {
        let level = if verbose { Level::Debug } else { Level::Warn };
        log::set_boxed_logger(Box::new(Self { level }))?;
        log::set_max_level(level.to_level_filter());
        Ok(())
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{} {:<5} {}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
