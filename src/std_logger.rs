use chrono::Local;
use log::{max_level, Level, LevelFilter, Metadata, Record, SetLoggerError};

/// Line logger: warnings and errors go to stderr, everything else to stdout.
pub struct StdLogger;

static LOGGER: StdLogger = StdLogger;

impl StdLogger {
  pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
  }

  fn format(record: &Record) -> String {
    let time_str = Local::now().format("%Y-%m-%dT%H:%M:%S");
    format!("{0} {1:<8} {2}: {3}", time_str, record.level(), record.target(), record.args())
  }
}

impl log::Log for StdLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= max_level()
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      let line = StdLogger::format(record);
      if record.level() <= Level::Warn {
        eprintln!("{}", line)
      } else {
        println!("{}", line)
      }
    }
  }

  fn flush(&self) {}
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_contains_level_target_and_message() {
    let line = StdLogger::format(
      &Record::builder()
        .level(Level::Info)
        .target("path_proxy::relay")
        .args(format_args!("relayed {}", 42))
        .build(),
    );

    assert!(line.contains("INFO     path_proxy::relay: relayed 42"), "{}", line);
  }
}
