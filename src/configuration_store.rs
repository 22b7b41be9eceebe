use std::fs::File;
use std::io::{BufReader, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{info, warn};

use crate::route_config::{ConfigError, Configuration};

pub trait ConfigurationStore: Send + Sync {
  fn load(&self) -> Result<Configuration, ConfigError>;
  fn save(&self, config: &Configuration) -> Result<(), ConfigError>;
}

#[derive(PartialEq, Debug, Clone, Copy)]
enum FileFormat {
  Json,
  Yaml,
}

/// Stores the mapping list in a single file, JSON unless the extension says YAML.
pub struct FileConfigurationStore {
  path: PathBuf,
  format: FileFormat,
}

impl FileConfigurationStore {
  pub fn new<P: Into<PathBuf>>(path: P) -> FileConfigurationStore {
    let path = path.into();
    let format = match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => FileFormat::Yaml,
      _ => FileFormat::Json,
    };

    FileConfigurationStore { path, format }
  }

  fn serialize(&self, config: &Configuration) -> Result<Vec<u8>, ConfigError> {
    let bytes = match self.format {
      FileFormat::Json => serde_json::to_vec_pretty(config)?,
      FileFormat::Yaml => serde_yaml::to_string(config)?.into_bytes(),
    };

    Ok(bytes)
  }
}

impl ConfigurationStore for FileConfigurationStore {
  fn load(&self) -> Result<Configuration, ConfigError> {
    let file = match File::open(&self.path) {
      Ok(file) => file,
      Err(err) if err.kind() == ErrorKind::NotFound => {
        warn!("Configuration file '{}' not found, starting without mappings.", self.path.display());
        return Ok(Configuration::default());
      }
      Err(err) => return Err(err.into()),
    };

    let reader = BufReader::new(file);
    let config: Configuration = match self.format {
      FileFormat::Json => serde_json::from_reader(reader)?,
      FileFormat::Yaml => serde_yaml::from_reader(reader)?,
    };

    Ok(config)
  }

  fn save(&self, config: &Configuration) -> Result<(), ConfigError> {
    config.validate()?;
    let bytes = self.serialize(config)?;

    let mut tmp_name = self.path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    {
      let mut tmp_file = File::create(&tmp_path)?;
      tmp_file.write_all(&bytes)?;
      tmp_file.sync_all()?;
    }

    std::fs::rename(&tmp_path, &self.path)?;
    info!("Saved {} mapping(s) to '{}'.", config.mappings.len(), self.path.display());

    Ok(())
  }
}

/// Snapshot of the active configuration shared with every relay. Readers never block
/// writers; a save publishes a whole new snapshot.
pub struct SharedConfiguration {
  current: ArcSwap<Configuration>,
}

impl SharedConfiguration {
  pub fn new(config: Configuration) -> SharedConfiguration {
    SharedConfiguration {
      current: ArcSwap::from_pointee(config),
    }
  }

  pub fn snapshot(&self) -> Arc<Configuration> {
    self.current.load_full()
  }

  pub fn publish(&self, config: Configuration) {
    self.current.store(Arc::new(config));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::route_config::Mapping;

  fn sample() -> Configuration {
    Configuration::new(vec![
      Mapping::new("/a", "https://backend"),
      Mapping {
        from: String::from("/b"),
        to: String::from("http://other:8080"),
        active: false,
      },
    ])
  }

  #[test]
  fn missing_file_loads_empty_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConfigurationStore::new(dir.path().join("absent.json"));

    assert_eq!(store.load().unwrap(), Configuration::default());
  }

  #[test]
  fn json_save_then_load_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConfigurationStore::new(dir.path().join("config.json"));

    store.save(&sample()).unwrap();

    assert_eq!(store.load().unwrap(), sample());
    assert!(!dir.path().join("config.json.tmp").exists());
  }

  #[test]
  fn yaml_extension_uses_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    let store = FileConfigurationStore::new(&path);

    store.save(&sample()).unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();

    assert!(raw.contains("from: /a"));
    assert_eq!(store.load().unwrap(), sample());
  }

  #[test]
  fn save_rejects_invalid_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let store = FileConfigurationStore::new(&path);
    let invalid = Configuration::new(vec![Mapping::new("/a", "https://backend/")]);

    assert!(matches!(store.save(&invalid), Err(ConfigError::Invalid(_))));
    assert!(!path.exists());
  }

  #[test]
  fn malformed_file_fails_to_load() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(b"{ not json").unwrap();
    let store = FileConfigurationStore::new(file.path());

    assert!(matches!(store.load(), Err(ConfigError::Json(_))));
  }

  #[test]
  fn publish_swaps_snapshot() {
    let shared = SharedConfiguration::new(Configuration::default());
    let before = shared.snapshot();

    shared.publish(sample());

    assert!(before.mappings.is_empty());
    assert_eq!(*shared.snapshot(), sample());
  }
}
