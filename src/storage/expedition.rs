//! Expedition file: load, save, and scaffold.

use std::fs;

use crate::model::{EXAMPLE_EXPEDITION, Expedition};

use super::{Result, Storage, StorageError, write_atomic};

impl Storage {
    /// Loads and validates `expedition.yaml`.
    pub fn load_expedition(&self) -> Result<Expedition> {
        let path = self.expedition_path();
        if !path.is_file() {
            return Err(StorageError::MissingExpedition(self.root.clone()));
        }
        let yaml = fs::read_to_string(&path)?;
        let expedition: Expedition = serde_yaml::from_str(&yaml)?;
        expedition.validate()?;
        Ok(expedition)
    }

    #[cfg(test)]
    pub fn save_expedition(&self, expedition: &Expedition) -> Result<()> {
        super::write_yaml(&self.expedition_path(), expedition)
    }

    /// Creates the directory and writes the example `expedition.yaml`.
    /// Refuses to overwrite an existing one.
    pub fn init(&self) -> Result<()> {
        let path = self.expedition_path();
        if path.exists() {
            return Err(StorageError::AlreadyExists(path));
        }
        fs::create_dir_all(&self.root)?;
        write_atomic(&path, EXAMPLE_EXPEDITION.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("expedition"));
        (dir, storage)
    }

    #[test]
    fn init_then_load() {
        let (_dir, storage) = test_storage();
        storage.init().unwrap();

        let expedition = storage.load_expedition().unwrap();
        assert_eq!(expedition.schedule.waypoints.len(), 4);
    }

    #[test]
    fn init_twice_fails() {
        let (_dir, storage) = test_storage();
        storage.init().unwrap();
        let err = storage.init().unwrap_err();

        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn load_missing_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.load_expedition().unwrap_err();

        assert!(matches!(err, StorageError::MissingExpedition(_)));
    }

    #[test]
    fn load_rejects_invalid_values() {
        let (_dir, storage) = test_storage();
        storage.init().unwrap();
        let yaml = fs::read_to_string(storage.expedition_path()).unwrap();
        fs::write(
            storage.expedition_path(),
            yaml.replace("ship_speed_knots: 10.0", "ship_speed_knots: -3.0"),
        )
        .unwrap();

        let err = storage.load_expedition().unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
    }

    #[test]
    fn save_round_trips() {
        let (_dir, storage) = test_storage();
        storage.init().unwrap();
        let mut expedition = storage.load_expedition().unwrap();
        expedition.ship_config.ship_speed_knots = 12.5;

        storage.save_expedition(&expedition).unwrap();
        assert_eq!(storage.load_expedition().unwrap(), expedition);
    }
}
