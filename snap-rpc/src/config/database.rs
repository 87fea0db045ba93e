use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

/// `State` is the rocksdb instance holding the snap state blob
///
/// The database and its column family are always created when missing. The write-ahead
/// log stays next to the data unless `wal_dir` is given.
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct State {
    pub(super) path: String,
    pub(super) cf_name: String,

    #[serde(default)]
    pub(super) wal_dir: Option<String>,
}

impl State {
    pub fn get(&self) -> (String, String) {
        (self.path.to_owned(), self.cf_name.to_owned())
    }

    pub fn get_wal_dir(&self) -> Option<String> {
        self.wal_dir.to_owned()
    }
}

impl Default for State {
    fn default() -> Self {
        Self {
            path: "./db".to_string(),
            cf_name: "".to_string(),
            wal_dir: None,
        }
    }
}

impl ToValidate for State {
    fn validate(&self) -> Result<(), CommonError> {
        if self.path.is_empty() {
            return Err(CommonError::ValidationError(
                "config: database:state:path is missing".to_string(),
            ));
        }

        if self.cf_name.is_empty() {
            return Err(CommonError::ValidationError(
                "config: database:state:cf_name is missing".to_string(),
            ));
        }

        if self.wal_dir.as_ref().is_some_and(|dir| dir.is_empty()) {
            return Err(CommonError::ValidationError(
                "config: database:state:wal_dir is empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Database {
    pub state: State,
}

impl ToValidate for Database {
    fn validate(&self) -> Result<(), CommonError> {
        self.state.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};

    use crate::common::helpers::{self, testdb::fixture_file};

    #[test]
    fn test_parse_database_config() -> Result<(), ConfigError> {
        let config_toml: Result<Database, ConfigError> =
            Builder::new(from_file(fixture_file("config_db.toml")))
                .fetch()?
                .parse(use_toml);

        assert!(!config_toml.is_err());

        let config_db = config_toml.unwrap();
        let (path, cf_name) = config_db.state.get();
        assert_eq!(cf_name, "snap-state-cf");
        assert_eq!(path, "./snap-state-storage");
        assert_eq!(
            config_db.state.get_wal_dir(),
            Some("./snap-state-wal".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_state_validation_failed() {
        let mut state = State::default();
        state.path = "".to_string();

        let validation = helpers::validate(state.clone());
        assert!(validation.is_err());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("database:state:path"));

        state.path = "path".to_string();
        let validation = helpers::validate(state.clone());
        assert!(validation.is_err());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("database:state:cf_name"));

        state.cf_name = "cf".to_string();
        state.wal_dir = Some("".to_string());
        let validation = helpers::validate(state);
        assert!(validation.is_err());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("database:state:wal_dir"));
    }
}
