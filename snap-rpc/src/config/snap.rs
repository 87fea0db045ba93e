use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

fn default_timeout_secs() -> u64 {
    300
}

/// `Snap` configures the daemon host: the seed its entropy is derived from and the way
/// it answers the confirmation dialogs
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Snap {
    pub(super) entropy_seed: String,

    #[serde(default)]
    pub(super) dialog_auto_approve: bool,

    #[serde(default = "default_timeout_secs")]
    pub(super) dialog_timeout_secs: u64,
}

impl Snap {
    pub fn get_entropy_seed(&self) -> String {
        self.entropy_seed.to_owned()
    }

    pub fn get_dialog_auto_approve(&self) -> bool {
        self.dialog_auto_approve
    }

    pub fn get_dialog_timeout(&self) -> Duration {
        Duration::from_secs(self.dialog_timeout_secs)
    }
}

impl Default for Snap {
    fn default() -> Self {
        Self {
            entropy_seed: "".to_string(),
            dialog_auto_approve: false,
            dialog_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToValidate for Snap {
    fn validate(&self) -> Result<(), CommonError> {
        if self.entropy_seed.is_empty() {
            return Err(CommonError::ValidationError(
                "config: snap:entropy_seed is missing".to_string(),
            ));
        }

        if self.dialog_timeout_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: snap:dialog_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers;

    #[test]
    fn test_parse_defaults() {
        let snap: Snap = toml::from_str(r#"entropy_seed = "seed""#).unwrap();
        assert_eq!(snap.get_entropy_seed(), "seed");
        assert!(!snap.get_dialog_auto_approve());
        assert_eq!(snap.get_dialog_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_validation_failed() {
        let validation = helpers::validate(Snap::default());
        assert!(validation.is_err());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("snap:entropy_seed"));

        let snap = Snap {
            entropy_seed: "seed".to_string(),
            dialog_auto_approve: true,
            dialog_timeout_secs: 0,
        };
        let validation = helpers::validate(snap);
        assert!(validation.is_err());
    }
}
