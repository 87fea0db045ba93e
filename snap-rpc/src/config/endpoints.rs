use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

fn default_resolver() -> String {
    "https://dev.uniresolver.io".to_string()
}

fn default_mirror_mainnet() -> String {
    "https://mainnet-public.mirrornode.hedera.com".to_string()
}

fn default_mirror_testnet() -> String {
    "https://testnet.mirrornode.hedera.com".to_string()
}

fn default_mirror_previewnet() -> String {
    "https://previewnet.mirrornode.hedera.com".to_string()
}

fn default_google_userinfo() -> String {
    "https://www.googleapis.com/oauth2/v3/userinfo".to_string()
}

fn default_google_drive() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_google_upload() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

/// `Endpoints` are the base URLs of every remote collaborator
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Endpoints {
    pub(super) agent: String,

    #[serde(default = "default_resolver")]
    pub(super) resolver: String,

    #[serde(default = "default_mirror_mainnet")]
    pub(super) mirror_mainnet: String,

    #[serde(default = "default_mirror_testnet")]
    pub(super) mirror_testnet: String,

    #[serde(default = "default_mirror_previewnet")]
    pub(super) mirror_previewnet: String,

    #[serde(default = "default_google_userinfo")]
    pub(super) google_userinfo: String,

    #[serde(default = "default_google_drive")]
    pub(super) google_drive: String,

    #[serde(default = "default_google_upload")]
    pub(super) google_upload: String,
}

impl Endpoints {
    pub fn get_agent(&self) -> String {
        self.agent.to_owned()
    }

    pub fn get_resolver(&self) -> String {
        self.resolver.to_owned()
    }

    /// `get_mirrors` returns the mirror nodes keyed by the hedera network name
    pub fn get_mirrors(&self) -> Vec<(String, String)> {
        vec![
            ("mainnet".to_string(), self.mirror_mainnet.to_owned()),
            ("testnet".to_string(), self.mirror_testnet.to_owned()),
            ("previewnet".to_string(), self.mirror_previewnet.to_owned()),
        ]
    }

    /// `get_google` returns the userinfo, drive and upload URLs
    pub fn get_google(&self) -> (String, String, String) {
        (
            self.google_userinfo.to_owned(),
            self.google_drive.to_owned(),
            self.google_upload.to_owned(),
        )
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            agent: "".to_string(),
            resolver: default_resolver(),
            mirror_mainnet: default_mirror_mainnet(),
            mirror_testnet: default_mirror_testnet(),
            mirror_previewnet: default_mirror_previewnet(),
            google_userinfo: default_google_userinfo(),
            google_drive: default_google_drive(),
            google_upload: default_google_upload(),
        }
    }
}

impl ToValidate for Endpoints {
    fn validate(&self) -> Result<(), CommonError> {
        let required = vec![
            ("agent", &self.agent),
            ("resolver", &self.resolver),
            ("google_drive", &self.google_drive),
            ("google_upload", &self.google_upload),
        ];

        for (name, url) in required {
            if url.is_empty() {
                return Err(CommonError::ValidationError(format!(
                    "config: endpoints:{} is missing",
                    name
                )));
            }

            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CommonError::ValidationError(format!(
                    "config: endpoints:{} must be an http url",
                    name
                )));
            }
        }

        Ok(())
    }
}
