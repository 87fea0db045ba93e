use reqwest::{Client, RequestBuilder};

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize};
use rst_common::standard::serde_json::{json, Value};
use rst_common::with_logging::log::debug;

use prople_snap_core::identity::types::IdentityError;
use prople_snap_core::identity::verifiable::credential::types::CloudBackendBuilder;

use super::read_json;

const APP_DATA_FOLDER: &str = "appDataFolder";
const MULTIPART_BOUNDARY: &str = "prople_snap_boundary";

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// `GoogleDrive` keeps the cloud credential files inside the hidden application data
/// folder of the user's `Google Drive`
#[derive(Clone)]
pub struct GoogleDrive {
    client: Client,
    userinfo: String,
    drive: String,
    upload: String,
}

impl GoogleDrive {
    pub fn new(client: Client, endpoints: (String, String, String)) -> Self {
        let (userinfo, drive, upload) = endpoints;
        Self {
            client,
            userinfo,
            drive: drive.trim_end_matches('/').to_string(),
            upload: upload.trim_end_matches('/').to_string(),
        }
    }

    fn authorized(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder.bearer_auth(access_token)
    }

    async fn find_file(&self, access_token: &str, name: &str) -> Result<Option<String>, IdentityError> {
        let query = format!("name = '{}'", name.replace('\'', "\\'"));
        let request = self.client.get(format!("{}/files", self.drive)).query(&[
            ("spaces", APP_DATA_FOLDER),
            ("fields", "files(id, name)"),
            ("q", query.as_str()),
        ]);

        let response = self
            .authorized(request, access_token)
            .send()
            .await
            .map_err(|err| IdentityError::StorageUnavailable(err.to_string()))?;

        let body = read_json(response, IdentityError::StorageUnavailable).await?;
        let list: DriveFileList = rst_common::standard::serde_json::from_value(body)
            .map_err(|err| IdentityError::StorageUnavailable(err.to_string()))?;

        Ok(list.files.into_iter().next().map(|file| file.id))
    }

    fn multipart_body(metadata: Value, content: &str) -> String {
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{boundary}\r\nContent-Type: application/json\r\n\r\n{content}\r\n--{boundary}--",
            boundary = MULTIPART_BOUNDARY,
            metadata = metadata,
            content = content,
        )
    }
}

#[async_trait]
impl CloudBackendBuilder for GoogleDrive {
    async fn verify_access_token(&self, access_token: &str) -> Result<String, IdentityError> {
        let request = self.client.get(self.userinfo.as_str());
        let response = self
            .authorized(request, access_token)
            .send()
            .await
            .map_err(|err| IdentityError::StorageUnavailable(err.to_string()))?;

        let body = read_json(response, |msg| {
            IdentityError::StorageUnavailable(format!("invalid access token: {}", msg))
        })
        .await?;

        body.get("email")
            .and_then(|email| email.as_str())
            .map(|email| email.to_string())
            .ok_or(IdentityError::StorageUnavailable(String::from(
                "access token without email scope",
            )))
    }

    async fn read_file(&self, access_token: &str, name: &str) -> Result<Option<String>, IdentityError> {
        let file_id = match self.find_file(access_token, name).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        debug!("drive: reading {} ({})", name, file_id);
        let request = self
            .client
            .get(format!("{}/files/{}", self.drive, file_id))
            .query(&[("alt", "media")]);

        let response = self
            .authorized(request, access_token)
            .send()
            .await
            .map_err(|err| IdentityError::StorageUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::StorageUnavailable(format!(
                "drive status {}",
                response.status().as_u16()
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|err| IdentityError::StorageUnavailable(err.to_string()))?;

        Ok(Some(content))
    }

    async fn write_file(
        &self,
        access_token: &str,
        name: &str,
        content: String,
    ) -> Result<(), IdentityError> {
        let existing = self.find_file(access_token, name).await?;
        let request = match &existing {
            Some(id) => {
                debug!("drive: updating {} ({})", name, id);
                let body = Self::multipart_body(json!({}), &content);
                self.client
                    .patch(format!("{}/files/{}", self.upload, id))
                    .body(body)
            }
            None => {
                debug!("drive: creating {}", name);
                let metadata = json!({
                    "name": name,
                    "mimeType": "application/json",
                    "parents": [APP_DATA_FOLDER],
                });
                let body = Self::multipart_body(metadata, &content);
                self.client.post(format!("{}/files", self.upload)).body(body)
            }
        };

        let request = request.query(&[("uploadType", "multipart")]).header(
            "Content-Type",
            format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
        );

        let response = self
            .authorized(request, access_token)
            .send()
            .await
            .map_err(|err| IdentityError::StorageUnavailable(err.to_string()))?;

        let _ = read_json(response, IdentityError::StorageUnavailable).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use rst_common::with_tokio::tokio;

    const TOKEN: &str = "ya29.token";
    const FILE: &str = "vcs_0x1_0xabc.json";

    fn drive(server: &ServerGuard) -> GoogleDrive {
        GoogleDrive::new(
            Client::new(),
            (
                format!("{}/oauth2/v3/userinfo", server.url()),
                format!("{}/drive/v3", server.url()),
                format!("{}/upload/drive/v3", server.url()),
            ),
        )
    }

    #[tokio::test]
    async fn test_verify_access_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/oauth2/v3/userinfo")
            .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"email": "user@example.com"}).to_string())
            .create_async()
            .await;

        let email = drive(&server).verify_access_token(TOKEN).await.unwrap();
        mock.assert_async().await;
        assert_eq!(email, "user@example.com");
    }

    #[tokio::test]
    async fn test_invalid_access_token() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/oauth2/v3/userinfo")
            .with_status(401)
            .create_async()
            .await;

        let result = drive(&server).verify_access_token(TOKEN).await;
        assert!(matches!(
            result.unwrap_err(),
            IdentityError::StorageUnavailable(_)
        ))
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::UrlEncoded("spaces".into(), APP_DATA_FOLDER.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"files": []}).to_string())
            .create_async()
            .await;

        let content = drive(&server).read_file(TOKEN, FILE).await.unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn test_read_file() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"files": [{"id": "file-1", "name": FILE}]}).to_string())
            .create_async()
            .await;

        let media = server
            .mock("GET", "/drive/v3/files/file-1")
            .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
            .with_status(200)
            .with_body(r#"{"vc-1":{}}"#)
            .create_async()
            .await;

        let content = drive(&server).read_file(TOKEN, FILE).await.unwrap();
        media.assert_async().await;
        assert_eq!(content, Some(r#"{"vc-1":{}}"#.to_string()));
    }

    #[tokio::test]
    async fn test_write_creates_file() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"files": []}).to_string())
            .create_async()
            .await;

        let upload = server
            .mock("POST", "/upload/drive/v3/files")
            .match_query(Matcher::UrlEncoded("uploadType".into(), "multipart".into()))
            .match_body(Matcher::Regex(FILE.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"id": "file-1"}).to_string())
            .create_async()
            .await;

        let result = drive(&server)
            .write_file(TOKEN, FILE, r#"{"vc-1":{}}"#.to_string())
            .await;
        upload.assert_async().await;
        assert!(!result.is_err());
    }

    #[tokio::test]
    async fn test_write_updates_existing_file() {
        let mut server = Server::new_async().await;
        let _list = server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"files": [{"id": "file-1"}]}).to_string())
            .create_async()
            .await;

        let upload = server
            .mock("PATCH", "/upload/drive/v3/files/file-1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"id": "file-1"}).to_string())
            .create_async()
            .await;

        let result = drive(&server)
            .write_file(TOKEN, FILE, "{}".to_string())
            .await;
        upload.assert_async().await;
        assert!(!result.is_err());
    }
}
