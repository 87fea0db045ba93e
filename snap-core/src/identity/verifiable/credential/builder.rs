use rst_common::standard::chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use rst_common::standard::serde_json::{json, Map, Value};

use crate::identity::verifiable::types::{VC_CONTEXT, VC_TYPE};

pub const DEFAULT_VC_KEY: &str = "vcData";
const HEDERA_ACCOUNT_ID: &str = "hederaAccountId";

/// `one_year_after` moves the date one calendar year ahead, a leap day rolls to
/// the first of March
pub fn one_year_after(date: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(next) = date.with_year(date.year() + 1) {
        return next;
    }

    NaiveDate::from_ymd_opt(date.year() + 1, 3, 1)
        .map(|day| day.and_time(date.time()).and_utc())
        .unwrap_or(date)
}

pub fn to_iso_string(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `UnsignedCredential` collects the parts of a credential before it's signed
/// by the identity agent
#[derive(Debug, Clone)]
pub struct UnsignedCredential {
    pub issuer: String,
    pub value: Value,
    pub key: Option<String>,
    pub types: Vec<String>,
    pub hedera_account_id: Option<String>,
}

impl UnsignedCredential {
    pub fn new(issuer: String, value: Value) -> Self {
        Self {
            issuer,
            value,
            key: None,
            types: vec![],
            hedera_account_id: None,
        }
    }

    pub fn build(&self, now: DateTime<Utc>) -> Value {
        let mut issuer = Map::new();
        issuer.insert("id".to_string(), Value::String(self.issuer.clone()));

        let mut subject = issuer.clone();
        subject.insert(
            self.key.clone().unwrap_or(DEFAULT_VC_KEY.to_string()),
            self.value.clone(),
        );

        if let Some(account_id) = &self.hedera_account_id {
            let account_id = Value::String(account_id.clone());
            issuer.insert(HEDERA_ACCOUNT_ID.to_string(), account_id.clone());
            subject.insert(HEDERA_ACCOUNT_ID.to_string(), account_id);
        }

        let mut types = vec![VC_TYPE.to_string()];
        for typ in self.types.iter() {
            if !types.contains(typ) {
                types.push(typ.clone());
            }
        }

        json!({
            "@context": [VC_CONTEXT],
            "type": types,
            "issuer": Value::Object(issuer),
            "issuanceDate": to_iso_string(now),
            "expirationDate": to_iso_string(one_year_after(now)),
            "credentialSubject": Value::Object(subject),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::chrono::TimeZone;
    use table_test::table_test;

    #[test]
    fn test_one_year_after() {
        let table = vec![
            (
                Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
                "2025-03-01T10:00:00.000Z",
            ),
            (
                Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap(),
                "2025-03-01T10:00:00.000Z",
            ),
            (
                Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap(),
                "2024-12-31T23:59:59.000Z",
            ),
        ];

        for (validator, input, expected) in table_test!(table) {
            let actual = to_iso_string(one_year_after(input));

            validator
                .given(&format!("{}", input))
                .when("one year after")
                .then(&format!("{}", expected))
                .assert_eq(expected.to_string(), actual);
        }
    }

    #[test]
    fn test_build_credential() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut unsigned = UnsignedCredential::new(
            "did:pkh:eip155:296:0xabc".to_string(),
            json!({"name": "alice"}),
        );
        unsigned.key = Some("profile".to_string());
        unsigned.types = vec!["ProfileNamesCredential".to_string()];
        unsigned.hedera_account_id = Some("0.0.1234".to_string());

        let vc = unsigned.build(now);
        assert_eq!(vc["issuer"]["id"], "did:pkh:eip155:296:0xabc");
        assert_eq!(vc["credentialSubject"]["id"], "did:pkh:eip155:296:0xabc");
        assert_eq!(vc["credentialSubject"]["profile"]["name"], "alice");
        assert_eq!(vc["credentialSubject"]["hederaAccountId"], "0.0.1234");
        assert_eq!(vc["issuer"]["hederaAccountId"], "0.0.1234");
        assert_eq!(
            vc["type"],
            json!(["VerifiableCredential", "ProfileNamesCredential"])
        );
        assert_eq!(vc["issuanceDate"], "2024-03-01T00:00:00.000Z");
        assert_eq!(vc["expirationDate"], "2025-03-01T00:00:00.000Z");
    }

    #[test]
    fn test_default_key() {
        let unsigned = UnsignedCredential::new("did:key:zAbc".to_string(), json!(true));
        let vc = unsigned.build(Utc::now());
        assert_eq!(vc["credentialSubject"][DEFAULT_VC_KEY], true);
        assert_eq!(vc["issuer"], json!({"id": "did:key:zAbc"}));
    }
}
