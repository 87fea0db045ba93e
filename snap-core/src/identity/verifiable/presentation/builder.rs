use rst_common::standard::serde_json::{json, Value};

use crate::identity::verifiable::types::{VC_CONTEXT, VP_CUSTOM_TYPE, VP_TYPE};

#[derive(Debug, Clone)]
pub struct UnsignedPresentation {
    pub holder: String,
    pub credentials: Vec<Value>,
    pub typ: Option<String>,
}

impl UnsignedPresentation {
    pub fn new(holder: String, credentials: Vec<Value>) -> Self {
        Self {
            holder,
            credentials,
            typ: None,
        }
    }

    /// `build` keeps the credentials in the given order, the presentation type is
    /// `Custom` unless another one is given
    pub fn build(&self) -> Value {
        let typ = self
            .typ
            .clone()
            .filter(|typ| !typ.is_empty())
            .unwrap_or(VP_CUSTOM_TYPE.to_string());

        json!({
            "@context": [VC_CONTEXT],
            "type": [VP_TYPE, typ],
            "holder": self.holder,
            "verifiableCredential": self.credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_presentation() {
        let vp = UnsignedPresentation::new(
            "did:key:zAbc".to_string(),
            vec![json!("a.b.c"), json!({"id": "inline"})],
        )
        .build();

        assert_eq!(vp["holder"], "did:key:zAbc");
        assert_eq!(vp["type"], json!(["VerifiablePresentation", "Custom"]));
        assert_eq!(vp["verifiableCredential"][0], "a.b.c");
        assert_eq!(vp["verifiableCredential"][1]["id"], "inline");
    }

    #[test]
    fn test_custom_type() {
        let mut unsigned = UnsignedPresentation::new("did:key:zAbc".to_string(), vec![]);
        unsigned.typ = Some("ProfilePresentation".to_string());
        let vp = unsigned.build();
        assert_eq!(
            vp["type"],
            json!(["VerifiablePresentation", "ProfilePresentation"])
        );
    }
}
