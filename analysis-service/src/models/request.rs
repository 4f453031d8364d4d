use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Body of `POST /api/analyze`.
///
/// Missing and `null` fields deserialize as empty strings so that validation,
/// not the JSON extractor, decides the error message.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeRequest {
    #[serde(deserialize_with = "null_as_empty")]
    #[validate(length(min = 1))]
    pub base64_image: String,
    #[serde(deserialize_with = "null_as_empty")]
    #[validate(length(min = 1))]
    pub mime_type: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_case_fields() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"base64Image":"aGk=","mimeType":"image/jpeg"}"#).unwrap();
        assert_eq!(req.base64_image, "aGk=");
        assert_eq!(req.mime_type, "image/jpeg");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn missing_fields_fail_validation() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"mimeType":"image/png"}"#).unwrap();
        assert!(req.base64_image.is_empty());
        assert!(req.validate().is_err());
    }

    #[test]
    fn null_fields_fail_validation_instead_of_parsing() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"base64Image":null,"mimeType":"image/jpeg"}"#).unwrap();
        assert!(req.base64_image.is_empty());
        assert!(req.validate().is_err());
    }
}
