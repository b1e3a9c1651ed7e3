//! Sumsub API wire types.

use serde::{Deserialize, Serialize};

/// Body of `POST /resources/applicants`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicantBody<'a> {
    pub external_user_id: &'a str,
}

/// Body of `POST /resources/accessTokens/sdk`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenBody<'a> {
    pub user_id: &'a str,
    pub level_name: &'a str,
}

/// `metadata` part of an identity document upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdDocMetadata<'a> {
    pub id_doc_type: &'a str,
    pub country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_doc_sub_type: Option<&'a str>,
}

/// Applicant resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SumsubApplicant {
    pub id: String,

    #[serde(default)]
    pub external_user_id: Option<String>,

    #[serde(default)]
    pub review: Option<SumsubReview>,

    /// Older responses report the status at the top level.
    #[serde(default)]
    pub review_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SumsubReview {
    #[serde(default)]
    pub review_status: Option<String>,

    #[serde(default)]
    pub review_result: Option<SumsubReviewResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SumsubReviewResult {
    #[serde(default)]
    pub review_answer: Option<String>,
}

impl SumsubApplicant {
    /// Review status, `init` when the applicant has not been reviewed.
    pub fn review_status(&self) -> String {
        self.review
            .as_ref()
            .and_then(|r| r.review_status.clone())
            .or_else(|| self.review_status.clone())
            .unwrap_or_else(|| "init".to_string())
    }

    pub fn review_answer(&self) -> Option<String> {
        self.review
            .as_ref()
            .and_then(|r| r.review_result.as_ref())
            .and_then(|r| r.review_answer.clone())
    }
}

/// SDK access token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SumsubAccessToken {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// One part of a `multipart/form-data` body.
pub enum FormPart<'a> {
    Text {
        name: &'a str,
        value: String,
    },
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Encodes a multipart body.
///
/// The body is built up front so the exact bytes sent are the bytes signed.
pub fn encode_multipart(boundary: &str, parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match part {
            FormPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applicant_review_status_prefers_nested_review() {
        let applicant: SumsubApplicant = serde_json::from_str(
            r#"{"id":"a1","reviewStatus":"pending","review":{"reviewStatus":"completed","reviewResult":{"reviewAnswer":"GREEN"}}}"#,
        )
        .unwrap();

        assert_eq!(applicant.review_status(), "completed");
        assert_eq!(applicant.review_answer().as_deref(), Some("GREEN"));
    }

    #[test]
    fn applicant_review_status_falls_back() {
        let top: SumsubApplicant =
            serde_json::from_str(r#"{"id":"a1","reviewStatus":"queued"}"#).unwrap();
        assert_eq!(top.review_status(), "queued");

        let bare: SumsubApplicant = serde_json::from_str(r#"{"id":"a1"}"#).unwrap();
        assert_eq!(bare.review_status(), "init");
        assert!(bare.review_answer().is_none());
    }

    #[test]
    fn id_doc_metadata_serializes_camel_case() {
        let metadata = IdDocMetadata {
            id_doc_type: "PASSPORT",
            country: "USA",
            id_doc_sub_type: Some("FRONT_SIDE"),
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(
            json,
            r#"{"idDocType":"PASSPORT","country":"USA","idDocSubType":"FRONT_SIDE"}"#
        );
    }

    #[test]
    fn multipart_encodes_parts_and_terminator() {
        let body = encode_multipart(
            "XYZ",
            &[
                FormPart::Text {
                    name: "metadata",
                    value: "{}".to_string(),
                },
                FormPart::File {
                    name: "content",
                    file_name: "image.jpg",
                    content_type: "image/jpeg",
                    bytes: &[1, 2, 3],
                },
            ],
        );

        let mut expected = Vec::new();
        expected.extend_from_slice(
            b"--XYZ\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\r\n{}\r\n",
        );
        expected.extend_from_slice(
            b"--XYZ\r\nContent-Disposition: form-data; name=\"content\"; filename=\"image.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n",
        );
        expected.extend_from_slice(&[1, 2, 3]);
        expected.extend_from_slice(b"\r\n--XYZ--\r\n");

        assert_eq!(body, expected);
    }
}
