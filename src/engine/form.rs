//! Multipart payload for the ingest endpoint.
//!
//! The payload is kept as plain data so it can be inspected before it is
//! turned into a `reqwest::multipart::Form`.

use crate::model::Submission;
use reqwest::multipart::{Form, Part};

pub const FILES_FIELD: &str = "files";
pub const URLS_FIELD: &str = "urls";
pub const API_KEY_FIELD: &str = "api_key";
pub const FLAG_REASON_FIELD: &str = "flag_reason";
pub const USER_FIELD: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: &'static str,
    pub value: PartValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    pub parts: Vec<FormPart>,
}

impl FormPayload {
    /// Files under a repeated `files` field, then the text fields. Nothing is validated.
    pub fn from_submission(sub: Submission) -> Self {
        let Submission {
            files,
            urls,
            flag_reason,
            api_key,
            user,
        } = sub;

        let mut parts = Vec::with_capacity(files.len() + 4);
        for f in files {
            parts.push(FormPart {
                name: FILES_FIELD,
                value: PartValue::File {
                    file_name: f.file_name,
                    content_type: f.content_type,
                    bytes: f.bytes,
                },
            });
        }
        parts.push(text_part(URLS_FIELD, urls));
        parts.push(text_part(API_KEY_FIELD, api_key));
        parts.push(text_part(FLAG_REASON_FIELD, flag_reason));
        parts.push(text_part(USER_FIELD, user.as_str().to_string()));

        Self { parts }
    }

    pub fn file_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p.value, PartValue::File { .. }))
            .count()
    }

    /// First text value under `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match &p.value {
            PartValue::Text(t) if p.name == name => Some(t.as_str()),
            _ => None,
        })
    }

    /// Fails only when a file carries an unparsable content type.
    pub fn into_reqwest(self) -> reqwest::Result<Form> {
        let mut form = Form::new();
        for part in self.parts {
            form = match part.value {
                PartValue::Text(t) => form.text(part.name, t),
                PartValue::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut p = Part::bytes(bytes).file_name(file_name);
                    if let Some(ct) = content_type {
                        p = p.mime_str(&ct)?;
                    }
                    form.part(part.name, p)
                }
            };
        }
        Ok(form)
    }
}

fn text_part(name: &'static str, value: String) -> FormPart {
    FormPart {
        name,
        value: PartValue::Text(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identity, UploadFile};

    fn sample() -> Submission {
        Submission {
            files: vec![
                UploadFile::new("a.csv", b"x,y\n1,2\n".to_vec()),
                UploadFile::new("empty.txt", Vec::new()),
            ],
            urls: "https://a.example\nhttps://b.example".into(),
            flag_reason: "suspicious".into(),
            api_key: "k-123".into(),
            user: Identity::default(),
        }
    }

    #[test]
    fn every_file_uses_the_repeated_field() {
        let payload = FormPayload::from_submission(sample());
        assert_eq!(payload.file_count(), 2);
        let names: Vec<_> = payload.parts.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["files", "files", "urls", "api_key", "flag_reason", "user"]
        );
    }

    #[test]
    fn urls_are_passed_through_unsplit() {
        let payload = FormPayload::from_submission(sample());
        assert_eq!(
            payload.text(URLS_FIELD),
            Some("https://a.example\nhttps://b.example")
        );
        assert_eq!(payload.text(USER_FIELD), Some("definitelynotaspren"));
    }

    #[test]
    fn empty_inputs_are_not_validated() {
        let payload = FormPayload::from_submission(Submission::default());
        assert_eq!(payload.file_count(), 0);
        assert_eq!(payload.text(URLS_FIELD), Some(""));
        assert_eq!(payload.text(API_KEY_FIELD), Some(""));
        assert_eq!(payload.text(FLAG_REASON_FIELD), Some(""));
        assert_eq!(payload.parts.len(), 4);
    }
}
