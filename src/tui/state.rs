use crate::cli::load_upload_blocking;
use crate::model::{Identity, Submission};
use crate::view::FormView;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Files,
    Urls,
    FlagReason,
    ApiKey,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Files => Field::Urls,
            Field::Urls => Field::FlagReason,
            Field::FlagReason => Field::ApiKey,
            Field::ApiKey => Field::Files,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Field::Files => Field::ApiKey,
            Field::Urls => Field::Files,
            Field::FlagReason => Field::Urls,
            Field::ApiKey => Field::FlagReason,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Field::Files => "Files (Enter adds path, Ctrl-X removes last)",
            Field::Urls => "URLs",
            Field::FlagReason => "Flag reason",
            Field::ApiKey => "API key",
        }
    }
}

/// Form inputs as typed by the user. Read only when a submit is requested.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pub file_input: String,
    pub files: Vec<PathBuf>,
    pub urls: String,
    pub flag_reason: String,
    pub api_key: String,
}

pub struct UiState {
    pub view: FormView,
    pub fields: FormFields,
    pub focus: Field,
    pub show_help: bool,
    pub user: Identity,
}

impl UiState {
    pub fn new(user: Identity, api_key: Option<String>) -> Self {
        Self {
            view: FormView::default(),
            fields: FormFields {
                api_key: api_key.unwrap_or_default(),
                ..Default::default()
            },
            focus: Field::default(),
            show_help: false,
            user,
        }
    }

    fn focused_text(&mut self) -> &mut String {
        match self.focus {
            Field::Files => &mut self.fields.file_input,
            Field::Urls => &mut self.fields.urls,
            Field::FlagReason => &mut self.fields.flag_reason,
            Field::ApiKey => &mut self.fields.api_key,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.focused_text().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused_text().pop();
    }

    /// Enter adds the typed path in the file field and a newline in the URL field.
    pub fn enter(&mut self) {
        match self.focus {
            Field::Files => {
                let path = self.fields.file_input.trim().to_string();
                if !path.is_empty() {
                    self.fields.files.push(PathBuf::from(path));
                    self.fields.file_input.clear();
                }
            }
            Field::Urls => self.fields.urls.push('\n'),
            Field::FlagReason | Field::ApiKey => {}
        }
    }

    pub fn remove_last_file(&mut self) {
        self.fields.files.pop();
    }

    pub fn masked_api_key(&self) -> String {
        "*".repeat(self.fields.api_key.chars().count())
    }

    /// Snapshot the current inputs into a submission. File contents are read here.
    pub fn build_submission(&self) -> Result<Submission> {
        let files = self
            .fields
            .files
            .iter()
            .map(|p| load_upload_blocking(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Submission {
            files,
            urls: self.fields.urls.clone(),
            flag_reason: self.fields.flag_reason.clone(),
            api_key: self.fields.api_key.clone(),
            user: self.user.clone(),
        })
    }
}
