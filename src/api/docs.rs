use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default)]
    pub end_index: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct DocumentBody {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Document {
    #[serde(default)]
    pub body: DocumentBody,
}

impl Document {
    /// Index at which appended text lands: just before the trailing newline
    /// of the body, and never before the first writable index.
    pub fn append_index(&self) -> i64 {
        let end = self
            .body
            .content
            .last()
            .and_then(|element| element.end_index)
            .unwrap_or(1);
        let index = end - 1;
        if index > 1 {
            index
        } else {
            1
        }
    }
}

#[derive(Serialize, Debug)]
pub struct Location {
    pub index: i64,
}

#[derive(Serialize, Debug)]
pub struct InsertText {
    pub text: String,
    pub location: Location,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub insert_text: InsertText,
}

#[derive(Serialize, Debug)]
pub struct BatchUpdateRequest {
    pub requests: Vec<DocumentRequest>,
}

impl BatchUpdateRequest {
    pub fn insert_at(text: impl Into<String>, index: i64) -> Self {
        Self {
            requests: vec![DocumentRequest {
                insert_text: InsertText {
                    text: text.into(),
                    location: Location { index },
                },
            }],
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub picture: String,
}
