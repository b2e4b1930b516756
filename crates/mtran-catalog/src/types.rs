use serde::{Deserialize, Serialize};

/// A short language code (`en`, `zh-Hans`, `pt`), or the special value `auto`.
pub type LangCode = String;

pub const AUTO_LANG: &str = "auto";
pub const ENGLISH: &str = "en";

/// One of the four file roles a translation engine's fileset is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Model,
    Lex,
    Vocab,
    Srcvocab,
    Trgvocab,
}

impl FileRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Lex => "lex",
            Self::Vocab => "vocab",
            Self::Srcvocab => "srcvocab",
            Self::Trgvocab => "trgvocab",
        }
    }
}

/// An attachment's downloadable-artifact metadata, as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub hash: String,
    pub size: u64,
    pub filename: String,
    pub location: String,
    #[serde(default)]
    pub mimetype: String,
}

/// Wire representation of one catalog record, matching `records.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordJson {
    #[serde(default)]
    pub hash: Option<String>,
    pub name: String,
    pub schema: i64,
    #[serde(rename = "toLang")]
    pub to_lang: String,
    pub version: String,
    #[serde(rename = "fileType")]
    pub file_type: FileRole,
    #[serde(rename = "fromLang")]
    pub from_lang: String,
    pub attachment: Attachment,
    pub id: String,
}

/// The `{ "data": [...] }` envelope of `records.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub data: Vec<RecordJson>,
}

/// One entry in the model catalog: a single (from, to, version, role) record.
pub type ModelRecord = RecordJson;

impl ModelRecord {
    pub fn from_lang(&self) -> &str {
        &self.from_lang
    }

    pub fn to_lang(&self) -> &str {
        &self.to_lang
    }
}
