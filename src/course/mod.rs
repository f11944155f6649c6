//! Course and resource wire model
//!
//! Decoded forms of the remote catalog payloads. A course owns a forest of
//! nested resource nodes (`filemap`); the flat variant carries a
//! server-computed directory string instead of nesting.

pub mod catalog;

use serde::{Deserialize, Deserializer};

/// One course from the catalog batch response.
///
/// The catalog is replaced wholesale on every refresh, so a `Course` never
/// outlives the batch it was decoded from.
#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    #[serde(rename = "description", default)]
    pub summary: Option<String>,
    #[serde(default = "default_points")]
    pub points: i16,
    /// Whether the server offers a reindex for this course.
    #[serde(rename = "canUpdate", default)]
    pub can_update: bool,
    /// Forest of resource nodes, absent for courses without materials.
    #[serde(default)]
    pub filemap: Option<Vec<DecodedNode>>,
}

fn default_points() -> i16 {
    -1
}

/// Resource kind as sent by the server.
///
/// The wire value `resource` denotes a bookmarked external link; the legacy
/// value `video` is an alias for `webpage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Unknown,
    Course,
    #[serde(alias = "video")]
    Webpage,
    Folder,
    File,
    Form,
    #[serde(rename = "resource")]
    Link,
}

/// Document-format hint for file resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSubtype {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Video,
}

impl ResourceSubtype {
    fn from_wire(value: &str) -> Option<Self> {
        match value {
            "pdf" => Some(ResourceSubtype::Pdf),
            "docx" => Some(ResourceSubtype::Docx),
            "xlsx" => Some(ResourceSubtype::Xlsx),
            "pptx" => Some(ResourceSubtype::Pptx),
            "mp4" | "video" => Some(ResourceSubtype::Video),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceSubtype::Pdf => "PDF",
            ResourceSubtype::Docx => "Document",
            ResourceSubtype::Xlsx => "Excel",
            ResourceSubtype::Pptx => "Powerpoint",
            ResourceSubtype::Video => "Video",
        }
    }
}

/// Unrecognized subtype values decode as absent rather than failing the
/// whole payload.
fn lenient_subtype<'de, D>(deserializer: D) -> Result<Option<ResourceSubtype>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ResourceSubtype::from_wire))
}

/// One entry of a course's nested resource forest, as decoded off the wire.
///
/// Indexing into a traversable tree happens separately; see
/// [`crate::tree::ResourceTree::build`].
#[derive(Debug, Clone, Deserialize)]
pub struct DecodedNode {
    /// Absent for presentational placeholders, which can never be synced.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Byte size, unknown for non-file kinds.
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default, deserialize_with = "lenient_subtype")]
    pub subtype: Option<ResourceSubtype>,
    /// `None` for leaves.
    #[serde(default)]
    pub children: Option<Vec<DecodedNode>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CourseRef {
    code: String,
}

fn course_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let reference = Option::<CourseRef>::deserialize(deserializer)?;
    Ok(reference.map(|r| r.code))
}

/// Alternate flat representation: no hierarchy, the server supplies the
/// directory path directly.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatResource {
    pub id: String,
    pub name: String,
    #[serde(default = "default_flat_size")]
    pub size: i64,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default, deserialize_with = "lenient_subtype")]
    pub subtype: Option<ResourceSubtype>,
    /// Server-computed directory relative to the sync root.
    #[serde(default)]
    pub directory: Option<String>,
    /// Owning course code, sent as a nested `{"code": …}` object.
    #[serde(default, deserialize_with = "course_code")]
    pub course: Option<String>,
}

fn default_flat_size() -> i64 {
    -1
}
