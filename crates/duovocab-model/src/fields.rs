use crate::vocabulary::Attributes;

/// Fields exported when the user does not customize the card layout.
///
/// The bundled Anki note type expects exactly these, in this order.
pub const DEFAULT_FIELDS: [&str; 8] = [
    "word",
    "gender",
    "infinitive",
    "pos",
    "translations",
    "canonical_path",
    "tts",
    "lexeme_image",
];

/// A field that points at remote media rather than carrying text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Pronunciation audio (`tts`).
    Audio,
    /// Illustrative image (`lexeme_image`).
    Image,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Audio, MediaKind::Image];

    /// Source field name on the word definition.
    pub fn field(self) -> &'static str {
        match self {
            MediaKind::Audio => "tts",
            MediaKind::Image => "lexeme_image",
        }
    }

    /// Derived column holding the rendered HTML snippet.
    pub fn column(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "img",
        }
    }

    /// Extension given to downloaded files of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Audio => ".mp3",
            MediaKind::Image => ".svg",
        }
    }

    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.field() == field)
    }

    /// HTML snippet for the card, given the resolved media reference.
    pub fn render(self, reference: Option<&str>) -> String {
        match (self, reference.filter(|r| !r.is_empty())) {
            (MediaKind::Audio, Some(src)) => {
                format!("<audio controls><source src='{src}' type='audio/mpeg'></audio>")
            }
            (MediaKind::Audio, None) => "No audio".to_string(),
            (MediaKind::Image, Some(src)) => format!("<img src='{src}'/>"),
            (MediaKind::Image, None) => "No image".to_string(),
        }
    }
}

/// Ordered selection of record fields that end up in the output table.
///
/// `id` is never part of a selection: it is the row key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<String>,
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::new(DEFAULT_FIELDS)
    }
}

impl FieldSet {
    /// Build a selection, dropping `id` and repeated names while keeping order.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if field != "id" && !out.contains(&field) {
                out.push(field);
            }
        }
        Self { fields: out }
    }

    /// Keep only fields the example record actually carries.
    pub fn available_in(&self, example: &Attributes) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|f| example.contains_key(f.as_str()))
                .cloned()
                .collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Selected fields exported verbatim (everything except media fields).
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|f| MediaKind::from_field(f).is_none())
    }

    /// Media kinds the selection asks for, in a fixed audio-then-image order.
    pub fn media_kinds(&self) -> Vec<MediaKind> {
        MediaKind::ALL
            .into_iter()
            .filter(|k| self.contains(k.field()))
            .collect()
    }

    pub fn wants_media(&self) -> bool {
        !self.media_kinds().is_empty()
    }

    /// Output column headers: text fields in selection order, then the
    /// derived `audio` / `img` columns.
    pub fn columns(&self) -> Vec<String> {
        self.text_fields()
            .map(str::to_string)
            .chain(self.media_kinds().into_iter().map(|k| k.column().to_string()))
            .collect()
    }
}
