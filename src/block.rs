//! Content block model: the closed set of block types and their payload shapes.
//!
//! A `Block` serializes as `{ "type": "<tag>", "data": { ... } }`, the shape the
//! remote API stores verbatim. Loading is lenient about absent fields (each
//! variant's defaults fill them in, `null` counts as absent) and strict about
//! wrong-typed ones. Unknown fields are dropped.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::EditError;

pub const HEADING_LEVELS: std::ops::RangeInclusive<u8> = 2..=6;
pub const GALLERY_COLUMNS: [u8; 3] = [2, 3, 4];
pub const DEFAULT_GALLERY_COLUMNS: u8 = 3;

/// Block type tag. Adding a variant means adding a registry entry as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
  Heading,
  Paragraph,
  Image,
  Gallery,
  List,
  Quote,
  Code,
  Embed,
  Callout,
  Divider,
  Table,
  Faq,
  Button,
  Html,
}

impl BlockType {
  pub const ALL: [BlockType; 14] = [
    BlockType::Heading,
    BlockType::Paragraph,
    BlockType::Image,
    BlockType::Gallery,
    BlockType::List,
    BlockType::Quote,
    BlockType::Code,
    BlockType::Embed,
    BlockType::Callout,
    BlockType::Divider,
    BlockType::Table,
    BlockType::Faq,
    BlockType::Button,
    BlockType::Html,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      BlockType::Heading => "heading",
      BlockType::Paragraph => "paragraph",
      BlockType::Image => "image",
      BlockType::Gallery => "gallery",
      BlockType::List => "list",
      BlockType::Quote => "quote",
      BlockType::Code => "code",
      BlockType::Embed => "embed",
      BlockType::Callout => "callout",
      BlockType::Divider => "divider",
      BlockType::Table => "table",
      BlockType::Faq => "faq",
      BlockType::Button => "button",
      BlockType::Html => "html",
    }
  }

  pub fn parse(tag: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|t| t.as_str() == tag)
  }
}

impl fmt::Display for BlockType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// --- Payloads ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingData {
  pub level: u8,
  pub text: String,
}
impl Default for HeadingData {
  fn default() -> Self { Self { level: 2, text: String::new() } }
}

/// `text` may carry inline math markup; it is stored as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphData {
  pub text: String,
}

/// Used both for standalone image blocks and for gallery entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageData {
  pub url: String,
  pub alt: String,
  pub caption: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryData {
  pub images: Vec<ImageData>,
  pub columns: u8,
}
impl Default for GalleryData {
  fn default() -> Self { Self { images: Vec::new(), columns: DEFAULT_GALLERY_COLUMNS } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
  #[default]
  Unordered,
  Ordered,
  Checklist,
}

/// A list entry. Plain strings are the simple form; checklists promote an
/// entry to the object form the first time its checked state is toggled.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
  Plain(String),
  Checked {
    #[serde(default)]
    text: String,
    #[serde(default)]
    checked: bool,
  },
}

impl ListItem {
  pub fn text(&self) -> &str {
    match self {
      ListItem::Plain(text) => text,
      ListItem::Checked { text, .. } => text,
    }
  }

  pub fn is_checked(&self) -> bool {
    matches!(self, ListItem::Checked { checked: true, .. })
  }

  /// Flip the checked state, promoting a plain entry to object form.
  /// The text is carried over untouched.
  pub fn toggled(&self) -> ListItem {
    ListItem::Checked { text: self.text().to_string(), checked: !self.is_checked() }
  }

  /// Replace the text, keeping the representation and checked state.
  pub fn with_text(&self, text: impl Into<String>) -> ListItem {
    match self {
      ListItem::Plain(_) => ListItem::Plain(text.into()),
      ListItem::Checked { checked, .. } => ListItem::Checked { text: text.into(), checked: *checked },
    }
  }
}

// A plain entry means the same thing as an unchecked object entry.
impl PartialEq for ListItem {
  fn eq(&self, other: &Self) -> bool {
    self.text() == other.text() && self.is_checked() == other.is_checked()
  }
}

impl From<&str> for ListItem {
  fn from(s: &str) -> Self { ListItem::Plain(s.to_string()) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListData {
  pub style: ListStyle,
  pub items: Vec<ListItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteData {
  pub text: String,
  pub author: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeData {
  pub language: String,
  pub code: String,
  pub caption: String,
}
impl Default for CodeData {
  fn default() -> Self { Self { language: "plaintext".into(), code: String::new(), caption: String::new() } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedKind {
  #[default]
  Youtube,
  Tiktok,
  Other,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedData {
  #[serde(rename = "type")]
  pub kind: EmbedKind,
  pub url: String,
  pub caption: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutKind {
  #[default]
  Info,
  Warning,
  Success,
  Error,
  Tip,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalloutData {
  #[serde(rename = "type")]
  pub kind: CalloutKind,
  pub title: String,
  pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DividerData {}

/// Rows of cells. Editor operations keep every row the same length; content
/// loaded from elsewhere is taken as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableData {
  pub with_headings: bool,
  pub content: Vec<Vec<String>>,
}
impl Default for TableData {
  fn default() -> Self {
    Self {
      with_headings: true,
      content: vec![vec![String::new(), String::new()], vec![String::new(), String::new()]],
    }
  }
}

impl TableData {
  pub fn is_rectangular(&self) -> bool {
    match self.content.first() {
      Some(first) => self.content.iter().all(|row| row.len() == first.len()),
      None => true,
    }
  }

  /// Width of the first row, which sets the width of added rows.
  pub fn column_count(&self) -> usize {
    self.content.first().map(Vec::len).unwrap_or(0)
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqItem {
  pub question: String,
  pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqData {
  pub items: Vec<FaqItem>,
}
impl Default for FaqData {
  fn default() -> Self { Self { items: vec![FaqItem::default()] } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
  #[default]
  Primary,
  Secondary,
  Outline,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonSize {
  Small,
  #[default]
  Medium,
  Large,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonData {
  pub text: String,
  pub url: String,
  pub variant: ButtonVariant,
  pub size: ButtonSize,
  pub new_tab: bool,
}

/// Raw markup, stored and returned untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlData {
  pub html: String,
}

// --- Block ---

/// One content unit. The payload shape is fixed by the variant.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Block {
  Heading(HeadingData),
  Paragraph(ParagraphData),
  Image(ImageData),
  Gallery(GalleryData),
  List(ListData),
  Quote(QuoteData),
  Code(CodeData),
  Embed(EmbedData),
  Callout(CalloutData),
  Divider(DividerData),
  Table(TableData),
  Faq(FaqData),
  Button(ButtonData),
  Html(HtmlData),
}

impl Block {
  pub fn block_type(&self) -> BlockType {
    match self {
      Block::Heading(_) => BlockType::Heading,
      Block::Paragraph(_) => BlockType::Paragraph,
      Block::Image(_) => BlockType::Image,
      Block::Gallery(_) => BlockType::Gallery,
      Block::List(_) => BlockType::List,
      Block::Quote(_) => BlockType::Quote,
      Block::Code(_) => BlockType::Code,
      Block::Embed(_) => BlockType::Embed,
      Block::Callout(_) => BlockType::Callout,
      Block::Divider(_) => BlockType::Divider,
      Block::Table(_) => BlockType::Table,
      Block::Faq(_) => BlockType::Faq,
      Block::Button(_) => BlockType::Button,
      Block::Html(_) => BlockType::Html,
    }
  }

  /// A fresh block of the given type carrying the variant's default payload.
  pub fn default_for(kind: BlockType) -> Block {
    match kind {
      BlockType::Heading => Block::Heading(HeadingData::default()),
      BlockType::Paragraph => Block::Paragraph(ParagraphData::default()),
      BlockType::Image => Block::Image(ImageData::default()),
      BlockType::Gallery => Block::Gallery(GalleryData::default()),
      BlockType::List => Block::List(ListData::default()),
      BlockType::Quote => Block::Quote(QuoteData::default()),
      BlockType::Code => Block::Code(CodeData::default()),
      BlockType::Embed => Block::Embed(EmbedData::default()),
      BlockType::Callout => Block::Callout(CalloutData::default()),
      BlockType::Divider => Block::Divider(DividerData::default()),
      BlockType::Table => Block::Table(TableData::default()),
      BlockType::Faq => Block::Faq(FaqData::default()),
      BlockType::Button => Block::Button(ButtonData::default()),
      BlockType::Html => Block::Html(HtmlData::default()),
    }
  }

  /// The payload alone, as the JSON object stored under `data`.
  pub fn data_value(&self) -> Value {
    let out = match self {
      Block::Heading(d) => serde_json::to_value(d),
      Block::Paragraph(d) => serde_json::to_value(d),
      Block::Image(d) => serde_json::to_value(d),
      Block::Gallery(d) => serde_json::to_value(d),
      Block::List(d) => serde_json::to_value(d),
      Block::Quote(d) => serde_json::to_value(d),
      Block::Code(d) => serde_json::to_value(d),
      Block::Embed(d) => serde_json::to_value(d),
      Block::Callout(d) => serde_json::to_value(d),
      Block::Divider(d) => serde_json::to_value(d),
      Block::Table(d) => serde_json::to_value(d),
      Block::Faq(d) => serde_json::to_value(d),
      Block::Button(d) => serde_json::to_value(d),
      Block::Html(d) => serde_json::to_value(d),
    };
    // Payloads are plain structs of strings, numbers, bools and enums.
    out.unwrap_or_else(|_| Value::Object(Map::new()))
  }

  /// Build a block from a payload exactly as given: absent fields take the
  /// variant default, but values are not clamped or coerced.
  pub fn from_data(kind: BlockType, data: Value) -> Result<Block, EditError> {
    let block = match kind {
      BlockType::Heading => Block::Heading(payload(data)?),
      BlockType::Paragraph => Block::Paragraph(payload(data)?),
      BlockType::Image => Block::Image(payload(data)?),
      BlockType::Gallery => Block::Gallery(payload(data)?),
      BlockType::List => Block::List(payload(data)?),
      BlockType::Quote => Block::Quote(payload(data)?),
      BlockType::Code => Block::Code(payload(data)?),
      BlockType::Embed => Block::Embed(payload(data)?),
      BlockType::Callout => Block::Callout(payload(data)?),
      BlockType::Divider => Block::Divider(payload(data)?),
      BlockType::Table => Block::Table(payload(data)?),
      BlockType::Faq => Block::Faq(payload(data)?),
      BlockType::Button => Block::Button(payload(data)?),
      BlockType::Html => Block::Html(payload(data)?),
    };
    Ok(block)
  }

  /// Load policy for stored content: `null` counts as absent at any depth and
  /// out-of-range numbers are pulled back into range.
  pub fn from_stored(kind: BlockType, data: Value) -> Result<Block, EditError> {
    let mut data = match without_nulls(data) {
      Value::Null => Map::new(),
      Value::Object(map) => map,
      other => return Err(EditError::MalformedPayload(format!("expected an object for '{kind}', got {other}"))),
    };
    match kind {
      BlockType::Heading => coerce_number(&mut data, "level", |n| {
        n.clamp(f64::from(*HEADING_LEVELS.start()), f64::from(*HEADING_LEVELS.end()))
      }),
      BlockType::Gallery => coerce_number(&mut data, "columns", |n| {
        if GALLERY_COLUMNS.iter().any(|c| f64::from(*c) == n) { n } else { f64::from(DEFAULT_GALLERY_COLUMNS) }
      }),
      _ => {}
    }
    Block::from_data(kind, Value::Object(data))
  }

  /// Range checks applied to edits.
  pub fn validate(&self) -> Result<(), EditError> {
    match self {
      Block::Heading(h) if !HEADING_LEVELS.contains(&h.level) => {
        Err(EditError::invalid_value("level", format!("heading level must be 2..=6, got {}", h.level)))
      }
      Block::Gallery(g) if !GALLERY_COLUMNS.contains(&g.columns) => {
        Err(EditError::invalid_value("columns", format!("columns must be 2, 3 or 4, got {}", g.columns)))
      }
      _ => Ok(()),
    }
  }
}

/// Drop `null` object members and array elements, recursively.
fn without_nulls(value: Value) -> Value {
  match value {
    Value::Object(map) => Value::Object(
      map.into_iter().filter(|(_, v)| !v.is_null()).map(|(k, v)| (k, without_nulls(v))).collect(),
    ),
    Value::Array(items) => Value::Array(items.into_iter().filter(|v| !v.is_null()).map(without_nulls).collect()),
    other => other,
  }
}

/// Rewrite a numeric field through `fix`, so values that do not fit the
/// payload's integer type (negative, huge, fractional) still load. Non-numbers
/// are left for the typed decode to reject.
fn coerce_number(data: &mut Map<String, Value>, field: &str, fix: impl Fn(f64) -> f64) {
  if let Some(n) = data.get(field).and_then(Value::as_f64) {
    data.insert(field.to_string(), Value::from(fix(n.round()) as u64));
  }
}

fn payload<T: DeserializeOwned>(data: Value) -> Result<T, EditError> {
  serde_json::from_value(data).map_err(|e| EditError::MalformedPayload(e.to_string()))
}

#[derive(Deserialize)]
struct RawBlock {
  #[serde(rename = "type")]
  kind: BlockType,
  #[serde(default)]
  data: Value,
}

impl<'de> Deserialize<'de> for Block {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = RawBlock::deserialize(deserializer)?;
    Block::from_stored(raw.kind, raw.data).map_err(serde::de::Error::custom)
  }
}
