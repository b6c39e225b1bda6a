//! Block variant catalog: display metadata and default payload per block type.

use serde::Serialize;
use serde_json::Value;

use crate::block::{Block, BlockType};

/// Palette entry for one block type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInfo {
  /// `None` for the fallback entry.
  #[serde(rename = "type")]
  pub kind: Option<BlockType>,
  pub label: &'static str,
  pub icon: &'static str,
  pub default_data: Value,
}

fn label_and_icon(kind: BlockType) -> (&'static str, &'static str) {
  match kind {
    BlockType::Heading => ("Heading", "heading"),
    BlockType::Paragraph => ("Paragraph", "text"),
    BlockType::Image => ("Image", "image"),
    BlockType::Gallery => ("Gallery", "images"),
    BlockType::List => ("List", "list"),
    BlockType::Quote => ("Quote", "quote"),
    BlockType::Code => ("Code", "code"),
    BlockType::Embed => ("Embed", "video"),
    BlockType::Callout => ("Callout", "alert"),
    BlockType::Divider => ("Divider", "minus"),
    BlockType::Table => ("Table", "table"),
    BlockType::Faq => ("FAQ", "help-circle"),
    BlockType::Button => ("Button", "mouse-pointer"),
    BlockType::Html => ("HTML", "file-code"),
  }
}

impl BlockType {
  pub fn info(self) -> VariantInfo {
    let (label, icon) = label_and_icon(self);
    VariantInfo { kind: Some(self), label, icon, default_data: Block::default_for(self).data_value() }
  }
}

/// Entry returned for tags outside the catalog.
pub fn unsupported() -> VariantInfo {
  VariantInfo { kind: None, label: "Unsupported block", icon: "help-circle", default_data: Value::Object(Default::default()) }
}

/// Look a raw tag up. Unknown tags get the fallback entry rather than an error.
pub fn lookup(tag: &str) -> VariantInfo {
  BlockType::parse(tag).map(BlockType::info).unwrap_or_else(unsupported)
}

/// The whole catalog in palette order.
pub fn all() -> Vec<VariantInfo> {
  BlockType::ALL.iter().map(|k| k.info()).collect()
}
