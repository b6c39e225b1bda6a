//! Per-block edits. Every operation takes a block by reference and returns a
//! new one; the input is left as it was, including on error.
//!
//! The console sends one `BlockEdit` per field mutation (every keystroke or
//! selection), so these are kept cheap and unbatched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::block::{Block, FaqItem, ImageData, ListData, ListItem, ListStyle, TableData};
use crate::error::EditError;

/// A single edit to one block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BlockEdit {
  /// Replace one payload field by its wire name (`newTab`, `withHeadings`, ...).
  SetField { field: String, value: Value },
  /// Append a default entry to a list-valued field.
  AppendEntry { field: String },
  RemoveEntry { field: String, index: usize },
  EditEntry { field: String, index: usize, value: Value },
  AddRow,
  AddColumn,
  RemoveRow { index: usize },
  RemoveColumn { index: usize },
  SetCell { row: usize, column: usize, value: String },
  ToggleChecked { index: usize },
  SetItemText { index: usize, text: String },
}

impl BlockEdit {
  pub fn name(&self) -> &'static str {
    match self {
      BlockEdit::SetField { .. } => "set_field",
      BlockEdit::AppendEntry { .. } => "append_entry",
      BlockEdit::RemoveEntry { .. } => "remove_entry",
      BlockEdit::EditEntry { .. } => "edit_entry",
      BlockEdit::AddRow => "add_row",
      BlockEdit::AddColumn => "add_column",
      BlockEdit::RemoveRow { .. } => "remove_row",
      BlockEdit::RemoveColumn { .. } => "remove_column",
      BlockEdit::SetCell { .. } => "set_cell",
      BlockEdit::ToggleChecked { .. } => "toggle_checked",
      BlockEdit::SetItemText { .. } => "set_item_text",
    }
  }
}

pub fn apply(block: &Block, edit: &BlockEdit) -> Result<Block, EditError> {
  match edit {
    BlockEdit::SetField { field, value } => update_field(block, field, value.clone()),
    BlockEdit::AppendEntry { field } => append_entry(block, field),
    BlockEdit::RemoveEntry { field, index } => remove_entry(block, field, *index),
    BlockEdit::EditEntry { field, index, value } => edit_entry(block, field, *index, value.clone()),
    BlockEdit::AddRow => with_table(block, edit, |t| Ok(add_row(t))),
    BlockEdit::AddColumn => with_table(block, edit, |t| Ok(add_column(t))),
    BlockEdit::RemoveRow { index } => with_table(block, edit, |t| remove_row(t, *index)),
    BlockEdit::RemoveColumn { index } => with_table(block, edit, |t| remove_column(t, *index)),
    BlockEdit::SetCell { row, column, value } => with_table(block, edit, |t| set_cell(t, *row, *column, value)),
    BlockEdit::ToggleChecked { index } => with_list(block, edit, |l| toggle_checked(l, *index)),
    BlockEdit::SetItemText { index, text } => with_list(block, edit, |l| set_item_text(l, *index, text)),
  }
}

/// Replace `data[field]` with `value`. The block's type never changes; the
/// field must exist on the variant and the value must fit its type and range.
pub fn update_field(block: &Block, field: &str, value: Value) -> Result<Block, EditError> {
  let kind = block.block_type();
  let mut data = match block.data_value() {
    Value::Object(map) => map,
    _ => Map::new(),
  };
  if !data.contains_key(field) {
    return Err(EditError::UnknownField { block_type: kind, field: field.to_string() });
  }
  data.insert(field.to_string(), value);

  let updated = Block::from_data(kind, Value::Object(data)).map_err(|e| match e {
    EditError::MalformedPayload(reason) => EditError::invalid_value(field, reason),
    other => other,
  })?;
  updated.validate()?;
  Ok(updated)
}

pub fn append_entry(block: &Block, field: &str) -> Result<Block, EditError> {
  match (block, field) {
    (Block::Gallery(g), "images") => {
      let mut g = g.clone();
      g.images = appended(&g.images, ImageData::default());
      Ok(Block::Gallery(g))
    }
    (Block::List(l), "items") => {
      let entry = match l.style {
        ListStyle::Checklist => ListItem::Checked { text: String::new(), checked: false },
        ListStyle::Unordered | ListStyle::Ordered => ListItem::Plain(String::new()),
      };
      let mut l = l.clone();
      l.items = appended(&l.items, entry);
      Ok(Block::List(l))
    }
    (Block::Table(t), "content") => Ok(Block::Table(add_row(t))),
    (Block::Faq(f), "items") => {
      let mut f = f.clone();
      f.items = appended(&f.items, FaqItem::default());
      Ok(Block::Faq(f))
    }
    _ => Err(not_a_list_field(block, field)),
  }
}

pub fn remove_entry(block: &Block, field: &str, index: usize) -> Result<Block, EditError> {
  match (block, field) {
    (Block::Gallery(g), "images") => {
      let mut g = g.clone();
      g.images = removed(&g.images, index)?;
      Ok(Block::Gallery(g))
    }
    (Block::List(l), "items") => {
      let mut l = l.clone();
      l.items = removed(&l.items, index)?;
      Ok(Block::List(l))
    }
    (Block::Table(t), "content") => Ok(Block::Table(remove_row(t, index)?)),
    (Block::Faq(f), "items") => {
      let mut f = f.clone();
      f.items = removed(&f.items, index)?;
      Ok(Block::Faq(f))
    }
    _ => Err(not_a_list_field(block, field)),
  }
}

/// Replace one entry of a list-valued field. The value is decoded as that
/// field's entry type (image, list item, table row, FAQ item).
pub fn edit_entry(block: &Block, field: &str, index: usize, value: Value) -> Result<Block, EditError> {
  match (block, field) {
    (Block::Gallery(g), "images") => {
      let mut g = g.clone();
      g.images = replaced(&g.images, index, entry(field, value)?)?;
      Ok(Block::Gallery(g))
    }
    (Block::List(l), "items") => {
      let mut l = l.clone();
      l.items = replaced(&l.items, index, entry(field, value)?)?;
      Ok(Block::List(l))
    }
    (Block::Table(t), "content") => {
      let mut t = t.clone();
      t.content = replaced(&t.content, index, entry(field, value)?)?;
      Ok(Block::Table(t))
    }
    (Block::Faq(f), "items") => {
      let mut f = f.clone();
      f.items = replaced(&f.items, index, entry(field, value)?)?;
      Ok(Block::Faq(f))
    }
    _ => Err(not_a_list_field(block, field)),
  }
}

// --- Table ---

/// Append a row as wide as the first row, filled with empty cells.
/// An empty table gets a single one-cell row.
pub fn add_row(table: &TableData) -> TableData {
  let width = if table.content.is_empty() { 1 } else { table.column_count() };
  let mut out = table.clone();
  out.content = appended(&table.content, vec![String::new(); width]);
  out
}

/// Append one empty cell to every existing row.
pub fn add_column(table: &TableData) -> TableData {
  let mut out = table.clone();
  out.content = table
    .content
    .iter()
    .map(|row| appended(row, String::new()))
    .collect();
  out
}

pub fn remove_row(table: &TableData, index: usize) -> Result<TableData, EditError> {
  let mut out = table.clone();
  out.content = removed(&table.content, index)?;
  Ok(out)
}

/// Remove column `index` from every row that has it.
pub fn remove_column(table: &TableData, index: usize) -> Result<TableData, EditError> {
  let width = table.column_count();
  if index >= width {
    return Err(EditError::out_of_range(index, width));
  }
  let mut out = table.clone();
  out.content = table
    .content
    .iter()
    .map(|row| if index < row.len() { removed(row, index).unwrap_or_else(|_| row.clone()) } else { row.clone() })
    .collect();
  Ok(out)
}

pub fn set_cell(table: &TableData, row: usize, column: usize, value: &str) -> Result<TableData, EditError> {
  let cells = table.content.get(row).ok_or_else(|| EditError::out_of_range(row, table.content.len()))?;
  let mut out = table.clone();
  out.content[row] = replaced(cells, column, value.to_string())?;
  Ok(out)
}

// --- Checklist ---

/// Flip the checked state of a checklist entry, promoting a plain string to
/// `{ text, checked }`. Only checklists carry a checked state.
pub fn toggle_checked(list: &ListData, index: usize) -> Result<ListData, EditError> {
  let item = list.items.get(index).ok_or_else(|| EditError::out_of_range(index, list.items.len()))?;
  let mut out = list.clone();
  out.items = replaced(&list.items, index, item.toggled())?;
  Ok(out)
}

pub fn set_item_text(list: &ListData, index: usize, text: &str) -> Result<ListData, EditError> {
  let item = list.items.get(index).ok_or_else(|| EditError::out_of_range(index, list.items.len()))?;
  let mut out = list.clone();
  out.items = replaced(&list.items, index, item.with_text(text))?;
  Ok(out)
}

// --- helpers ---

fn with_table(
  block: &Block,
  edit: &BlockEdit,
  f: impl FnOnce(&TableData) -> Result<TableData, EditError>,
) -> Result<Block, EditError> {
  match block {
    Block::Table(t) => Ok(Block::Table(f(t)?)),
    other => Err(EditError::Unsupported { block_type: other.block_type(), op: edit.name() }),
  }
}

fn with_list(
  block: &Block,
  edit: &BlockEdit,
  f: impl FnOnce(&ListData) -> Result<ListData, EditError>,
) -> Result<Block, EditError> {
  match (block, edit) {
    (Block::List(l), BlockEdit::ToggleChecked { .. }) if l.style != ListStyle::Checklist => {
      Err(EditError::invalid_value("style", "checked state only applies to checklists"))
    }
    (Block::List(l), _) => Ok(Block::List(f(l)?)),
    (other, _) => Err(EditError::Unsupported { block_type: other.block_type(), op: edit.name() }),
  }
}

fn not_a_list_field(block: &Block, field: &str) -> EditError {
  EditError::UnknownField { block_type: block.block_type(), field: field.to_string() }
}

fn entry<T: DeserializeOwned>(field: &str, value: Value) -> Result<T, EditError> {
  serde_json::from_value(value).map_err(|e| EditError::invalid_value(field, e))
}

fn appended<T: Clone>(items: &[T], item: T) -> Vec<T> {
  let mut out = Vec::with_capacity(items.len() + 1);
  out.extend_from_slice(items);
  out.push(item);
  out
}

fn removed<T: Clone>(items: &[T], index: usize) -> Result<Vec<T>, EditError> {
  if index >= items.len() {
    return Err(EditError::out_of_range(index, items.len()));
  }
  Ok(items
    .iter()
    .enumerate()
    .filter(|(i, _)| *i != index)
    .map(|(_, item)| item.clone())
    .collect())
}

fn replaced<T: Clone>(items: &[T], index: usize, item: T) -> Result<Vec<T>, EditError> {
  if index >= items.len() {
    return Err(EditError::out_of_range(index, items.len()));
  }
  let mut out = items.to_vec();
  out[index] = item;
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::{BlockType, ButtonSize, CalloutKind, EmbedKind, GalleryData, HeadingData, ParagraphData};
  use pretty_assertions::assert_eq;
  use serde_json::json;

  fn table(rows: &[&[&str]]) -> TableData {
    TableData {
      with_headings: true,
      content: rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
    }
  }

  fn checklist(items: Vec<ListItem>) -> ListData {
    ListData { style: ListStyle::Checklist, items }
  }

  #[test]
  fn update_field_reads_back_for_every_type() {
    let cases: Vec<(BlockType, &str, Value)> = vec![
      (BlockType::Heading, "text", json!("Intro")),
      (BlockType::Heading, "level", json!(4)),
      (BlockType::Paragraph, "text", json!("Hello $x^2$")),
      (BlockType::Image, "alt", json!("a cat")),
      (BlockType::Gallery, "columns", json!(2)),
      (BlockType::List, "style", json!("ordered")),
      (BlockType::Quote, "author", json!("Ada")),
      (BlockType::Code, "language", json!("rust")),
      (BlockType::Embed, "type", json!("tiktok")),
      (BlockType::Callout, "type", json!("warning")),
      (BlockType::Table, "withHeadings", json!(false)),
      (BlockType::Faq, "items", json!([{"question": "Q", "answer": "A"}])),
      (BlockType::Button, "newTab", json!(true)),
      (BlockType::Html, "html", json!("<hr>")),
    ];
    for (kind, field, value) in cases {
      let block = Block::default_for(kind);
      let updated = update_field(&block, field, value.clone()).unwrap();
      assert_eq!(updated.block_type(), kind);
      assert_eq!(updated.data_value()[field], value, "{kind}.{field}");
    }
  }

  #[test]
  fn update_field_maps_to_typed_payload() {
    let b = update_field(&Block::default_for(BlockType::Embed), "type", json!("other")).unwrap();
    assert!(matches!(b, Block::Embed(ref e) if e.kind == EmbedKind::Other));
    let b = update_field(&Block::default_for(BlockType::Callout), "type", json!("tip")).unwrap();
    assert!(matches!(b, Block::Callout(ref c) if c.kind == CalloutKind::Tip));
    let b = update_field(&Block::default_for(BlockType::Button), "size", json!("large")).unwrap();
    assert!(matches!(b, Block::Button(ref d) if d.size == ButtonSize::Large));
  }

  #[test]
  fn update_field_leaves_input_untouched() {
    let block = Block::Paragraph(ParagraphData { text: "before".into() });
    let _ = update_field(&block, "text", json!("after")).unwrap();
    assert_eq!(block, Block::Paragraph(ParagraphData { text: "before".into() }));
  }

  #[test]
  fn update_field_rejects_unknown_fields_and_bad_values() {
    let heading = Block::default_for(BlockType::Heading);
    assert!(matches!(update_field(&heading, "author", json!("x")), Err(EditError::UnknownField { .. })));
    assert!(matches!(update_field(&heading, "level", json!(1)), Err(EditError::InvalidValue { .. })));
    assert!(matches!(update_field(&heading, "text", json!(5)), Err(EditError::InvalidValue { .. })));
    let gallery = Block::default_for(BlockType::Gallery);
    assert!(matches!(update_field(&gallery, "columns", json!(5)), Err(EditError::InvalidValue { .. })));
    let embed = Block::default_for(BlockType::Embed);
    assert!(matches!(update_field(&embed, "type", json!("vimeo")), Err(EditError::InvalidValue { .. })));
    let divider = Block::default_for(BlockType::Divider);
    assert!(matches!(update_field(&divider, "text", json!("")), Err(EditError::UnknownField { .. })));
  }

  #[test]
  fn table_add_row_uses_first_row_width() {
    let t = table(&[&["a", "b"], &["c", "d"]]);
    let out = add_row(&t);
    assert_eq!(out, table(&[&["a", "b"], &["c", "d"], &["", ""]]));
    assert_eq!(t, table(&[&["a", "b"], &["c", "d"]]));
  }

  #[test]
  fn table_add_column_extends_every_row() {
    let t = table(&[&["a", "b"], &["c", "d"]]);
    assert_eq!(add_column(&t), table(&[&["a", "b", ""], &["c", "d", ""]]));
  }

  #[test]
  fn table_growth_stays_rectangular() {
    let mut t = table(&[&["1", "2", "3"]]);
    for step in 0..6 {
      t = if step % 2 == 0 { add_row(&t) } else { add_column(&t) };
      assert!(t.is_rectangular(), "step {step}: {:?}", t.content);
    }
    assert_eq!(t.content.len(), 4);
    assert_eq!(t.column_count(), 6);
  }

  #[test]
  fn table_edges() {
    let empty = TableData { with_headings: false, content: vec![] };
    assert_eq!(add_row(&empty).content, vec![vec![String::new()]]);
    assert!(add_column(&empty).content.is_empty());

    let t = table(&[&["a", "b"], &["c", "d"]]);
    assert_eq!(remove_column(&t, 0).unwrap(), table(&[&["b"], &["d"]]));
    assert_eq!(remove_row(&t, 1).unwrap(), table(&[&["a", "b"]]));
    assert_eq!(set_cell(&t, 1, 0, "z").unwrap(), table(&[&["a", "b"], &["z", "d"]]));
    assert!(set_cell(&t, 2, 0, "z").is_err());
    assert!(remove_column(&t, 2).is_err());
  }

  #[test]
  fn table_ops_through_apply() {
    let block = Block::Table(table(&[&["a", "b"], &["c", "d"]]));
    let grown = apply(&block, &BlockEdit::AddRow).unwrap();
    let grown = apply(&grown, &BlockEdit::AddColumn).unwrap();
    assert_eq!(grown, Block::Table(table(&[&["a", "b", ""], &["c", "d", ""], &["", "", ""]])));
    let paragraph = Block::default_for(BlockType::Paragraph);
    assert!(matches!(apply(&paragraph, &BlockEdit::AddRow), Err(EditError::Unsupported { op: "add_row", .. })));
  }

  #[test]
  fn toggling_a_plain_item_promotes_then_preserves_text() {
    let list = checklist(vec!["eggs".into(), "milk".into()]);
    let once = toggle_checked(&list, 1).unwrap();
    assert_eq!(once.items[1], ListItem::Checked { text: "milk".into(), checked: true });
    assert!(matches!(once.items[0], ListItem::Plain(_)));

    let twice = toggle_checked(&once, 1).unwrap();
    match &twice.items[1] {
      ListItem::Checked { text, checked } => {
        assert_eq!(text, "milk");
        assert!(!checked);
      }
      ListItem::Plain(_) => panic!("expected object form after toggling"),
    }
    assert_eq!(twice, list);
  }

  #[test]
  fn toggle_requires_checklist_style() {
    let block = Block::List(ListData { style: ListStyle::Ordered, items: vec!["a".into()] });
    assert!(apply(&block, &BlockEdit::ToggleChecked { index: 0 }).is_err());
  }

  #[test]
  fn set_item_text_keeps_checked_state() {
    let list = checklist(vec![ListItem::Checked { text: "a".into(), checked: true }, "b".into()]);
    let out = set_item_text(&list, 0, "A").unwrap();
    assert_eq!(out.items[0], ListItem::Checked { text: "A".into(), checked: true });
    let out = set_item_text(&out, 1, "B").unwrap();
    assert!(matches!(out.items[1], ListItem::Plain(ref t) if t == "B"));
  }

  #[test]
  fn list_subfields_append_remove_edit() {
    let gallery = Block::Gallery(GalleryData::default());
    let gallery = append_entry(&gallery, "images").unwrap();
    let gallery = edit_entry(&gallery, "images", 0, json!({"url": "a.png", "alt": "A", "caption": ""})).unwrap();
    match &gallery {
      Block::Gallery(g) => assert_eq!(g.images, vec![ImageData { url: "a.png".into(), alt: "A".into(), caption: String::new() }]),
      other => panic!("expected gallery, got {other:?}"),
    }
    let gallery = remove_entry(&gallery, "images", 0).unwrap();
    assert_eq!(gallery, Block::Gallery(GalleryData::default()));

    let faq = Block::default_for(BlockType::Faq);
    let faq = append_entry(&faq, "items").unwrap();
    let faq = edit_entry(&faq, "items", 1, json!({"question": "Why?", "answer": "Because."})).unwrap();
    assert_eq!(faq.data_value()["items"][1], json!({"question": "Why?", "answer": "Because."}));

    let list = Block::List(ListData { style: ListStyle::Checklist, items: vec![] });
    let list = append_entry(&list, "items").unwrap();
    assert_eq!(list.data_value()["items"], json!([{"text": "", "checked": false}]));
    let list = edit_entry(&list, "items", 0, json!("plain again")).unwrap();
    assert_eq!(list.data_value()["items"], json!(["plain again"]));
  }

  #[test]
  fn sub_index_errors_do_not_change_the_block() {
    let faq = Block::default_for(BlockType::Faq);
    assert_eq!(remove_entry(&faq, "items", 3), Err(EditError::IndexOutOfRange { index: 3, len: 1 }));
    let heading = Block::Heading(HeadingData::default());
    assert!(matches!(append_entry(&heading, "text"), Err(EditError::UnknownField { .. })));
  }

  #[test]
  fn block_edit_wire_format() {
    let edit: BlockEdit = serde_json::from_value(json!({"op": "set_field", "field": "text", "value": "x"})).unwrap();
    assert_eq!(edit, BlockEdit::SetField { field: "text".into(), value: json!("x") });
    let edit: BlockEdit = serde_json::from_value(json!({"op": "add_row"})).unwrap();
    assert_eq!(edit, BlockEdit::AddRow);
    let edit: BlockEdit = serde_json::from_value(json!({"op": "set_cell", "row": 0, "column": 1, "value": "v"})).unwrap();
    assert_eq!(edit, BlockEdit::SetCell { row: 0, column: 1, value: "v".into() });
  }
}
