//! Document: the ordered block list forming one post body, and the list
//! operations the editor performs on it.
//!
//! All operations are index-based and return a new `Document`; the caller's
//! copy is never mutated.

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockType};
use crate::block_editor::{self, BlockEdit};
use crate::error::EditError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Vec<Block>);

impl Document {
  pub fn new() -> Self {
    Self(Vec::new())
  }

  pub fn blocks(&self) -> &[Block] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&Block> {
    self.0.get(index)
  }

  /// Append at the end. Insertion is always at the end.
  pub fn insert(&self, block: Block) -> Document {
    let mut blocks = self.0.clone();
    blocks.push(block);
    Document(blocks)
  }

  pub fn delete_at(&self, index: usize) -> Result<Document, EditError> {
    self.check(index)?;
    let mut blocks = self.0.clone();
    blocks.remove(index);
    Ok(Document(blocks))
  }

  /// Swap `index` with its predecessor. Index 0 is left where it is.
  pub fn move_up(&self, index: usize) -> Result<Document, EditError> {
    if index == 0 {
      return Ok(self.clone());
    }
    self.check(index)?;
    let mut blocks = self.0.clone();
    blocks.swap(index - 1, index);
    Ok(Document(blocks))
  }

  /// Swap `index` with its successor. The last index is left where it is.
  pub fn move_down(&self, index: usize) -> Result<Document, EditError> {
    self.check(index)?;
    if index + 1 == self.len() {
      return Ok(self.clone());
    }
    let mut blocks = self.0.clone();
    blocks.swap(index, index + 1);
    Ok(Document(blocks))
  }

  pub fn replace_at(&self, index: usize, block: Block) -> Result<Document, EditError> {
    self.check(index)?;
    let mut blocks = self.0.clone();
    blocks[index] = block;
    Ok(Document(blocks))
  }

  /// Run a block edit on the block at `index` and put the result back.
  pub fn edit_block(&self, index: usize, edit: &BlockEdit) -> Result<Document, EditError> {
    let current = self.0.get(index).ok_or_else(|| EditError::out_of_range(index, self.len()))?;
    let updated = block_editor::apply(current, edit)?;
    self.replace_at(index, updated)
  }

  fn check(&self, index: usize) -> Result<(), EditError> {
    if index < self.len() {
      Ok(())
    } else {
      Err(EditError::out_of_range(index, self.len()))
    }
  }
}

impl From<Vec<Block>> for Document {
  fn from(blocks: Vec<Block>) -> Self {
    Document(blocks)
  }
}

/// One document-level edit, as sent by the console.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DocumentOp {
  /// Append a full block.
  Insert { block: Block },
  /// Append the registry default for a type.
  InsertDefault {
    #[serde(rename = "blockType")]
    block_type: BlockType,
  },
  DeleteAt { index: usize },
  MoveUp { index: usize },
  MoveDown { index: usize },
  ReplaceAt { index: usize, block: Block },
  EditBlock { index: usize, edit: BlockEdit },
}

impl DocumentOp {
  pub fn apply(&self, doc: &Document) -> Result<Document, EditError> {
    match self {
      DocumentOp::Insert { block } => Ok(doc.insert(block.clone())),
      DocumentOp::InsertDefault { block_type } => Ok(doc.insert(Block::default_for(*block_type))),
      DocumentOp::DeleteAt { index } => doc.delete_at(*index),
      DocumentOp::MoveUp { index } => doc.move_up(*index),
      DocumentOp::MoveDown { index } => doc.move_down(*index),
      DocumentOp::ReplaceAt { index, block } => doc.replace_at(*index, block.clone()),
      DocumentOp::EditBlock { index, edit } => doc.edit_block(*index, edit),
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      DocumentOp::Insert { .. } => "insert",
      DocumentOp::InsertDefault { .. } => "insert_default",
      DocumentOp::DeleteAt { .. } => "delete_at",
      DocumentOp::MoveUp { .. } => "move_up",
      DocumentOp::MoveDown { .. } => "move_down",
      DocumentOp::ReplaceAt { .. } => "replace_at",
      DocumentOp::EditBlock { .. } => "edit_block",
    }
  }
}
