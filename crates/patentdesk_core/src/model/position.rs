//! Position list rules and the merged positions view.
//!
//! # Responsibility
//! - Define the numbered position slots that carry per-author payment data.
//! - Own the allocation and removal rules for positions.
//! - Build the display view that merges positions with the author map.
//!
//! # Invariants
//! - A patent always keeps at least one position.
//! - A newly added position gets an id strictly greater than every id
//!   currently in use.

use crate::model::author::Author;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier of a position within one patent.
pub type PositionId = u32;

/// One numbered author/payment slot of a patent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    /// Display-only ordinal; not required to equal `id`.
    pub position_number: u32,
    /// Payment amount as a display string; may be empty.
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub pending_amount: String,
    /// Author name denormalized for list display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

impl Position {
    /// The single default position every new patent starts with.
    pub fn placeholder() -> Self {
        Self {
            id: 1,
            position_number: 1,
            amount: String::new(),
            pending_amount: String::new(),
            author_name: None,
        }
    }
}

/// Rule violation while editing the position list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// The last remaining position cannot be removed.
    LastPosition,
    UnknownPosition(PositionId),
}

impl Display for PositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastPosition => write!(f, "a patent must keep at least one position"),
            Self::UnknownPosition(id) => write!(f, "unknown position id {id}"),
        }
    }
}

impl Error for PositionError {}

/// Editable position list enforcing the minimum-one and id-allocation rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionBoard {
    positions: Vec<Position>,
}

impl PositionBoard {
    /// Creates a board holding the single placeholder position.
    pub fn new() -> Self {
        Self {
            positions: vec![Position::placeholder()],
        }
    }

    /// Wraps an existing list, restoring the placeholder when it is empty.
    pub fn from_positions(positions: Vec<Position>) -> Self {
        if positions.is_empty() {
            return Self::new();
        }
        Self { positions }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<Position> {
        self.positions
    }

    /// Adds a position with id strictly greater than the current maximum.
    pub fn add_position(&mut self) -> PositionId {
        let next_id = self
            .positions
            .iter()
            .map(|position| position.id)
            .max()
            .unwrap_or(0)
            + 1;
        let next_number = self
            .positions
            .iter()
            .map(|position| position.position_number)
            .max()
            .unwrap_or(0)
            + 1;
        self.positions.push(Position {
            id: next_id,
            position_number: next_number,
            amount: String::new(),
            pending_amount: String::new(),
            author_name: None,
        });
        next_id
    }

    /// Removes a position; the last remaining position is kept.
    pub fn remove_position(&mut self, id: PositionId) -> Result<(), PositionError> {
        if !self.positions.iter().any(|position| position.id == id) {
            return Err(PositionError::UnknownPosition(id));
        }
        if self.positions.len() == 1 {
            return Err(PositionError::LastPosition);
        }
        self.positions.retain(|position| position.id != id);
        Ok(())
    }

    /// Updates amount fields on one position.
    ///
    /// Returns whether that position already has an assigned author, in
    /// which case the caller should persist the author's amount fields too.
    pub fn set_amounts(
        &mut self,
        id: PositionId,
        amount: &str,
        pending_amount: &str,
    ) -> Result<bool, PositionError> {
        let position = self
            .positions
            .iter_mut()
            .find(|position| position.id == id)
            .ok_or(PositionError::UnknownPosition(id))?;
        position.amount = amount.to_string();
        position.pending_amount = pending_amount.to_string();
        Ok(position.author_name.is_some())
    }

    /// Records an author assignment on the matching position, creating the
    /// position when the id is not present yet.
    pub fn assign_author(&mut self, id: PositionId, author: &Author) {
        match self
            .positions
            .iter_mut()
            .find(|position| position.id == id)
        {
            Some(position) => {
                position.author_name = Some(author.full_name.clone());
            }
            None => {
                let next_number = self
                    .positions
                    .iter()
                    .map(|position| position.position_number)
                    .max()
                    .unwrap_or(0)
                    + 1;
                self.positions.push(Position {
                    id,
                    position_number: next_number,
                    amount: author.amount.clone(),
                    pending_amount: author.pending_amount.clone(),
                    author_name: Some(author.full_name.clone()),
                });
            }
        }
    }
}

impl Default for PositionBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// One row of the merged positions view returned to display callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionView {
    pub id: PositionId,
    pub position_number: u32,
    pub amount: String,
    pub pending_amount: String,
    pub author: Option<Author>,
}

/// Merges the stored position list with the author map.
///
/// Produces one entry per known position id. When no positions exist yet a
/// single placeholder entry is returned.
pub fn build_positions_view(
    positions: &[Position],
    authors: &BTreeMap<PositionId, Author>,
) -> Vec<PositionView> {
    let board = PositionBoard::from_positions(positions.to_vec());
    board
        .positions()
        .iter()
        .map(|position| PositionView {
            id: position.id,
            position_number: position.position_number,
            amount: position.amount.clone(),
            pending_amount: position.pending_amount.clone(),
            author: authors.get(&position.id).cloned(),
        })
        .collect()
}
