//! Comparison-group rules.
//!
//! The persistence layer stores the group membership and three booleans
//! (`is_base_product`, `is_anchored`, `is_selected`). This module projects
//! those flags into an explicit state and guards every transition, so the
//! stores never have to reason about flag combinations directly.

use serde::{Deserialize, Serialize};

use crate::domain::list_item::{ListItem, ListItemId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    InGroup,
    Selected,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    /// No group membership, not anchored.
    Free,
    /// Opted out of comparison entirely; bought as-is.
    Anchored,
    /// Owns a comparison group. The member set may be empty right after the
    /// group is seeded; dissolving the last member flips the item back to
    /// `Free`.
    Base { comparison_ids: Vec<ListItemId>, resolved_winner: Option<ListItemId> },
    /// Referenced by some base's group.
    Member { base_id: ListItemId, status: MemberStatus },
}

/// Project a list item's flags into its state. `base` is the base item
/// whose group contains this item, when there is one.
pub fn item_state(item: &ListItem, base: Option<&ListItem>) -> Result<ItemState, DomainError> {
    if item.is_anchored {
        if item.is_base_product || !item.comparison_products.is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "list item {} is anchored while holding a comparison group",
                item.id.0
            )));
        }
        if item.is_selected {
            return Err(DomainError::InvariantViolation(format!(
                "list item {} is anchored and selected",
                item.id.0
            )));
        }
        return Ok(ItemState::Anchored);
    }

    if !item.is_base_product && !item.comparison_products.is_empty() {
        return Err(DomainError::InvariantViolation(format!(
            "list item {} holds comparison members without the base flag",
            item.id.0
        )));
    }

    if item.is_base_product {
        let resolved_winner = resolve_winner(item);
        return Ok(ItemState::Base {
            comparison_ids: item.comparison_products.iter().map(|member| member.id.clone()).collect(),
            resolved_winner,
        });
    }

    if let Some(base) = base {
        let status = if item.is_selected {
            MemberStatus::Selected
        } else if item.is_rejected {
            MemberStatus::Rejected
        } else {
            MemberStatus::InGroup
        };
        return Ok(ItemState::Member { base_id: base.id.clone(), status });
    }

    if item.is_selected {
        return Err(DomainError::InvariantViolation(format!(
            "list item {} is selected outside any comparison group",
            item.id.0
        )));
    }

    Ok(ItemState::Free)
}

/// The single winner of a base's group: the base itself when selected,
/// otherwise the first selected member.
pub fn resolve_winner(base: &ListItem) -> Option<ListItemId> {
    if base.is_selected {
        return Some(base.id.clone());
    }
    base.comparison_products.iter().find(|member| member.is_selected).map(|member| member.id.clone())
}

/// Anchoring excludes an item from comparison; it is only legal on an item
/// that is neither grouped nor selected.
pub fn ensure_can_toggle_anchor(item: &ListItem) -> Result<(), DomainError> {
    if item.is_base_product || !item.comparison_products.is_empty() {
        return Err(DomainError::AnchorOnGroupedItem);
    }
    if item.is_selected {
        return Err(DomainError::AnchorOnSelectedItem);
    }
    Ok(())
}

pub fn ensure_can_add_comparison(base: &ListItem, comparison: &ListItem) -> Result<(), DomainError> {
    if base.id == comparison.id {
        return Err(DomainError::SelfComparison);
    }
    if base.is_anchored || comparison.is_anchored {
        return Err(DomainError::ComparisonOnAnchoredItem);
    }
    if comparison.is_base_product {
        return Err(DomainError::NestedComparisonGroup);
    }
    Ok(())
}

/// Selection (and rejection) require a live base group containing the
/// toggled item; the base itself counts as a member of its own group.
pub fn ensure_can_toggle_selection(
    base: &ListItem,
    item: &ListItem,
    item_in_group: bool,
) -> Result<(), DomainError> {
    if !base.is_base_product {
        return Err(DomainError::NotABaseProduct);
    }
    if base.is_anchored {
        return Err(DomainError::BaseIsAnchored);
    }
    if item.is_anchored {
        return Err(DomainError::ComparisonOnAnchoredItem);
    }
    if item.id != base.id && !item_in_group {
        return Err(DomainError::NotInComparisonGroup);
    }
    Ok(())
}
