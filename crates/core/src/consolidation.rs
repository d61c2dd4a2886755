//! Pure consolidation logic: resolving a list's line items into purchase
//! list entries and rolling the entries up into aggregates. The store layer
//! wraps this in a transaction and persists the result.

use rust_decimal::Decimal;

use crate::comparison::resolve_winner;
use crate::domain::list_item::{ListItem, Recommendation};
use crate::domain::purchase_list::{vendor_bucket_add, VendorCost};
use crate::money::sum_fixed;

/// One purchase-list entry derived from a resolved line item: either an
/// anchored item bought as-is, or a comparison group's winner paired with
/// the alternative it beat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub selected: ListItem,
    pub unselected: Option<ListItem>,
    pub is_anchored: bool,
    pub recommendation: Option<Recommendation>,
}

/// Walk a list's items and produce the entries a purchase list is built
/// from. Anchored items snapshot directly. A base group contributes an
/// entry only once it has a winner; the unselected side is the base when a
/// member won, or the first member when the base won. Free items and
/// unresolved groups contribute nothing.
pub fn resolve_entries(items: &[ListItem]) -> Vec<ResolvedEntry> {
    let mut entries = Vec::new();

    for item in items {
        if item.is_anchored {
            entries.push(ResolvedEntry {
                selected: item.clone(),
                unselected: None,
                is_anchored: true,
                recommendation: item.recommendation.clone(),
            });
            continue;
        }

        if !item.is_base_product || item.comparison_products.is_empty() {
            continue;
        }

        let Some(winner_id) = resolve_winner(item) else {
            continue;
        };

        let (selected, unselected) = if winner_id == item.id {
            (item.clone(), item.comparison_products.first().cloned())
        } else {
            match item.comparison_products.iter().find(|member| member.id == winner_id) {
                Some(winner) => (winner.clone(), Some(strip_members(item))),
                None => continue,
            }
        };

        entries.push(ResolvedEntry {
            selected,
            unselected,
            is_anchored: false,
            recommendation: item.recommendation.clone(),
        });
    }

    entries
}

// Snapshots of the unselected base must not drag the whole group along.
fn strip_members(base: &ListItem) -> ListItem {
    let mut flat = base.clone();
    flat.comparison_products = Vec::new();
    flat
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub total_amount: Decimal,
    pub unselected_total_amount: Decimal,
    pub additional_cost: Vec<VendorCost>,
}

/// Roll entries up into the purchase list's running totals. Both sides of
/// every entry feed the per-vendor buckets, matching how incremental
/// add/remove maintains them.
pub fn aggregate(entries: &[ResolvedEntry]) -> Aggregates {
    let mut totals = Aggregates::default();

    for entry in entries {
        totals.total_amount = sum_fixed(totals.total_amount, entry.selected.total_price);
        vendor_bucket_add(
            &mut totals.additional_cost,
            &entry.selected.vendor,
            entry.selected.total_price,
        );

        if let Some(unselected) = &entry.unselected {
            totals.unselected_total_amount =
                sum_fixed(totals.unselected_total_amount, unselected.total_price);
            vendor_bucket_add(
                &mut totals.additional_cost,
                &unselected.vendor,
                unselected.total_price,
            );
        }
    }

    totals
}
