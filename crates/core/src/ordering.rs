//! Display-order reassignment for drag-and-drop lists.
//!
//! Hero slides, carousel images and product labels each carry an integer
//! `display_order`. The admin sends the complete list of ids in the new
//! order; [`reorder`] checks it against what is stored and works out which
//! rows actually need a write.

use core::fmt::Display;
use core::hash::Hash;
use std::collections::HashSet;

/// Rejected reorder requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("id {0} appears more than once")]
    Duplicate(String),
    #[error("id {0} does not exist")]
    Unknown(String),
    #[error("id {0} is missing from the new order")]
    Missing(String),
    #[error("position {index} is out of range for {len} items")]
    OutOfRange { index: usize, len: usize },
}

/// A row whose `display_order` must change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderChange<T> {
    pub id: T,
    pub display_order: i32,
}

/// Assign orders `0..n` following `requested` and return the rows that moved.
///
/// `current` holds the stored `(id, display_order)` pairs in any order.
/// `requested` must name every stored id exactly once.
///
/// # Errors
///
/// Returns [`OrderingError`] when `requested` repeats an id, names an id not
/// in `current`, or leaves one out.
pub fn reorder<T>(current: &[(T, i32)], requested: &[T]) -> Result<Vec<OrderChange<T>>, OrderingError>
where
    T: Copy + Eq + Hash + Display,
{
    let stored: std::collections::HashMap<T, i32> = current.iter().copied().collect();

    let mut seen = HashSet::with_capacity(requested.len());
    for id in requested {
        if !seen.insert(*id) {
            return Err(OrderingError::Duplicate(id.to_string()));
        }
        if !stored.contains_key(id) {
            return Err(OrderingError::Unknown(id.to_string()));
        }
    }
    if let Some((missing, _)) = current.iter().find(|(id, _)| !seen.contains(id)) {
        return Err(OrderingError::Missing(missing.to_string()));
    }

    Ok(requested
        .iter()
        .zip(0_i32..)
        .filter(|(id, order)| stored.get(*id) != Some(order))
        .map(|(id, display_order)| OrderChange {
            id: *id,
            display_order,
        })
        .collect())
}

/// Move the item at `from` to position `to`, shifting the ones in between.
///
/// # Errors
///
/// Returns [`OrderingError::OutOfRange`] if either position is past the end.
pub fn move_item<T: Clone>(ids: &[T], from: usize, to: usize) -> Result<Vec<T>, OrderingError> {
    let len = ids.len();
    for index in [from, to] {
        if index >= len {
            return Err(OrderingError::OutOfRange { index, len });
        }
    }

    let mut moved = ids.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Ok(moved)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::HeroSlideId;

    fn ids(raw: &[i32]) -> Vec<HeroSlideId> {
        raw.iter().copied().map(HeroSlideId::new).collect()
    }

    fn stored() -> Vec<(HeroSlideId, i32)> {
        vec![
            (HeroSlideId::new(1), 0),
            (HeroSlideId::new(2), 1),
            (HeroSlideId::new(3), 2),
            (HeroSlideId::new(4), 3),
        ]
    }

    #[test]
    fn test_only_moved_rows_are_returned() {
        let changes = reorder(&stored(), &ids(&[1, 3, 2, 4])).unwrap();
        assert_eq!(
            changes,
            vec![
                OrderChange {
                    id: HeroSlideId::new(3),
                    display_order: 1
                },
                OrderChange {
                    id: HeroSlideId::new(2),
                    display_order: 2
                },
            ]
        );
    }

    #[test]
    fn test_same_order_is_noop() {
        assert!(reorder(&stored(), &ids(&[1, 2, 3, 4])).unwrap().is_empty());
    }

    #[test]
    fn test_gaps_in_stored_orders_are_closed() {
        let sparse = vec![(HeroSlideId::new(1), 10), (HeroSlideId::new(2), 20)];
        let changes = reorder(&sparse, &ids(&[1, 2])).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].display_order, 0);
        assert_eq!(changes[1].display_order, 1);
    }

    #[test]
    fn test_request_must_be_a_permutation() {
        assert_eq!(
            reorder(&stored(), &ids(&[1, 1, 2, 3])),
            Err(OrderingError::Duplicate("1".to_string()))
        );
        assert_eq!(
            reorder(&stored(), &ids(&[1, 2, 3, 4, 9])),
            Err(OrderingError::Unknown("9".to_string()))
        );
        assert_eq!(
            reorder(&stored(), &ids(&[4, 3, 2])),
            Err(OrderingError::Missing("1".to_string()))
        );
    }

    #[test]
    fn test_move_item() {
        let list = ids(&[1, 2, 3, 4]);
        assert_eq!(move_item(&list, 0, 2).unwrap(), ids(&[2, 3, 1, 4]));
        assert_eq!(move_item(&list, 3, 0).unwrap(), ids(&[4, 1, 2, 3]));
        assert_eq!(move_item(&list, 1, 1).unwrap(), list);
        assert_eq!(
            move_item(&list, 4, 0),
            Err(OrderingError::OutOfRange { index: 4, len: 4 })
        );
    }

    #[test]
    fn test_move_then_reorder() {
        let moved = move_item(&ids(&[1, 2, 3, 4]), 3, 1).unwrap();
        let changes = reorder(&stored(), &moved).unwrap();
        let orders: Vec<_> = changes.iter().map(|c| (c.id.as_i32(), c.display_order)).collect();
        assert_eq!(orders, vec![(4, 1), (2, 2), (3, 3)]);
    }
}
