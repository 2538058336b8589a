//! Category tree.
//!
//! Categories form a forest at most [`MAX_DEPTH`] levels deep: category,
//! subcategory, sub-subcategory. Each node stores only its parent id; there
//! are no denormalized child-name lists to keep in sync.
//!
//! The tree is loaded from the flat rows, asked to validate a change, and the
//! caller persists the result inside the same transaction that loaded it.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::CategoryId;

/// Number of levels: category, subcategory, sub-subcategory.
pub const MAX_DEPTH: u8 = 3;

/// Longest accepted category name, in characters.
pub const MAX_NAME_LENGTH: usize = 80;

/// Errors raised while building or editing the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,
    #[error("category name must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong,
    #[error("category \"{0}\" already exists here")]
    AlreadyExists(String),
    #[error("category {0} not found")]
    NotFound(CategoryId),
    #[error("categories can only be nested {MAX_DEPTH} levels deep")]
    TooDeep,
    #[error("category {0} is part of a cycle")]
    Cycle(CategoryId),
}

/// A stored category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
}

/// A validated insert: what to write for a new node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub parent_id: Option<CategoryId>,
    pub name: String,
    /// 0 for top-level categories.
    pub depth: u8,
}

/// A node with its children, for nested API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBranch {
    pub id: CategoryId,
    pub name: String,
    pub children: Vec<CategoryBranch>,
}

/// In-memory view of all categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, CategoryNode>,
    /// Children per parent (`None` = roots), sorted by name for stable output.
    children: BTreeMap<Option<CategoryId>, Vec<CategoryId>>,
}

impl CategoryTree {
    /// Build the tree from flat rows.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::NotFound`] when a row points at a missing
    /// parent and [`CategoryError::Cycle`] when parents loop.
    pub fn from_nodes(rows: impl IntoIterator<Item = CategoryNode>) -> Result<Self, CategoryError> {
        let nodes: HashMap<CategoryId, CategoryNode> =
            rows.into_iter().map(|node| (node.id, node)).collect();

        let mut children: BTreeMap<Option<CategoryId>, Vec<CategoryId>> = BTreeMap::new();
        for node in nodes.values() {
            if let Some(parent) = node.parent_id
                && !nodes.contains_key(&parent)
            {
                return Err(CategoryError::NotFound(parent));
            }
            children.entry(node.parent_id).or_default().push(node.id);
        }
        for ids in children.values_mut() {
            ids.sort_by_cached_key(|id| {
                let name = nodes.get(id).map(|n| n.name.to_lowercase());
                (name, *id)
            });
        }

        let tree = Self { nodes, children };
        for id in tree.nodes.keys() {
            tree.depth_of(*id)?;
        }
        Ok(tree)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.nodes.get(&id)
    }

    /// Direct children of `parent` (`None` for the top level).
    pub fn children(&self, parent: Option<CategoryId>) -> impl Iterator<Item = &CategoryNode> {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
    }

    /// Zero-based depth of a node.
    ///
    /// # Errors
    ///
    /// [`CategoryError::NotFound`] for unknown ids, [`CategoryError::Cycle`]
    /// if the parent chain never reaches a root.
    pub fn depth_of(&self, id: CategoryId) -> Result<u8, CategoryError> {
        let mut current = self.nodes.get(&id).ok_or(CategoryError::NotFound(id))?;
        let mut depth: usize = 0;
        while let Some(parent) = current.parent_id {
            current = self
                .nodes
                .get(&parent)
                .ok_or(CategoryError::NotFound(parent))?;
            depth += 1;
            if depth > self.nodes.len() {
                return Err(CategoryError::Cycle(id));
            }
        }
        Ok(u8::try_from(depth).unwrap_or(u8::MAX))
    }

    /// Names from the root down to `id`.
    ///
    /// # Errors
    ///
    /// [`CategoryError::NotFound`] for unknown ids.
    pub fn path(&self, id: CategoryId) -> Result<Vec<String>, CategoryError> {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self
                .nodes
                .get(&current)
                .ok_or(CategoryError::NotFound(current))?;
            names.push(node.name.clone());
            cursor = node.parent_id;
            if names.len() > self.nodes.len() {
                return Err(CategoryError::Cycle(id));
            }
        }
        names.reverse();
        Ok(names)
    }

    /// `id` and every descendant, parents before children.
    ///
    /// # Errors
    ///
    /// [`CategoryError::NotFound`] for unknown ids.
    pub fn subtree(&self, id: CategoryId) -> Result<Vec<CategoryId>, CategoryError> {
        if !self.nodes.contains_key(&id) {
            return Err(CategoryError::NotFound(id));
        }
        let mut out = vec![id];
        let mut next = 0;
        while let Some(current) = out.get(next).copied() {
            if let Some(kids) = self.children.get(&Some(current)) {
                out.extend(kids.iter().copied());
            }
            next += 1;
        }
        Ok(out)
    }

    /// Check that `name` can be added under `parent`.
    ///
    /// # Errors
    ///
    /// Rejects blank or overlong names, unknown parents, nesting beyond
    /// [`MAX_DEPTH`], and names that already exist among the parent's
    /// children (compared case-insensitively).
    pub fn validate_new(
        &self,
        parent: Option<CategoryId>,
        name: &str,
    ) -> Result<NewCategory, CategoryError> {
        let name = normalize_name(name)?;

        let depth = match parent {
            Some(parent_id) => self.depth_of(parent_id)?.saturating_add(1),
            None => 0,
        };
        if depth >= MAX_DEPTH {
            return Err(CategoryError::TooDeep);
        }

        self.ensure_unique_sibling(parent, &name, None)?;

        Ok(NewCategory {
            parent_id: parent,
            name,
            depth,
        })
    }

    /// Check that node `id` can be renamed to `name`.
    ///
    /// # Errors
    ///
    /// Same name rules as [`validate_new`](Self::validate_new); the node's own
    /// current name does not count as a clash.
    pub fn validate_rename(&self, id: CategoryId, name: &str) -> Result<String, CategoryError> {
        let node = self.nodes.get(&id).ok_or(CategoryError::NotFound(id))?;
        let name = normalize_name(name)?;
        self.ensure_unique_sibling(node.parent_id, &name, Some(id))?;
        Ok(name)
    }

    /// The whole forest as nested branches.
    #[must_use]
    pub fn nested(&self) -> Vec<CategoryBranch> {
        self.branches(None)
    }

    /// Ids of `id` and its descendants as a set, for filtering products.
    ///
    /// # Errors
    ///
    /// [`CategoryError::NotFound`] for unknown ids.
    pub fn subtree_set(&self, id: CategoryId) -> Result<HashSet<CategoryId>, CategoryError> {
        self.subtree(id).map(|ids| ids.into_iter().collect())
    }

    fn branches(&self, parent: Option<CategoryId>) -> Vec<CategoryBranch> {
        self.children(parent)
            .map(|node| CategoryBranch {
                id: node.id,
                name: node.name.clone(),
                children: self.branches(Some(node.id)),
            })
            .collect()
    }

    fn ensure_unique_sibling(
        &self,
        parent: Option<CategoryId>,
        name: &str,
        except: Option<CategoryId>,
    ) -> Result<(), CategoryError> {
        let wanted = name.to_lowercase();
        let clash = self
            .children(parent)
            .filter(|sibling| Some(sibling.id) != except)
            .any(|sibling| sibling.name.to_lowercase() == wanted);
        if clash {
            return Err(CategoryError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }
}

fn normalize_name(name: &str) -> Result<String, CategoryError> {
    let trimmed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        return Err(CategoryError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CategoryError::NameTooLong);
    }
    Ok(trimmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn node(id: i32, parent: Option<i32>, name: &str) -> CategoryNode {
        CategoryNode {
            id: CategoryId::new(id),
            parent_id: parent.map(CategoryId::new),
            name: name.to_string(),
        }
    }

    fn sample() -> CategoryTree {
        CategoryTree::from_nodes([
            node(1, None, "Motors"),
            node(2, Some(1), "Reloadable"),
            node(3, Some(2), "29mm"),
            node(4, None, "Recovery"),
            node(5, Some(4), "Parachutes"),
            node(6, Some(1), "Single use"),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_sibling_is_rejected_case_insensitively() {
        let tree = sample();
        let err = tree
            .validate_new(Some(CategoryId::new(1)), "  reloadable ")
            .unwrap_err();
        assert_eq!(err, CategoryError::AlreadyExists("reloadable".to_string()));
    }

    #[test]
    fn test_same_name_under_other_parent_is_fine() {
        let tree = sample();
        let new = tree
            .validate_new(Some(CategoryId::new(4)), "Reloadable")
            .unwrap();
        assert_eq!(new.depth, 1);
        assert_eq!(new.parent_id, Some(CategoryId::new(4)));
    }

    #[test]
    fn test_depth_is_limited_to_sub_subcategories() {
        let tree = sample();
        assert_eq!(
            tree.validate_new(Some(CategoryId::new(3)), "Long burn"),
            Err(CategoryError::TooDeep)
        );
        assert_eq!(
            tree.validate_new(Some(CategoryId::new(2)), "38mm").unwrap().depth,
            2
        );
    }

    #[test]
    fn test_blank_names_and_unknown_parents() {
        let tree = sample();
        assert_eq!(tree.validate_new(None, "   "), Err(CategoryError::EmptyName));
        assert_eq!(
            tree.validate_new(Some(CategoryId::new(99)), "Kits"),
            Err(CategoryError::NotFound(CategoryId::new(99)))
        );
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(tree.validate_new(None, &long), Err(CategoryError::NameTooLong));
    }

    #[test]
    fn test_rename_ignores_own_name_but_not_siblings() {
        let tree = sample();
        assert_eq!(
            tree.validate_rename(CategoryId::new(2), "RELOADABLE").unwrap(),
            "RELOADABLE"
        );
        assert!(matches!(
            tree.validate_rename(CategoryId::new(2), "single use"),
            Err(CategoryError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_subtree_and_path() {
        let tree = sample();
        let mut ids = tree.subtree(CategoryId::new(1)).unwrap();
        ids.sort();
        assert_eq!(
            ids,
            vec![
                CategoryId::new(1),
                CategoryId::new(2),
                CategoryId::new(3),
                CategoryId::new(6)
            ]
        );
        assert_eq!(
            tree.path(CategoryId::new(3)).unwrap(),
            vec!["Motors", "Reloadable", "29mm"]
        );
    }

    #[test]
    fn test_nested_is_sorted_by_name() {
        let tree = sample();
        let nested = tree.nested();
        let names: Vec<_> = nested.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Motors", "Recovery"]);
        let motors: Vec<_> = nested[0].children.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(motors, vec!["Reloadable", "Single use"]);
    }

    #[test]
    fn test_orphans_and_cycles_are_rejected() {
        assert_eq!(
            CategoryTree::from_nodes([node(1, Some(7), "Lost")]).unwrap_err(),
            CategoryError::NotFound(CategoryId::new(7))
        );
        assert!(matches!(
            CategoryTree::from_nodes([node(1, Some(2), "A"), node(2, Some(1), "B")]),
            Err(CategoryError::Cycle(_))
        ));
    }
}
