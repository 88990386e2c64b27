//! Category model
//!
//! Categories form a tree through `parent_id`. Hierarchy walks happen on a
//! `CategoryArena`, an in-memory index of every category keyed by id, so a
//! corrupted parent chain is detected instead of looping forever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::SeoFields;

/// Separator used by `full_name`
pub const HIERARCHY_SEPARATOR: &str = " > ";

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-friendly slug
    pub slug: String,
    /// Longer description, may be empty
    pub description: String,
    /// Parent category ID
    pub parent_id: Option<i64>,
    /// Promote this category on landing pages
    pub featured: bool,
    /// Position among siblings in menus
    pub sort_order: i32,
    /// Whether the category appears in navigation menus
    pub show_in_menu: bool,
    /// Default layout of the category page
    pub layout: CategoryLayout,
    /// Search and social metadata
    #[serde(default)]
    pub seo: SeoFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new root category. The id is assigned by the database.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            parent_id: None,
            featured: false,
            sort_order: 0,
            show_in_menu: true,
            layout: CategoryLayout::default(),
            seo: SeoFields::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this is a root category (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Page layout for a category listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryLayout {
    #[default]
    Grid,
    List,
    Featured,
}

impl CategoryLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLayout::Grid => "grid",
            CategoryLayout::List => "list",
            CategoryLayout::Featured => "featured",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "grid" => Some(CategoryLayout::Grid),
            "list" => Some(CategoryLayout::List),
            "featured" => Some(CategoryLayout::Featured),
            _ => None,
        }
    }
}

/// Input for creating a new category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCategoryInput {
    /// Display name
    pub name: String,
    /// URL-friendly slug, generated from the name when absent
    pub slug: Option<String>,
    pub description: String,
    /// Parent category ID
    pub parent_id: Option<i64>,
    pub featured: bool,
    pub sort_order: i32,
    /// Defaults to visible
    pub show_in_menu: Option<bool>,
    pub layout: CategoryLayout,
    pub seo: SeoFields,
}

impl CreateCategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// Input for updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` detaches the category into a root
    pub parent_id: Option<Option<i64>>,
    pub featured: Option<bool>,
    pub sort_order: Option<i32>,
    pub show_in_menu: Option<bool>,
    pub layout: Option<CategoryLayout>,
    pub seo: Option<SeoFields>,
}

/// Category with its menu-visible children
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryTree>,
}

impl CategoryTree {
    /// Number of nodes in this subtree, including the root
    pub fn total_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.total_count()).sum::<usize>()
    }
}

/// Category together with the number of live articles filed under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub article_count: i64,
}

/// Failures while walking the category graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("Category {0} is not in the hierarchy")]
    UnknownCategory(i64),
    #[error("Cycle detected in category hierarchy at category {0}")]
    CycleDetected(i64),
}

/// In-memory index of all categories keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CategoryArena {
    nodes: HashMap<i64, Category>,
    // Child ids per parent, ordered by (sort_order, created_at, id)
    children: HashMap<i64, Vec<i64>>,
    roots: Vec<i64>,
}

impl CategoryArena {
    pub fn from_categories(categories: Vec<Category>) -> Self {
        let mut nodes: HashMap<i64, Category> = HashMap::with_capacity(categories.len());
        for category in categories {
            nodes.insert(category.id, category);
        }

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut roots = Vec::new();
        for category in nodes.values() {
            match category.parent_id {
                Some(parent_id) if nodes.contains_key(&parent_id) => {
                    children.entry(parent_id).or_default().push(category.id);
                }
                _ => roots.push(category.id),
            }
        }

        let sort_key = |id: &i64| {
            let c = &nodes[id];
            (c.sort_order, c.created_at, c.id)
        };
        for ids in children.values_mut() {
            ids.sort_by_key(sort_key);
        }
        roots.sort_by_key(sort_key);

        Self {
            nodes,
            children,
            roots,
        }
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.nodes.get(&id)
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<&Category> {
        self.nodes.values().find(|c| c.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ancestors of `id` from the root down to the category itself.
    ///
    /// A parent id missing from the arena ends the walk, so a dangling
    /// reference behaves like a root.
    pub fn resolve_hierarchy(&self, id: i64) -> Result<Vec<&Category>, HierarchyError> {
        let mut current = self.get(id).ok_or(HierarchyError::UnknownCategory(id))?;
        let mut visited = HashSet::new();
        let mut chain = Vec::new();

        loop {
            if !visited.insert(current.id) {
                return Err(HierarchyError::CycleDetected(current.id));
            }
            chain.push(current);
            match current.parent_id.and_then(|parent_id| self.get(parent_id)) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Ancestor names joined with `" > "`, e.g. `Sports > Cricket`
    pub fn full_name(&self, id: i64) -> Result<String, HierarchyError> {
        let names: Vec<&str> = self
            .resolve_hierarchy(id)?
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        Ok(names.join(HIERARCHY_SEPARATOR))
    }

    /// Direct children shown in menus, in menu order
    pub fn list_children(&self, id: i64) -> Vec<&Category> {
        self.children
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|child_id| self.get(*child_id))
                    .filter(|c| c.show_in_menu)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pre-order traversal of `list_children`, excluding `id` itself
    pub fn descendants(&self, id: i64) -> Result<Vec<&Category>, HierarchyError> {
        if !self.nodes.contains_key(&id) {
            return Err(HierarchyError::UnknownCategory(id));
        }

        let mut visited = HashSet::from([id]);
        let mut result = Vec::new();
        let mut stack: Vec<&Category> = self.list_children(id).into_iter().rev().collect();

        while let Some(category) = stack.pop() {
            if !visited.insert(category.id) {
                return Err(HierarchyError::CycleDetected(category.id));
            }
            result.push(category);
            stack.extend(self.list_children(category.id).into_iter().rev());
        }

        Ok(result)
    }

    /// Menu tree of root categories. Nodes trapped in a cycle are unreachable
    /// from any root and are left out.
    pub fn tree(&self) -> Vec<CategoryTree> {
        let mut visited = HashSet::new();
        self.roots
            .iter()
            .filter_map(|id| self.get(*id))
            .filter(|c| c.show_in_menu)
            .filter_map(|root| self.subtree(root, &mut visited))
            .collect()
    }

    fn subtree(&self, category: &Category, visited: &mut HashSet<i64>) -> Option<CategoryTree> {
        if !visited.insert(category.id) {
            return None;
        }
        let children = self
            .list_children(category.id)
            .into_iter()
            .filter_map(|child| self.subtree(child, visited))
            .collect();
        Some(CategoryTree {
            category: category.clone(),
            children,
        })
    }

    /// Whether re-parenting `id` under `new_parent_id` would close a loop
    pub fn would_create_cycle(&self, id: i64, new_parent_id: i64) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(new_parent_id);

        while let Some(current) = cursor {
            if current == id || !visited.insert(current) {
                return true;
            }
            cursor = self.get(current).and_then(|c| c.parent_id);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn category(id: i64, name: &str, parent_id: Option<i64>, sort_order: i32) -> Category {
        let mut c = Category::new(name, name.to_lowercase().replace(' ', "-"));
        c.id = id;
        c.parent_id = parent_id;
        c.sort_order = sort_order;
        c
    }

    fn sports_arena() -> CategoryArena {
        CategoryArena::from_categories(vec![
            category(1, "Sports", None, 0),
            category(2, "Cricket", Some(1), 1),
            category(3, "Football", Some(1), 0),
            category(4, "IPL", Some(2), 0),
            category(5, "Politics", None, 1),
        ])
    }

    #[test]
    fn test_resolve_hierarchy_root_to_self() {
        let arena = sports_arena();
        let names: Vec<&str> = arena
            .resolve_hierarchy(2)
            .unwrap()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Sports", "Cricket"]);
        assert_eq!(arena.full_name(2).unwrap(), "Sports > Cricket");
        assert_eq!(arena.full_name(4).unwrap(), "Sports > Cricket > IPL");
        assert_eq!(arena.full_name(5).unwrap(), "Politics");
    }

    #[test]
    fn test_resolve_hierarchy_unknown_category() {
        let arena = sports_arena();
        assert_eq!(
            arena.resolve_hierarchy(99).unwrap_err(),
            HierarchyError::UnknownCategory(99)
        );
    }

    #[test]
    fn test_resolve_hierarchy_detects_cycle() {
        let arena = CategoryArena::from_categories(vec![
            category(1, "A", Some(3), 0),
            category(2, "B", Some(1), 0),
            category(3, "C", Some(2), 0),
        ]);
        assert!(matches!(
            arena.resolve_hierarchy(1),
            Err(HierarchyError::CycleDetected(_))
        ));
        assert!(matches!(
            arena.descendants(1),
            Err(HierarchyError::CycleDetected(_))
        ));
        assert!(arena.tree().is_empty());
    }

    #[test]
    fn test_list_children_filters_menu_and_orders() {
        let mut hidden = category(6, "Hidden", Some(1), -1);
        hidden.show_in_menu = false;
        let mut categories = vec![
            category(1, "Sports", None, 0),
            category(2, "Cricket", Some(1), 1),
            category(3, "Football", Some(1), 0),
            hidden,
        ];
        // Same order, later creation sorts after
        let mut tennis = category(7, "Tennis", Some(1), 1);
        tennis.created_at = categories[1].created_at + Duration::seconds(5);
        categories.push(tennis);

        let arena = CategoryArena::from_categories(categories);
        let names: Vec<&str> = arena
            .list_children(1)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Football", "Cricket", "Tennis"]);
    }

    #[test]
    fn test_descendants_pre_order() {
        let arena = sports_arena();
        let ids: Vec<i64> = arena.descendants(1).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 4]);
        assert!(arena.descendants(4).unwrap().is_empty());
    }

    #[test]
    fn test_tree_and_dangling_parent() {
        let arena = CategoryArena::from_categories(vec![
            category(1, "Sports", None, 0),
            category(2, "Cricket", Some(1), 0),
            category(3, "Orphan", Some(42), 5),
        ]);
        let tree = arena.tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.name, "Sports");
        assert_eq!(tree[0].total_count(), 2);
        assert_eq!(arena.full_name(3).unwrap(), "Orphan");
    }

    #[test]
    fn test_would_create_cycle() {
        let arena = sports_arena();
        assert!(arena.would_create_cycle(1, 1));
        assert!(arena.would_create_cycle(1, 4));
        assert!(!arena.would_create_cycle(4, 5));
        assert!(!arena.would_create_cycle(5, 2));
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!(CategoryLayout::from_str("LIST"), Some(CategoryLayout::List));
        assert_eq!(CategoryLayout::from_str("masonry"), None);
        assert_eq!(CategoryLayout::default().as_str(), "grid");
    }
}
