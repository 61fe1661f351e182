//! Ownership-tree builder.
//!
//! Classifies every foreign key as a *composition* or a *reference*,
//! selects exactly one dominant composition per child table, and
//! assembles the dominant edges into a forest spanning every table.

use std::collections::HashSet;

use crate::error::{DbEditorError, Result};
use crate::graph::dag::is_composition;
use crate::schema::types::{Relationship, Schema};

/// A dominant composition edge: `child` is owned by `parent` through
/// `relationship`.
#[derive(Debug, Clone)]
pub struct OwnershipEdge {
    pub child: String,
    pub parent: String,
    pub relationship: Relationship,
}

/// The forest of dominant composition edges spanning every table in a
/// schema, plus the alphabetically-sorted list of root tables.
#[derive(Debug, Clone)]
pub struct OwnershipTree {
    /// One entry per child table that has a dominant parent.
    edges: Vec<OwnershipEdge>,
    /// Tables with no dominant parent, sorted alphabetically.
    roots: Vec<String>,
}

impl OwnershipTree {
    /// Build the ownership tree for a schema. Deterministic.
    pub fn build(schema: &Schema) -> Result<Self> {
        Self::build_with_overrides(schema, &[])
    }

    /// Build the ownership tree, letting `overrides` (child_table,
    /// parent_table pairs, from `db-editor.toml`'s `[graph]
    /// dominance_overrides`) pin the dominant composition for a
    /// multi-parent child instead of the arity/alphabetical tie-break.
    /// An override naming a parent that isn't a valid composition
    /// candidate for that child, or that would create a cycle, is
    /// ignored and the default tie-break applies.
    pub fn build_with_overrides(schema: &Schema, overrides: &[(String, String)]) -> Result<Self> {
        // child_table -> candidate compositions, lowest arity first then
        // alphabetically-earliest parent, i.e. already in tie-break order.
        let mut candidates: indexmap::IndexMap<String, Vec<Relationship>> =
            indexmap::IndexMap::new();
        for table_name in schema.tables.keys() {
            candidates.insert(table_name.clone(), Vec::new());
        }
        for rel in &schema.relationships {
            if is_composition(rel) {
                candidates
                    .entry(rel.from_table.clone())
                    .or_default()
                    .push(rel.clone());
            }
        }
        for list in candidates.values_mut() {
            list.sort_by(|a, b| a.arity().cmp(&b.arity()).then_with(|| a.to_table.cmp(&b.to_table)));
        }

        let override_parent: indexmap::IndexMap<&str, &str> =
            overrides.iter().map(|(c, p)| (c.as_str(), p.as_str())).collect();

        let mut edges: Vec<OwnershipEdge> = Vec::new();
        let mut parent_of: indexmap::IndexMap<String, String> = indexmap::IndexMap::new();

        for (child, rels) in &candidates {
            if rels.is_empty() {
                continue;
            }
            let mut ordered: Vec<&Relationship> = Vec::with_capacity(rels.len());
            if let Some(&preferred_parent) = override_parent.get(child.as_str()) {
                ordered.extend(rels.iter().filter(|r| r.to_table == preferred_parent));
                ordered.extend(rels.iter().filter(|r| r.to_table != preferred_parent));
            } else {
                ordered.extend(rels.iter());
            }

            let mut chosen = None;
            for rel in ordered {
                if would_create_cycle(&parent_of, child, &rel.to_table) {
                    continue;
                }
                chosen = Some(rel.clone());
                break;
            }
            match chosen {
                Some(rel) => {
                    parent_of.insert(child.clone(), rel.to_table.clone());
                    edges.push(OwnershipEdge {
                        child: child.clone(),
                        parent: rel.to_table.clone(),
                        relationship: rel,
                    });
                }
                None => {
                    return Err(DbEditorError::CyclicOwnership {
                        table: child.clone(),
                    });
                }
            }
        }

        let owned: HashSet<&str> = parent_of.keys().map(|s| s.as_str()).collect();
        let mut roots: Vec<String> = schema
            .tables
            .keys()
            .filter(|t| !owned.contains(t.as_str()))
            .cloned()
            .collect();
        roots.sort();

        Ok(Self { edges, roots })
    }

    /// Root tables (no dominant parent), alphabetically sorted.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// The dominant edge owning `child`, if any.
    pub fn parent_edge(&self, child: &str) -> Option<&OwnershipEdge> {
        self.edges.iter().find(|e| e.child == child)
    }

    /// Dominant edges whose parent is `parent`, in schema extraction order.
    pub fn children_of(&self, parent: &str) -> impl Iterator<Item = &OwnershipEdge> + '_ {
        let parent = parent.to_string();
        self.edges.iter().filter(move |e| e.parent == parent)
    }

    pub fn edges(&self) -> &[OwnershipEdge] {
        &self.edges
    }

    /// Plain-text diagnostic dump (not used by nest/flatten/diff/order).
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str("roots: ");
        out.push_str(&self.roots.join(", "));
        out.push('\n');
        for edge in &self.edges {
            out.push_str(&format!(
                "  {} -> {} (via {})\n",
                edge.child, edge.parent, edge.relationship.id
            ));
        }
        out
    }
}

/// Would choosing `parent` as `child`'s dominant parent create a cycle in
/// the forest-so-far? Walk the existing dominant-parent chain starting at
/// `parent`; a cycle exists iff that walk reaches `child`.
fn would_create_cycle(
    parent_of: &indexmap::IndexMap<String, String>,
    child: &str,
    parent: &str,
) -> bool {
    let mut current = parent.to_string();
    let mut seen = HashSet::new();
    loop {
        if current == child {
            return true;
        }
        if !seen.insert(current.clone()) {
            // Already-broken cycle elsewhere in the forest-so-far; shouldn't
            // happen since every step here only ever adds acyclic edges, but
            // guard against infinite loop regardless.
            return false;
        }
        match parent_of.get(&current) {
            Some(next) => current = next.clone(),
            None => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ForeignKeyAction, Table};

    fn rel(id: &str, from: &str, to: &str, action: ForeignKeyAction) -> Relationship {
        Relationship {
            id: id.to_string(),
            from_table: from.to_string(),
            from_columns: vec!["parent_id".to_string()],
            to_table: to.to_string(),
            to_columns: vec!["id".to_string()],
            on_delete: action,
            on_update: ForeignKeyAction::NoAction,
        }
    }

    fn schema_with(tables: &[&str], rels: Vec<Relationship>) -> Schema {
        let mut schema = Schema::new();
        for t in tables {
            schema.tables.insert(t.to_string(), Table::new(t.to_string()));
        }
        schema.relationships = rels;
        schema
    }

    #[test]
    fn simple_chain_is_ordered_parent_to_child() {
        let schema = schema_with(
            &["organization", "project", "task"],
            vec![
                rel("fk1", "project", "organization", ForeignKeyAction::Cascade),
                rel("fk2", "task", "project", ForeignKeyAction::Cascade),
            ],
        );
        let tree = OwnershipTree::build(&schema).unwrap();
        assert_eq!(tree.roots(), &["organization".to_string()]);
        assert_eq!(tree.parent_edge("project").unwrap().parent, "organization");
        assert_eq!(tree.parent_edge("task").unwrap().parent, "project");
    }

    #[test]
    fn self_reference_does_not_create_tree_edge() {
        let schema = schema_with(
            &["category"],
            vec![rel(
                "fk_parent",
                "category",
                "category",
                ForeignKeyAction::Cascade,
            )],
        );
        let tree = OwnershipTree::build(&schema).unwrap();
        assert!(tree.parent_edge("category").is_none());
        assert_eq!(tree.roots(), &["category".to_string()]);
    }

    #[test]
    fn multi_parent_tie_break_prefers_lower_arity_then_alphabetical() {
        let mut single_col = rel("fk_b", "membership", "beta", ForeignKeyAction::Cascade);
        single_col.from_columns = vec!["beta_id".to_string()];
        let mut composite = rel("fk_a", "membership", "alpha", ForeignKeyAction::Cascade);
        composite.from_columns = vec!["alpha_id_1".to_string(), "alpha_id_2".to_string()];
        composite.to_columns = vec!["id1".to_string(), "id2".to_string()];

        let schema = schema_with(
            &["alpha", "beta", "membership"],
            vec![composite, single_col],
        );
        let tree = OwnershipTree::build(&schema).unwrap();
        // lower arity (beta, arity 1) wins over composite (alpha, arity 2)
        assert_eq!(tree.parent_edge("membership").unwrap().parent, "beta");
    }

    #[test]
    fn multi_parent_tie_break_prefers_alphabetical_when_arity_ties() {
        let schema = schema_with(
            &["alpha", "beta", "membership"],
            vec![
                rel("fk_b", "membership", "beta", ForeignKeyAction::Cascade),
                rel("fk_a", "membership", "alpha", ForeignKeyAction::Cascade),
            ],
        );
        let tree = OwnershipTree::build(&schema).unwrap();
        assert_eq!(tree.parent_edge("membership").unwrap().parent, "alpha");
    }

    #[test]
    fn dominance_override_pins_the_non_default_parent() {
        let schema = schema_with(
            &["alpha", "beta", "membership"],
            vec![
                rel("fk_b", "membership", "beta", ForeignKeyAction::Cascade),
                rel("fk_a", "membership", "alpha", ForeignKeyAction::Cascade),
            ],
        );
        // Default tie-break would pick "alpha" (alphabetically first); override to "beta".
        let tree = OwnershipTree::build_with_overrides(&schema, &[("membership".to_string(), "beta".to_string())]).unwrap();
        assert_eq!(tree.parent_edge("membership").unwrap().parent, "beta");
    }

    #[test]
    fn dominance_override_naming_unrelated_parent_is_ignored() {
        let schema = schema_with(
            &["alpha", "beta", "membership"],
            vec![
                rel("fk_b", "membership", "beta", ForeignKeyAction::Cascade),
                rel("fk_a", "membership", "alpha", ForeignKeyAction::Cascade),
            ],
        );
        let tree = OwnershipTree::build_with_overrides(&schema, &[("membership".to_string(), "gamma".to_string())]).unwrap();
        assert_eq!(tree.parent_edge("membership").unwrap().parent, "alpha");
    }

    #[test]
    fn mutual_composition_cycle_fails() {
        let schema = schema_with(
            &["table_a", "table_b"],
            vec![
                rel("fk_ab", "table_a", "table_b", ForeignKeyAction::Cascade),
                rel("fk_ba", "table_b", "table_a", ForeignKeyAction::Cascade),
            ],
        );
        let result = OwnershipTree::build(&schema);
        assert!(matches!(result, Err(DbEditorError::CyclicOwnership { .. })));
    }

    #[test]
    fn reference_contributes_no_edge() {
        let schema = schema_with(
            &["order_row", "customer"],
            vec![rel(
                "fk_customer",
                "order_row",
                "customer",
                ForeignKeyAction::Restrict,
            )],
        );
        let tree = OwnershipTree::build(&schema).unwrap();
        assert!(tree.parent_edge("order_row").is_none());
        let mut roots = tree.roots().to_vec();
        roots.sort();
        assert_eq!(roots, vec!["customer".to_string(), "order_row".to_string()]);
    }
}
