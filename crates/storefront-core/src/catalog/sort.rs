//! Base order of a children list.

use std::collections::HashMap;

use super::CatalogNode;

/// Order by explicit index, then record position, then lowercase name.
pub(crate) fn sort_children(ids: &mut [String], nodes: &HashMap<String, CatalogNode>) {
    let mut keyed: Vec<(f64, usize, String, String)> = ids
        .iter()
        .map(|id| match nodes.get(id) {
            Some(node) => (
                node.order_index,
                node.position,
                node.name.to_lowercase(),
                id.clone(),
            ),
            None => (f64::INFINITY, usize::MAX, String::new(), id.clone()),
        })
        .collect();
    keyed.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });
    for (slot, (_, _, _, id)) in ids.iter_mut().zip(keyed) {
        *slot = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, name: &str, order_index: f64, position: usize) -> CatalogNode {
        CatalogNode {
            id: id.to_string(),
            name: name.to_string(),
            price: Some(1.0),
            is_folder: false,
            hierarchy_path: None,
            order_index,
            position,
        }
    }

    #[test]
    fn test_sort_children_uses_index_then_position() {
        let nodes: HashMap<String, CatalogNode> = [
            node("a", "Alpha", 5.0, 0),
            node("b", "beta", 1.0, 3),
            node("c", "Gamma", 1.0, 2),
            node("d", "delta", 0.0, 9),
        ]
        .into_iter()
        .map(|n| (n.id.clone(), n))
        .collect();

        let mut ids: Vec<String> = ["a", "b", "c", "d"].map(String::from).to_vec();
        sort_children(&mut ids, &nodes);
        assert_eq!(ids, vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_sort_children_breaks_ties_by_lowercase_name() {
        let nodes: HashMap<String, CatalogNode> = [node("x", "banana", 1.0, 1), node("y", "Apple", 1.0, 1)]
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();
        let mut ids = vec!["x".to_string(), "y".to_string()];
        sort_children(&mut ids, &nodes);
        assert_eq!(ids, vec!["y", "x"]);
    }

    #[test]
    fn test_sort_children_keeps_fractional_indexes_apart() {
        let nodes: HashMap<String, CatalogNode> = [
            node("late", "Late", 1.9, 0),
            node("early", "Early", 1.2, 1),
            node("first", "First", 0.5, 2),
        ]
        .into_iter()
        .map(|n| (n.id.clone(), n))
        .collect();
        let mut ids: Vec<String> = ["late", "early", "first"].map(String::from).to_vec();
        sort_children(&mut ids, &nodes);
        assert_eq!(ids, vec!["first", "early", "late"]);
    }
}
