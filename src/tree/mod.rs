//! Resource tree
//!
//! Indexes a decoded resource forest into a flat arena with parent and depth
//! links. Nodes are addressed by index; the parent link is an index too, so
//! the structure has no ownership cycles and ancestor walks are O(depth).

use crate::course::{DecodedNode, ResourceKind, ResourceSubtype};

/// Arena index of a node within its [`ResourceTree`].
pub type NodeIdx = usize;

/// One indexed resource node.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    /// Absent for presentational placeholders; those can never be synced.
    pub id: Option<String>,
    pub name: String,
    pub size: Option<u64>,
    pub kind: ResourceKind,
    pub subtype: Option<ResourceSubtype>,
    /// Owning course code. `None` only for synthetic header placeholders.
    pub course: Option<String>,
    /// Children in document order.
    pub children: Vec<NodeIdx>,
    /// Back-link for path composition; never an owning reference.
    pub parent: Option<NodeIdx>,
    /// 1 for top-level children of a course, incrementing per nesting level.
    pub depth: usize,
}

impl ResourceNode {
    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }
}

/// Indexed, traversable form of a course's resource forest.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    nodes: Vec<ResourceNode>,
    roots: Vec<NodeIdx>,
}

impl ResourceTree {
    /// Index a decoded forest for `course`.
    ///
    /// Assigns course, parent and depth to every node depth-first, starting
    /// at depth 1 for roots. Total over well-formed input; malformed payloads
    /// fail earlier, at decode time.
    pub fn build(roots: Vec<DecodedNode>, course: &str) -> Self {
        let mut tree = ResourceTree::default();
        for decoded in roots {
            let idx = tree.insert(decoded, None, 1, course);
            tree.roots.push(idx);
        }
        tree
    }

    fn insert(
        &mut self,
        decoded: DecodedNode,
        parent: Option<NodeIdx>,
        depth: usize,
        course: &str,
    ) -> NodeIdx {
        let DecodedNode {
            id,
            name,
            size,
            kind,
            subtype,
            children,
        } = decoded;
        let idx = self.nodes.len();
        self.nodes.push(ResourceNode {
            id,
            name,
            size,
            kind,
            subtype,
            course: Some(course.to_string()),
            children: Vec::new(),
            parent,
            depth,
        });
        if let Some(children) = children {
            let indexed: Vec<NodeIdx> = children
                .into_iter()
                .map(|child| self.insert(child, Some(idx), depth + 1, course))
                .collect();
            self.nodes[idx].children = indexed;
        }
        idx
    }

    pub fn node(&self, idx: NodeIdx) -> &ResourceNode {
        &self.nodes[idx]
    }

    pub fn get(&self, idx: NodeIdx) -> Option<&ResourceNode> {
        self.nodes.get(idx)
    }

    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ancestor chain of `idx`, nearest the course first, excluding the node
    /// itself.
    pub fn ancestors(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes[idx].parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.nodes[parent].parent;
        }
        chain.reverse();
        chain
    }

    /// Pre-order traversal: the node itself, then each child subtree in
    /// document order. Deterministic across repeated calls.
    pub fn flatten(&self, idx: NodeIdx) -> Vec<NodeIdx> {
        let mut out = vec![idx];
        for &child in &self.nodes[idx].children {
            out.extend(self.flatten(child));
        }
        out
    }

    /// Pre-order traversal over every root.
    pub fn flatten_all(&self) -> Vec<NodeIdx> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            out.extend(self.flatten(root));
        }
        out
    }

    /// Total resource count for the course this tree was built for.
    pub fn resource_count(&self) -> usize {
        self.flatten_all().len()
    }

    /// Resolve a node by its chain of display names starting at a root.
    ///
    /// Sibling name collisions resolve to the first match in document order.
    pub fn find_by_path(&self, segments: &[&str]) -> Option<NodeIdx> {
        let (first, rest) = segments.split_first()?;
        let mut cursor = self
            .roots
            .iter()
            .copied()
            .find(|&idx| self.nodes[idx].name == *first)?;
        for segment in rest {
            cursor = self.nodes[cursor]
                .children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].name == *segment)?;
        }
        Some(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(payload: &str) -> Vec<DecodedNode> {
        serde_json::from_str(payload).unwrap()
    }

    fn sample_forest() -> Vec<DecodedNode> {
        decode(
            r#"[
                {"id": "f1", "name": "syllabus.pdf", "size": 1024, "type": "file", "subtype": "pdf"},
                {"id": "d1", "name": "slides", "type": "folder", "children": [
                    {"id": "f2", "name": "week1.pdf", "size": 2048, "type": "file", "subtype": "pdf"}
                ]}
            ]"#,
        )
    }

    #[test]
    fn test_depth_and_parent_assignment() {
        let tree = ResourceTree::build(sample_forest(), "CS101");
        let syllabus = tree.find_by_path(&["syllabus.pdf"]).unwrap();
        let slides = tree.find_by_path(&["slides"]).unwrap();
        let week1 = tree.find_by_path(&["slides", "week1.pdf"]).unwrap();

        assert_eq!(tree.node(syllabus).depth, 1);
        assert_eq!(tree.node(slides).depth, 1);
        assert_eq!(tree.node(week1).depth, 2);
        assert_eq!(tree.node(week1).parent, Some(slides));
        assert_eq!(tree.node(syllabus).parent, None);
        assert_eq!(tree.node(week1).course.as_deref(), Some("CS101"));
    }

    #[test]
    fn test_flatten_preorder() {
        let tree = ResourceTree::build(sample_forest(), "CS101");
        let slides = tree.find_by_path(&["slides"]).unwrap();
        let flat = tree.flatten(slides);
        let names: Vec<&str> = flat.iter().map(|&i| tree.node(i).name.as_str()).collect();
        assert_eq!(names, vec!["slides", "week1.pdf"]);
    }

    #[test]
    fn test_resource_count() {
        let tree = ResourceTree::build(sample_forest(), "CS101");
        assert_eq!(tree.resource_count(), 3);
    }

    #[test]
    fn test_placeholder_detection() {
        let tree = ResourceTree::build(
            decode(r#"[{"name": "Header", "type": "course"}]"#),
            "CS101",
        );
        assert!(tree.node(tree.roots()[0]).is_placeholder());
    }

    #[test]
    fn test_ancestors_root_first() {
        let tree = ResourceTree::build(
            decode(
                r#"[{"id": "a", "name": "a", "type": "folder", "children": [
                    {"id": "b", "name": "b", "type": "folder", "children": [
                        {"id": "c", "name": "c", "type": "file"}
                    ]}
                ]}]"#,
            ),
            "X",
        );
        let c = tree.find_by_path(&["a", "b", "c"]).unwrap();
        let names: Vec<&str> = tree
            .ancestors(c)
            .iter()
            .map(|&i| tree.node(i).name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_find_by_path_misses() {
        let tree = ResourceTree::build(sample_forest(), "CS101");
        assert!(tree.find_by_path(&["slides", "week2.pdf"]).is_none());
        assert!(tree.find_by_path(&[]).is_none());
    }
}
