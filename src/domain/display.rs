//! ASCII rendering of the tag forest via termtree.

use termtree::Tree;

use crate::domain::entities::TreeNode;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for TreeNode {
    fn to_tree_string(&self) -> Tree<String> {
        // post-order on an explicit stack: (node, next child, finished leaves)
        let mut stack: Vec<(&TreeNode, usize, Vec<Tree<String>>)> = vec![(self, 0, Vec::new())];
        let mut finished = Tree::new(label(self));
        while let Some((node, next, leaves)) = stack.pop() {
            if let Some(child) = node.children.get(next) {
                stack.push((node, next + 1, leaves));
                stack.push((child, 0, Vec::new()));
                continue;
            }
            let tree = Tree::new(label(node)).with_leaves(leaves);
            match stack.last_mut() {
                Some((_, _, siblings)) => siblings.push(tree),
                None => finished = tree,
            }
        }
        finished
    }
}

fn label(node: &TreeNode) -> String {
    format!("{} ({})", node.name, node.id)
}

/// Render every root as its own tree, one after the other.
pub fn render_ascii(forest: &[TreeNode]) -> String {
    let mut out = String::new();
    for root in forest {
        let rendered = root.to_tree_string().to_string();
        out.push_str(&rendered);
        if !rendered.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::TagId;

    #[test]
    fn given_forest_when_rendering_then_draws_each_root() {
        let forest = vec![
            TreeNode {
                id: TagId::Int(1),
                name: "lang".to_string(),
                children: vec![TreeNode::leaf(2, "rust"), TreeNode::leaf(3, "go")],
            },
            TreeNode::leaf("misc", "misc"),
        ];

        let out = render_ascii(&forest);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "lang (1)");
        assert!(lines[1].ends_with("rust (2)"));
        assert!(lines[2].ends_with("go (3)"));
        assert_eq!(lines[3], "misc (misc)");
    }

    #[test]
    fn given_empty_forest_when_rendering_then_returns_empty_string() {
        assert_eq!(render_ascii(&[]), "");
    }
}
