/*
termtree rendering of a decision tree, used by `show --pretty`.
Children are labelled with the branch that leads to them.
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::tree::{Branch, DecisionTree, NodeId};

pub trait ToTermTree {
    fn to_term_tree(&self) -> Tree<String>;
}

impl ToTermTree for DecisionTree {
    #[instrument(level = "debug", skip(self))]
    fn to_term_tree(&self) -> Tree<String> {
        fn build(tree: &DecisionTree, id: NodeId, label: String) -> Tree<String> {
            let Ok(node) = tree.get(id) else {
                return Tree::new(label);
            };
            let leaves: Vec<_> = [(Branch::Yes, node.left()), (Branch::No, node.right())]
                .into_iter()
                .filter_map(|(branch, child)| child.map(|c| (branch, c)))
                .map(|(branch, child)| {
                    let value = tree.value(child).unwrap_or_default();
                    build(tree, child, format!("[{branch}] {value}"))
                })
                .collect();
            Tree::new(label).with_leaves(leaves)
        }

        match self.root() {
            Some(root) => build(self, root, self.value(root).unwrap_or_default().to_string()),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}
