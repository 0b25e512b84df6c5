use petgraph::{
    algo::connected_components,
    graph::NodeIndex,
    visit::{Dfs, NodeFiltered},
};

use crate::molecule::{Index, MGraph};

/// Graphs with at most one node count as connected.
pub fn is_connected(g: &MGraph) -> bool {
    g.node_count() <= 1 || connected_components(g) == 1
}

/// Return `true` iff `g` minus the node `removed` is connected.
pub fn is_connected_without(g: &MGraph, removed: NodeIndex<Index>) -> bool {
    let Some(start) = g.node_indices().find(|&n| n != removed) else {
        return true;
    };
    let rest = NodeFiltered::from_fn(g, |n| n != removed);
    let mut dfs = Dfs::new(&rest, start);
    let mut reached = 0;
    while dfs.next(&rest).is_some() {
        reached += 1;
    }
    reached == g.node_count() - 1
}
