//! Independent canonical certificates for whole molecules.
//!
//! These come from `graph-canon` rather than from [`crate::automorphism`],
//! which makes them suitable for cross-checking that an enumeration emitted
//! no isomorphic pair.

use graph_canon::CanonLabeling;
use petgraph::{graph::Graph, Undirected};

use crate::molecule::{AtomOrBond, Index, Molecule};

/// Equal iff the two molecules are isomorphic.
pub type Certificate = CanonLabeling<AtomOrBond>;

/// A graph representation interpretable by Nauty.
type CGraph = Graph<AtomOrBond, (), Undirected, Index>;

pub fn certificate(mol: &Molecule) -> Certificate {
    CanonLabeling::new(&to_cgraph(mol))
}

/// Subdivide every bond into a node carrying the bond type, so that bond
/// orders become node colours.
fn to_cgraph(mol: &Molecule) -> CGraph {
    let mut h = CGraph::with_capacity(mol.atom_count() + mol.bond_count(), 2 * mol.bond_count());
    let atoms: Vec<_> = mol
        .elements()
        .map(|e| h.add_node(AtomOrBond::Atom(e)))
        .collect();
    for (src, dst, bond) in mol.bonds() {
        let h_enode = h.add_node(AtomOrBond::Bond(bond));
        h.add_edge(atoms[src], h_enode, ());
        h.add_edge(atoms[dst], h_enode, ());
    }
    h
}
