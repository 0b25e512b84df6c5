//! Automorphism groups and canonical labelings by individualization and
//! refinement.
//!
//! The search tree starts at the equitable refinement of a coloured
//! partition. An inner node individualizes each vertex of its first
//! non-singleton cell in turn and refines again; a leaf is a discrete
//! partition, i.e. an ordering of the vertices. Two leaves with the same
//! relabelled edge list ("form") differ by an automorphism. The leaf with the
//! greatest form defines the canonical labeling.
//!
//! Subtrees are skipped when a discovered automorphism fixing the current
//! path maps them onto a subtree already explored.

use std::cmp::Ordering;

use clap::ValueEnum;
use log::{trace, warn};

use crate::{
    error::Error,
    molecule::Molecule,
    partition::{refine, Connectivity, Partition},
    permutation::{GroupBuilder, Permutation, PermutationGroup},
};

/// What the automorphisms permute.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum SymmetryMode {
    /// Atoms, coloured by element, connected by bond order.
    Atoms,
    /// Bonds, coloured by (element, order, element), connected when they
    /// share an atom.
    Bonds,
}

/// Relabelled edge list `(smaller position, weight, larger position)`,
/// sorted. Greater forms are preferred.
type Form = Vec<(usize, u32, usize)>;

/// The finished result of one automorphism search.
#[derive(Debug, Clone)]
pub struct Automorphisms {
    group: PermutationGroup,
    best: Permutation,
    form: Form,
    colors: Vec<usize>,
    initial: Partition,
    leaves: usize,
}

impl Automorphisms {
    pub fn group(&self) -> &PermutationGroup {
        &self.group
    }

    pub fn into_group(self) -> PermutationGroup {
        self.group
    }

    /// The canonical labeling: vertex `v` goes to position
    /// `best_labeling().get(v)`.
    pub fn best_labeling(&self) -> &Permutation {
        &self.best
    }

    pub fn canonical_form(&self) -> &[(usize, u32, usize)] {
        &self.form
    }

    /// Number of search-tree leaves visited.
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Return `true` iff the identity labeling produces the canonical form
    /// and places the same colours at every position.
    pub fn is_identity_canonical(&self, conn: &Connectivity) -> bool {
        let identity: Vec<usize> = (0..conn.size()).collect();
        self.initial.cell_indices() == self.colors && form_of(&conn.edges(), &identity) == self.form
    }
}

/// Connection weights for `mode`.
pub fn connectivity(mol: &Molecule, mode: SymmetryMode) -> Connectivity {
    match mode {
        SymmetryMode::Atoms => Connectivity::for_atoms(mol),
        SymmetryMode::Bonds => Connectivity::for_bonds(mol),
    }
}

/// Vertex colouring the search must respect.
pub fn initial_partition(mol: &Molecule, mode: SymmetryMode) -> Partition {
    match mode {
        SymmetryMode::Atoms => Partition::by_key(mol.atom_count(), |v| mol.element(v)),
        SymmetryMode::Bonds => {
            let bonds: Vec<_> = mol
                .bonds()
                .map(|(a, b, bond)| {
                    let (x, y) = (mol.element(a), mol.element(b));
                    (x.min(y), bond, x.max(y))
                })
                .collect();
            Partition::by_key(bonds.len(), |i| bonds[i])
        }
    }
}

pub fn automorphisms(mol: &Molecule, mode: SymmetryMode) -> Result<Automorphisms, Error> {
    let conn = connectivity(mol, mode);
    search(&conn, initial_partition(mol, mode), None)
}

/// Like [`automorphisms`], starting from the generators of `seed`. Seed
/// generators that are not automorphisms are discarded.
pub fn automorphisms_seeded(
    mol: &Molecule,
    mode: SymmetryMode,
    seed: &PermutationGroup,
) -> Result<Automorphisms, Error> {
    let conn = connectivity(mol, mode);
    search(&conn, initial_partition(mol, mode), Some(seed))
}

/// Like [`automorphisms`] with a caller-supplied colouring.
pub fn automorphisms_from(
    mol: &Molecule,
    mode: SymmetryMode,
    initial: Partition,
) -> Result<Automorphisms, Error> {
    let conn = connectivity(mol, mode);
    if initial.degree() != conn.size() {
        return Err(Error::InvalidPartition(format!(
            "covers {} points, expected {}",
            initial.degree(),
            conn.size()
        )));
    }
    search(&conn, initial, None)
}

/// Return `true` iff the atom order of `mol` is already canonical. Molecules
/// with at most two atoms or no bonds are canonical.
pub fn is_canonical(mol: &Molecule) -> Result<bool, Error> {
    if mol.atom_count() <= 2 || mol.bond_count() == 0 {
        return Ok(true);
    }
    let conn = Connectivity::for_atoms(mol);
    let aut = search(&conn, initial_partition(mol, SymmetryMode::Atoms), None)?;
    Ok(aut.is_identity_canonical(&conn))
}

/// Run the search on an arbitrary connectivity.
pub fn search(
    conn: &Connectivity,
    initial: Partition,
    seed: Option<&PermutationGroup>,
) -> Result<Automorphisms, Error> {
    let n = conn.size();
    if n == 0 {
        return Err(Error::EmptyGraph);
    }

    let mut builder = GroupBuilder::new(n);
    for g in seed.map_or(&[][..], |s| s.generators()) {
        if g.len() != n {
            return Err(Error::DegreeMismatch {
                expected: n,
                found: g.len(),
            });
        }
        if conn.is_automorphism(g, &initial) {
            builder.add(g.clone())?;
        } else {
            warn!("Discarding seed generator {g}: not an automorphism");
        }
    }

    let mut state = Search {
        conn,
        colors: &initial,
        edges: conn.edges(),
        builder,
        first: None,
        best: None,
        leaves: 0,
    };
    state.explore(&initial, &mut Vec::new())?;

    let Search {
        builder,
        best,
        leaves,
        ..
    } = state;
    let best = best.ok_or(Error::EmptyGraph)?;
    let mut labeling = vec![0; n];
    for (k, &v) in best.order.iter().enumerate() {
        labeling[v] = k;
    }
    let color = initial.cell_indices();
    let colors = best.order.iter().map(|&v| color[v]).collect();
    trace!("Search visited {leaves} leaves");

    Ok(Automorphisms {
        group: builder.build(),
        best: Permutation::from_images_unchecked(labeling),
        form: best.form,
        colors,
        initial,
        leaves,
    })
}

#[derive(Debug, Clone)]
struct Leaf {
    order: Vec<usize>,
    form: Form,
}

struct Search<'a> {
    conn: &'a Connectivity,
    colors: &'a Partition,
    edges: Vec<(usize, usize, u32)>,
    builder: GroupBuilder,
    first: Option<Leaf>,
    best: Option<Leaf>,
    leaves: usize,
}

impl Search<'_> {
    fn explore(&mut self, partition: &Partition, path: &mut Vec<usize>) -> Result<(), Error> {
        let partition = refine(self.conn, partition);
        let Some(target) = partition.first_non_singleton() else {
            return self.visit_leaf(&partition);
        };

        let cell = partition.cells()[target].clone();
        let mut explored: Vec<usize> = Vec::new();
        for v in cell {
            let roots = self.builder.orbit_roots_fixing(path);
            if explored.iter().any(|&u| roots[u] == roots[v]) {
                continue;
            }
            path.push(v);
            let result = self.explore(&partition.individualize(target, v), path);
            path.pop();
            result?;
            explored.push(v);
        }
        Ok(())
    }

    fn visit_leaf(&mut self, partition: &Partition) -> Result<(), Error> {
        let order = partition
            .order()
            .ok_or_else(|| Error::InvalidPartition("leaf is not discrete".to_string()))?;
        self.leaves += 1;
        let form = form_of(&self.edges, &order);

        let Some(first) = self.first.as_ref() else {
            let leaf = Leaf { order, form };
            self.best = Some(leaf.clone());
            self.first = Some(leaf);
            return Ok(());
        };
        if form == first.form {
            let p = mapping(&order, &first.order);
            return self.record(p);
        }

        let best = self.best.as_ref().unwrap_or(first);
        match form.cmp(&best.form) {
            Ordering::Equal => {
                let p = mapping(&order, &best.order);
                self.record(p)
            }
            Ordering::Greater => {
                self.best = Some(Leaf { order, form });
                Ok(())
            }
            Ordering::Less => Ok(()),
        }
    }

    fn record(&mut self, p: Permutation) -> Result<(), Error> {
        if !self.conn.is_automorphism(&p, self.colors) {
            trace!("Rejected candidate automorphism {p}");
            return Ok(());
        }
        trace!("Found automorphism {p}");
        self.builder.add(p)?;
        Ok(())
    }
}

/// The permutation sending `order[k]` to `target[k]`.
fn mapping(order: &[usize], target: &[usize]) -> Permutation {
    let mut images = vec![0; order.len()];
    for (&v, &w) in order.iter().zip(target) {
        images[v] = w;
    }
    Permutation::from_images_unchecked(images)
}

fn form_of(edges: &[(usize, usize, u32)], order: &[usize]) -> Form {
    let mut position = vec![0; order.len()];
    for (k, &v) in order.iter().enumerate() {
        position[v] = k;
    }
    let mut form: Form = edges
        .iter()
        .map(|&(a, b, w)| {
            let (x, y) = (position[a], position[b]);
            (x.min(y), w, x.max(y))
        })
        .collect();
    form.sort_unstable();
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(s: &str) -> Molecule {
        s.parse().unwrap()
    }

    fn atoms_of(s: &str) -> Automorphisms {
        automorphisms(&mol(s), SymmetryMode::Atoms).unwrap()
    }

    #[test]
    fn empty_graph_is_an_error() {
        assert_eq!(
            automorphisms(&Molecule::new(), SymmetryMode::Atoms).unwrap_err(),
            Error::EmptyGraph
        );
    }

    #[test]
    fn triangle_has_full_symmetric_group() {
        let aut = atoms_of("C0C1C2 0:1(1),0:2(1),1:2(1)");
        assert_eq!(aut.group().order(), 6);
    }

    #[test]
    fn allene_swaps_double_bonded_ends() {
        let aut = atoms_of("C0C1C2 0:1(2),1:2(2)");
        assert_eq!(aut.group().order(), 2);
        let swap = Permutation::from_images(vec![2, 1, 0]).unwrap();
        assert!(aut.group().contains(&swap));
    }

    #[test]
    fn branched_chain_has_trivial_group() {
        let aut = atoms_of("C0C1C2C3 0:1(1),0:2(2),2:3(2)");
        assert_eq!(aut.group().order(), 1);
        assert_eq!(aut.best_labeling().images(), &[1, 0, 3, 2]);
    }

    #[test]
    fn canonical_and_non_canonical_orderings() {
        assert!(!is_canonical(&mol("C0C1C2C3 0:1(1),0:2(2),2:3(2)")).unwrap());
        assert!(is_canonical(&mol("C0C1C2C3 0:1(1),1:3(2),2:3(2)")).unwrap());
    }

    #[test]
    fn relabelling_by_best_labeling_is_canonical() {
        for s in [
            "C0C1C2C3 0:1(1),0:2(2),2:3(2)",
            "C0C1C2C3C4 0:1(1),1:2(1),1:3(1),3:4(2)",
            "C0O1C2C3 0:1(1),1:2(1),2:3(1),0:3(1)",
            "O0C1C2N3 0:1(2),1:2(1),2:3(3)",
        ] {
            let m = mol(s);
            let aut = automorphisms(&m, SymmetryMode::Atoms).unwrap();
            let relabeled = m.relabel(aut.best_labeling()).unwrap();
            assert!(is_canonical(&relabeled).unwrap(), "{s} -> {relabeled}");
        }
    }

    #[test]
    fn isomorphic_inputs_share_a_form() {
        let a = atoms_of("C0C1C2O3 0:1(1),1:2(1),2:3(1)");
        let b = atoms_of("O0C1C2C3 0:1(1),1:2(1),2:3(1)");
        let c = atoms_of("C0O1C2C3 0:1(1),1:2(1),2:3(1)");
        assert_eq!(a.canonical_form(), b.canonical_form());
        assert_eq!(a.colors, b.colors);
        assert_ne!((a.canonical_form(), &a.colors), (c.canonical_form(), &c.colors));
    }

    #[test]
    fn elements_break_symmetry() {
        assert_eq!(atoms_of("C0C1C2 0:1(1),1:2(1)").group().order(), 2);
        assert_eq!(atoms_of("C0C1O2 0:1(1),1:2(1)").group().order(), 1);
    }

    #[test]
    fn group_is_closed() {
        let aut = atoms_of("C0C1C2C3C4C5 0:1(1),1:2(1),2:3(1),3:4(1),4:5(1),0:5(1)");
        assert_eq!(aut.group().order(), 12);
        let conn = Connectivity::for_atoms(&mol(
            "C0C1C2C3C4C5 0:1(1),1:2(1),2:3(1),3:4(1),4:5(1),0:5(1)",
        ));
        let colors = Partition::unit(6);
        for p in aut.group().all() {
            assert!(conn.is_automorphism(p, &colors));
            assert!(conn.is_automorphism(&p.invert(), &colors));
        }
    }

    #[test]
    fn bad_seeds_are_discarded() {
        let m = mol("C0C1O2 0:1(1),1:2(1)");
        let mut builder = GroupBuilder::new(3);
        builder
            .add(Permutation::from_images(vec![2, 1, 0]).unwrap())
            .unwrap();
        let aut = automorphisms_seeded(&m, SymmetryMode::Atoms, &builder.build()).unwrap();
        assert_eq!(aut.group().order(), 1);
    }

    #[test]
    fn good_seeds_are_kept() {
        let m = mol("C0C1C2C3 0:1(1),1:2(1),2:3(1),0:3(1)");
        let mut builder = GroupBuilder::new(4);
        builder
            .add(Permutation::from_images(vec![1, 2, 3, 0]).unwrap())
            .unwrap();
        let seeded = automorphisms_seeded(&m, SymmetryMode::Atoms, &builder.build()).unwrap();
        let plain = automorphisms(&m, SymmetryMode::Atoms).unwrap();
        assert_eq!(seeded.group().order(), 8);
        assert_eq!(seeded.canonical_form(), plain.canonical_form());
    }

    #[test]
    fn custom_partition_restricts_group() {
        let m = mol("C0C1C2 0:1(1),0:2(1),1:2(1)");
        let initial = Partition::from_cells(vec![vec![0], vec![1, 2]]).unwrap();
        let aut = automorphisms_from(&m, SymmetryMode::Atoms, initial).unwrap();
        assert_eq!(aut.group().order(), 2);
        let short = Partition::unit(2);
        assert!(automorphisms_from(&m, SymmetryMode::Atoms, short).is_err());
    }

    #[test]
    fn bond_symmetry_of_propane() {
        // Two equivalent C-C bonds.
        let aut = automorphisms(&mol("C0C1C2 0:1(1),1:2(1)"), SymmetryMode::Bonds).unwrap();
        assert_eq!(aut.group().order(), 2);
        let aut = automorphisms(&mol("C0C1O2 0:1(1),1:2(1)"), SymmetryMode::Bonds).unwrap();
        assert_eq!(aut.group().order(), 1);
    }
}
