//! Randomized invariants of refinement and the automorphism search.

use proptest::prelude::*;

use canaug::{
    automorphism::{automorphisms, initial_partition, is_canonical, SymmetryMode},
    canonize::certificate,
    molecule::{Bond, Element, Molecule},
    partition::{refine, Connectivity},
    permutation::Permutation,
};

/// Small molecules over C, N and O with arbitrary bonds. Capacities are
/// ignored; the search only sees colours and weights.
fn molecule() -> impl Strategy<Value = Molecule> {
    (1usize..7)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(
                    prop::sample::select(vec![Element::Carbon, Element::Nitrogen, Element::Oxygen]),
                    n,
                ),
                prop::collection::vec(0u32..4, n * (n - 1) / 2),
            )
        })
        .prop_map(|(elements, orders)| {
            let n = elements.len();
            let mut mol = Molecule::from_elements(elements);
            let pairs = (0..n).flat_map(|a| ((a + 1)..n).map(move |b| (a, b)));
            for ((a, b), order) in pairs.zip(orders) {
                if let Ok(bond) = Bond::try_from(order) {
                    mol.add_bond(a, b, bond).unwrap();
                }
            }
            mol
        })
}

/// A molecule with a random relabeling of its atoms.
fn relabeled_molecule() -> impl Strategy<Value = (Molecule, Vec<usize>)> {
    molecule().prop_flat_map(|mol| {
        let n = mol.atom_count();
        (Just(mol), Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
    })
}

fn sorted_cells(cells: &[Vec<usize>]) -> Vec<Vec<usize>> {
    cells
        .iter()
        .map(|c| {
            let mut c = c.clone();
            c.sort_unstable();
            c
        })
        .collect()
}

proptest! {
    #[test]
    fn refinement_is_idempotent(mol in molecule()) {
        let conn = Connectivity::for_atoms(&mol);
        let once = refine(&conn, &initial_partition(&mol, SymmetryMode::Atoms));
        let twice = refine(&conn, &once);
        prop_assert_eq!(sorted_cells(once.cells()), sorted_cells(twice.cells()));
    }

    #[test]
    fn refinement_commutes_with_relabeling((mol, images) in relabeled_molecule()) {
        let p = Permutation::from_images(images).unwrap();
        let moved = mol.relabel(&p).unwrap();
        let before = refine(
            &Connectivity::for_atoms(&mol),
            &initial_partition(&mol, SymmetryMode::Atoms),
        );
        let after = refine(
            &Connectivity::for_atoms(&moved),
            &initial_partition(&moved, SymmetryMode::Atoms),
        );
        let mapped: Vec<Vec<usize>> = before
            .cells()
            .iter()
            .map(|c| c.iter().map(|&v| p.get(v)).collect())
            .collect();
        prop_assert_eq!(sorted_cells(&mapped), sorted_cells(after.cells()));
    }

    #[test]
    fn group_is_closed_and_preserves_structure(mol in molecule()) {
        let aut = automorphisms(&mol, SymmetryMode::Atoms).unwrap();
        let group = aut.group();
        let conn = Connectivity::for_atoms(&mol);
        let colors = initial_partition(&mol, SymmetryMode::Atoms);
        for h in group.all() {
            prop_assert!(conn.is_automorphism(h, &colors), "{} is not an automorphism", h);
            for g in group.generators() {
                prop_assert!(group.contains(&g.multiply(h)));
            }
        }
    }

    #[test]
    fn canonical_form_ignores_atom_order((mol, images) in relabeled_molecule()) {
        let p = Permutation::from_images(images).unwrap();
        let moved = mol.relabel(&p).unwrap();
        let a = automorphisms(&mol, SymmetryMode::Atoms).unwrap();
        let b = automorphisms(&moved, SymmetryMode::Atoms).unwrap();
        prop_assert_eq!(a.group().order(), b.group().order());
        prop_assert_eq!(a.canonical_form(), b.canonical_form());
        prop_assert_eq!(
            mol.relabel(a.best_labeling()).unwrap().to_string(),
            moved.relabel(b.best_labeling()).unwrap().to_string()
        );
        prop_assert!(certificate(&mol) == certificate(&moved));
    }

    #[test]
    fn canonical_molecules_are_fixed_by_relabeling(mol in molecule()) {
        let aut = automorphisms(&mol, SymmetryMode::Atoms).unwrap();
        let canonical = mol.relabel(aut.best_labeling()).unwrap();
        // Smaller or bondless molecules count as canonical whatever their order.
        if mol.atom_count() > 2 && mol.bond_count() > 0 && is_canonical(&mol).unwrap() {
            let identity = Permutation::identity(mol.atom_count());
            prop_assert_eq!(
                canonical.to_string(),
                mol.relabel(&identity).unwrap().to_string()
            );
            let again = automorphisms(&canonical, SymmetryMode::Atoms).unwrap();
            prop_assert_eq!(again.canonical_form(), aut.canonical_form());
        }
    }

    #[test]
    fn canonical_relabeling_is_canonical(mol in molecule()) {
        let aut = automorphisms(&mol, SymmetryMode::Atoms).unwrap();
        let canonical = mol.relabel(aut.best_labeling()).unwrap();
        prop_assert!(is_canonical(&canonical).unwrap(), "{} from {}", canonical, mol);
    }
}
