//! Canonical augmentation checks.
//!
//! An augmentation is accepted iff the step it added is equivalent, under
//! the automorphisms of the child, to the child's canonical deletion: the
//! removable atom (or bond) that sits last in the canonical labeling. Since
//! the canonical deletion depends only on the isomorphism class of the child,
//! exactly one augmentation per class survives.

use itertools::Itertools;

use crate::{
    automorphism::{automorphisms, SymmetryMode},
    error::Error,
    extension::{AtomExtension, Augmentation, BondExtension, ElementSource},
    molecule::Molecule,
};

/// Return `true` iff the bonds of `mol`, in storage order, are strictly
/// ascending under `key`.
fn bonds_in_order<K: Ord + Copy>(mol: &Molecule, key: impl Fn(usize, usize) -> K) -> bool {
    mol.bonds()
        .map(|(a, b, _)| key(a, b))
        .tuple_windows()
        .all(|(x, y)| x < y)
}

/// Accept or reject an atom-wise augmentation.
///
/// The canonical deletion atom is the one with the greatest canonical
/// position among atoms that are not cut atoms and that `elements` allows to
/// be removed last. The augmentation is canonical iff the new atom lies in
/// its orbit.
pub fn is_canonical_atom_augmentation(
    aug: &Augmentation<'_, AtomExtension>,
    elements: &ElementSource,
) -> Result<bool, Error> {
    let child = aug.augmented();
    let n = child.atom_count();
    if n <= 2 || child.bond_count() == 0 {
        return Ok(true);
    }
    // Atom-wise growth stores bonds ordered by their later atom.
    if !bonds_in_order(child, |a, b| (a.max(b), a.min(b))) {
        return Ok(false);
    }
    if aug.extension().is_disconnected() {
        return Ok(true);
    }

    let aut = automorphisms(child, SymmetryMode::Atoms)?;
    let labeling = aut.best_labeling();
    let deletion = (0..n)
        .filter(|&v| elements.is_removable(child, v) && !child.is_cut_atom(v))
        .max_by_key(|&v| labeling.get(v));
    Ok(deletion.is_some_and(|m| aut.group().in_same_orbit(n - 1, m)))
}

/// Accept or reject a bond-wise augmentation.
///
/// The canonical deletion bond is the bond whose endpoints, relabelled by the
/// canonical labeling, form the greatest `(smaller, larger)` pair.
pub fn is_canonical_bond_augmentation(
    aug: &Augmentation<'_, BondExtension>,
) -> Result<bool, Error> {
    let child = aug.augmented();
    if child.atom_count() <= 2 || child.bond_count() == 0 {
        return Ok(true);
    }
    if !bonds_in_order(child, |a, b| (a.min(b), a.max(b))) {
        return Ok(false);
    }
    let (a, b) = (aug.extension().start(), aug.extension().end());
    if child.bond_between(a, b).is_none() {
        return Ok(true);
    }

    let aut = automorphisms(child, SymmetryMode::Atoms)?;
    let labeling = aut.best_labeling();
    let Some((c, d, _)) = child.bonds().max_by_key(|&(x, y, _)| {
        let (x, y) = (labeling.get(x), labeling.get(y));
        (x.min(y), x.max(y))
    }) else {
        return Ok(true);
    };
    Ok(aut.group().all().iter().any(|p| {
        let (x, y) = (p.get(a), p.get(b));
        (x == c && y == d) || (x == d && y == c)
    }))
}
