//! One-step extensions of a molecule and the generators that list them.
//!
//! Atom-wise growth adds one atom bonded to any subset of the existing atoms;
//! its bonds are described by a vector with one bond order per existing atom
//! (zero meaning "no bond"). Bond-wise growth keeps the atoms fixed and adds
//! one bond.
//!
//! Both generators keep only one extension per orbit of the parent's
//! automorphism group: the lexicographically greatest member.

use itertools::Itertools;
use log::debug;

use crate::{
    automorphism::{automorphisms, SymmetryMode},
    capacity::Capacities,
    error::Error,
    molecule::{Bond, Element, Molecule},
    permutation::PermutationGroup,
};

/// Something that turns a parent molecule into a child.
pub trait Extension {
    fn apply(&self, parent: &Molecule) -> Result<Molecule, Error>;
}

/// A new atom and its bond order to every existing atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomExtension {
    element: Element,
    bond_orders: Vec<u32>,
}

impl AtomExtension {
    pub fn new(element: Element, bond_orders: Vec<u32>) -> Self {
        Self {
            element,
            bond_orders,
        }
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn bond_orders(&self) -> &[u32] {
        &self.bond_orders
    }

    /// Return `true` iff the new atom gets no bonds.
    pub fn is_disconnected(&self) -> bool {
        self.bond_orders.iter().all(|&o| o == 0)
    }
}

impl Extension for AtomExtension {
    fn apply(&self, parent: &Molecule) -> Result<Molecule, Error> {
        parent.with_atom(self.element, &self.bond_orders)
    }
}

/// A new bond between two existing atoms, stored with `start < end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BondExtension {
    start: usize,
    end: usize,
    bond: Bond,
}

impl BondExtension {
    pub fn new(a: usize, b: usize, bond: Bond) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
            bond,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn bond(&self) -> Bond {
        self.bond
    }
}

impl Extension for BondExtension {
    fn apply(&self, parent: &Molecule) -> Result<Molecule, Error> {
        parent.with_bond(self.start, self.end, self.bond)
    }
}

/// One edge of the search tree: a parent, an extension, and the child they
/// produce.
#[derive(Debug, Clone)]
pub struct Augmentation<'p, E> {
    parent: &'p Molecule,
    extension: E,
    augmented: Molecule,
}

impl<'p, E: Extension> Augmentation<'p, E> {
    pub fn new(parent: &'p Molecule, extension: E) -> Result<Self, Error> {
        let augmented = extension.apply(parent)?;
        Ok(Self {
            parent,
            extension,
            augmented,
        })
    }
}

impl<'p, E> Augmentation<'p, E> {
    pub fn parent(&self) -> &'p Molecule {
        self.parent
    }

    pub fn extension(&self) -> &E {
        &self.extension
    }

    pub fn augmented(&self) -> &Molecule {
        &self.augmented
    }

    pub fn into_augmented(self) -> Molecule {
        self.augmented
    }
}

/// Where the elements of new atoms come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSource {
    /// Atom `i` is always `elements[i]`.
    Sequence(Vec<Element>),
    /// Any element not yet used up; growth starts from the smallest one.
    Multiset(Vec<Element>),
}

impl ElementSource {
    /// A multiset source; `elements` is sorted.
    pub fn multiset(mut elements: Vec<Element>) -> Self {
        elements.sort();
        ElementSource::Multiset(elements)
    }

    pub fn elements(&self) -> &[Element] {
        match self {
            ElementSource::Sequence(e) | ElementSource::Multiset(e) => e,
        }
    }

    /// Number of atoms in a finished molecule.
    pub fn len(&self) -> usize {
        self.elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }

    /// Element of the first atom.
    pub fn start(&self) -> Result<Element, Error> {
        let start = match self {
            ElementSource::Sequence(elements) => elements.first(),
            ElementSource::Multiset(elements) => elements.iter().min(),
        };
        start.copied().ok_or(Error::ElementsExhausted(0))
    }

    /// Return `false` if some connected structure over these elements has no
    /// atom this source lets be removed last. Only sequences mixing several
    /// elements can miss structures, e.g. dimethyl ether from `[C, C, O]`.
    pub fn is_exhaustive(&self) -> bool {
        match self {
            ElementSource::Sequence(elements) => elements.iter().all_equal(),
            ElementSource::Multiset(_) => true,
        }
    }

    /// Distinct elements that the next atom of `parent` may have, ascending.
    pub fn candidates(&self, parent: &Molecule) -> Result<Vec<Element>, Error> {
        let index = parent.atom_count();
        match self {
            ElementSource::Sequence(elements) => elements
                .get(index)
                .map(|&e| vec![e])
                .ok_or(Error::ElementsExhausted(index)),
            ElementSource::Multiset(elements) => {
                let mut unused = elements.clone();
                for e in parent.elements() {
                    if let Some(pos) = unused.iter().position(|&x| x == e) {
                        unused.remove(pos);
                    }
                }
                unused.sort();
                unused.dedup();
                if unused.is_empty() {
                    return Err(Error::ElementsExhausted(index));
                }
                Ok(unused)
            }
        }
    }

    /// Return `true` iff removing `atom` from `mol` could undo an
    /// augmentation allowed by this source.
    pub fn is_removable(&self, mol: &Molecule, atom: usize) -> bool {
        let element = mol.element(atom);
        match self {
            ElementSource::Sequence(elements) => {
                mol.atom_count()
                    .checked_sub(1)
                    .and_then(|last| elements.get(last))
                    == Some(&element)
            }
            ElementSource::Multiset(elements) => {
                elements.iter().min() != Some(&element)
                    || mol.elements().filter(|&e| e == element).count() > 1
            }
        }
    }
}

/// Return `true` iff no element of `group` maps `vector` to something
/// lexicographically greater. Entry `i` moves to position `p.get(i)`.
pub fn is_orbit_maximal(vector: &[u32], group: &PermutationGroup) -> bool {
    group
        .all()
        .iter()
        .all(|p| p.apply_to(vector).as_slice() <= vector)
}

/// Keep one vector per orbit of `group`.
pub fn orbit_representatives(vectors: Vec<Vec<u32>>, group: &PermutationGroup) -> Vec<Vec<u32>> {
    vectors
        .into_iter()
        .filter(|v| is_orbit_maximal(v, group))
        .collect()
}

fn parent_group(parent: &Molecule) -> Result<PermutationGroup, Error> {
    if parent.atom_count() == 0 {
        return Ok(PermutationGroup::trivial(0));
    }
    Ok(automorphisms(parent, SymmetryMode::Atoms)?.into_group())
}

/// Atom-wise extension generator.
#[derive(Debug, Clone)]
pub struct AtomAugmentor {
    capacities: Capacities,
    elements: ElementSource,
}

impl AtomAugmentor {
    pub fn new(capacities: Capacities, elements: ElementSource) -> Self {
        Self {
            capacities,
            elements,
        }
    }

    pub fn capacities(&self) -> &Capacities {
        &self.capacities
    }

    pub fn elements(&self) -> &ElementSource {
        &self.elements
    }

    /// A single atom of the starting element.
    pub fn initial(&self) -> Result<Molecule, Error> {
        Ok(Molecule::from_elements([self.elements.start()?]))
    }

    /// Every bond-order vector for a new `element` atom that respects the
    /// remaining capacity of each atom and the maximum bond order of both
    /// ends, in listing order.
    ///
    /// Capping by the existing atom's maximum bond order as well as the new
    /// atom's makes the allowed bonds independent of which atom came first:
    /// a sulfur never takes a triple bond, whether it is added to a carbon or
    /// a carbon is added to it.
    pub fn bond_order_vectors(
        &self,
        parent: &Molecule,
        element: Element,
    ) -> Result<Vec<Vec<u32>>, Error> {
        let cap = self.capacities.get(element)?;
        let remaining = self.capacities.remaining(parent)?;
        let limits = remaining
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                let other = self.capacities.get(parent.element(i))?;
                Ok(r.min(cap.max_bond_order).min(other.max_bond_order))
            })
            .collect::<Result<Vec<u32>, Error>>()?;
        let base: Vec<usize> = (0..parent.atom_count())
            .filter(|&i| limits[i] > 0)
            .collect();

        let mut vectors = Vec::new();
        for k in 1..=cap.max_bond_order_sum as usize {
            for multiset in base.iter().copied().combinations_with_replacement(k) {
                let mut vector = vec![0; parent.atom_count()];
                for i in multiset {
                    vector[i] += 1;
                }
                if vector.iter().zip(&limits).all(|(v, l)| v <= l) {
                    vectors.push(vector);
                }
            }
        }
        Ok(vectors)
    }

    /// Children of `parent`, one per orbit of bond-order vectors and
    /// candidate element.
    pub fn augment<'p>(
        &self,
        parent: &'p Molecule,
    ) -> Result<Vec<Augmentation<'p, AtomExtension>>, Error> {
        let group = parent_group(parent)?;
        let mut children = Vec::new();
        for element in self.elements.candidates(parent)? {
            let vectors = self.bond_order_vectors(parent, element)?;
            let raw = vectors.len();
            for vector in orbit_representatives(vectors, &group) {
                children.push(Augmentation::new(
                    parent,
                    AtomExtension::new(element, vector),
                )?);
            }
            debug!(
                "{parent}: {raw} vectors for {element}, {} children so far",
                children.len()
            );
        }
        Ok(children)
    }

    /// The molecules [`AtomAugmentor::augment`] produces for the atom at
    /// `index`, which must be the next free index of `parent`.
    pub fn list_children(&self, parent: &Molecule, index: usize) -> Result<Vec<Molecule>, Error> {
        if index != parent.atom_count() {
            return Err(Error::AtomIndex {
                index,
                count: parent.atom_count(),
            });
        }
        Ok(self
            .augment(parent)?
            .into_iter()
            .map(Augmentation::into_augmented)
            .collect())
    }
}

/// Bond-wise extension generator over a fixed set of atoms.
#[derive(Debug, Clone)]
pub struct BondAugmentor {
    capacities: Capacities,
    elements: ElementSource,
}

impl BondAugmentor {
    pub fn new(capacities: Capacities, elements: ElementSource) -> Self {
        Self {
            capacities,
            elements,
        }
    }

    pub fn capacities(&self) -> &Capacities {
        &self.capacities
    }

    pub fn elements(&self) -> &ElementSource {
        &self.elements
    }

    /// Every atom, no bonds.
    pub fn initial(&self) -> Result<Molecule, Error> {
        if self.elements.is_empty() {
            return Err(Error::ElementsExhausted(0));
        }
        Ok(Molecule::from_elements(self.elements.elements().iter().copied()))
    }

    /// Every bond that fits between two unbonded atoms of `parent`.
    pub fn bond_candidates(&self, parent: &Molecule) -> Result<Vec<BondExtension>, Error> {
        let remaining = self.capacities.remaining(parent)?;
        let max_orders = parent
            .elements()
            .map(|e| Ok(self.capacities.get(e)?.max_bond_order))
            .collect::<Result<Vec<u32>, Error>>()?;
        let mut candidates = Vec::new();
        for (a, b) in (0..parent.atom_count()).tuple_combinations() {
            if parent.bond_between(a, b).is_some() {
                continue;
            }
            let limit = remaining[a]
                .min(remaining[b])
                .min(max_orders[a])
                .min(max_orders[b]);
            for order in 1..=limit {
                let bond = Bond::try_from(order).map_err(|_| Error::BondOrder(order))?;
                candidates.push(BondExtension::new(a, b, bond));
            }
        }
        Ok(candidates)
    }

    /// Children of `parent`, one per orbit of candidate bonds.
    pub fn augment<'p>(
        &self,
        parent: &'p Molecule,
    ) -> Result<Vec<Augmentation<'p, BondExtension>>, Error> {
        let group = parent_group(parent)?;
        let candidates = self.bond_candidates(parent)?;
        let raw = candidates.len();
        let children = candidates
            .into_iter()
            .filter(|ext| {
                group.all().iter().all(|p| {
                    let (x, y) = (p.get(ext.start), p.get(ext.end));
                    (x.min(y), x.max(y)) <= (ext.start, ext.end)
                })
            })
            .map(|ext| Augmentation::new(parent, ext))
            .collect::<Result<Vec<_>, Error>>()?;
        debug!("{parent}: {raw} candidate bonds, {} children", children.len());
        Ok(children)
    }
}
