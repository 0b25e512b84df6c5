//! Enumerate molecules by depth-first search over the canonical augmentation
//! tree.
//!
//! Each node of the tree is a molecule. Its children are the extensions that
//! survive the orbit filter; a child is visited only if it passes the
//! canonical augmentation check, so every isomorphism class is reached from
//! exactly one parent. Valid children are reported to a [`Handler`], then
//! expanded in turn until the target size is reached.

use clap::ValueEnum;
use log::{info, warn};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    canonical::{is_canonical_atom_augmentation, is_canonical_bond_augmentation},
    capacity::Capacities,
    error::Error,
    extension::{AtomAugmentor, Augmentation, BondAugmentor, ElementSource},
    handler::Handler,
    loader::Formula,
    molecule::Molecule,
    validate::Validator,
};

/// Parallelization strategy for the search.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum ParallelMode {
    /// Single-threaded depth-first search.
    None,
    /// Explore the children of the starting molecule in parallel.
    DepthOne,
    /// Explore siblings in parallel at every depth.
    Always,
}

/// What a single augmentation step adds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum AugmentMode {
    /// Add one atom, bonded to any existing atoms.
    Atom,
    /// Start from all atoms and add one bond at a time.
    Bond,
}

/// How the elements of a formula are assigned to atoms.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum ElementMode {
    /// Atoms take the formula's elements in sorted order. With more than one
    /// heavy element this misses structures whose last element only appears
    /// as cut atoms, such as dimethyl ether.
    Sequence,
    /// Any unused element of the formula may come next.
    Multiset,
}

#[derive(Debug, Clone)]
pub enum Strategy {
    Atom(AtomAugmentor),
    Bond(BondAugmentor),
}

impl Strategy {
    pub fn new(mode: AugmentMode, capacities: Capacities, elements: ElementSource) -> Self {
        match mode {
            AugmentMode::Atom => Strategy::Atom(AtomAugmentor::new(capacities, elements)),
            AugmentMode::Bond => Strategy::Bond(BondAugmentor::new(capacities, elements)),
        }
    }

    pub fn elements(&self) -> &ElementSource {
        match self {
            Strategy::Atom(aug) => aug.elements(),
            Strategy::Bond(aug) => aug.elements(),
        }
    }

    /// Root of the search tree.
    pub fn initial(&self) -> Result<Molecule, Error> {
        match self {
            Strategy::Atom(aug) => aug.initial(),
            Strategy::Bond(aug) => aug.initial(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Generator {
    strategy: Strategy,
    validator: Validator,
    parallel: ParallelMode,
}

impl Generator {
    pub fn new(strategy: Strategy, validator: Validator) -> Self {
        Self {
            strategy,
            validator,
            parallel: ParallelMode::None,
        }
    }

    /// A generator for the structures of `formula`.
    pub fn for_formula(
        formula: &Formula,
        augment: AugmentMode,
        elements: ElementMode,
        capacities: Capacities,
    ) -> Result<Self, Error> {
        let validator = Validator::for_formula(formula, &capacities)?;
        let source = match elements {
            ElementMode::Sequence => ElementSource::Sequence(formula.elements.clone()),
            ElementMode::Multiset => ElementSource::multiset(formula.elements.clone()),
        };
        if !source.is_exhaustive() {
            warn!("Sequence mode with mixed elements may miss structures; use multiset mode");
        }
        Ok(Self::new(
            Strategy::new(augment, capacities, source),
            validator,
        ))
    }

    pub fn with_parallel(mut self, parallel: ParallelMode) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of atoms in a finished molecule.
    pub fn size(&self) -> usize {
        self.strategy.elements().len()
    }

    /// Search from the strategy's root, reporting the root itself if valid.
    pub fn run(&self, handler: &dyn Handler) -> Result<(), Error> {
        let start = self.strategy.initial()?;
        info!("Searching from {start} to {} atoms", self.size());
        if self.validator.is_valid(&start, self.size())? {
            handler.handle(&Molecule::new(), &start);
        }
        if self.validator.can_extend(&start, self.size()) {
            self.extend(&start, handler)?;
        }
        handler.finish();
        Ok(())
    }

    /// Search the subtree below `parent`.
    pub fn extend(&self, parent: &Molecule, handler: &dyn Handler) -> Result<(), Error> {
        self.expand(parent, 0, handler)
    }

    fn expand(&self, parent: &Molecule, depth: usize, handler: &dyn Handler) -> Result<(), Error> {
        match &self.strategy {
            Strategy::Atom(aug) => {
                if parent.atom_count() >= self.size() {
                    return Ok(());
                }
                let children = aug.augment(parent)?;
                self.visit(children, depth, handler, |child| {
                    is_canonical_atom_augmentation(child, aug.elements())
                })
            }
            Strategy::Bond(aug) => {
                let children = aug.augment(parent)?;
                self.visit(children, depth, handler, is_canonical_bond_augmentation)
            }
        }
    }

    fn visit<'p, E: Sync>(
        &self,
        children: Vec<Augmentation<'p, E>>,
        depth: usize,
        handler: &dyn Handler,
        is_canonical: impl Fn(&Augmentation<'p, E>) -> Result<bool, Error> + Sync,
    ) -> Result<(), Error> {
        let size = self.size();
        let step = |child: &Augmentation<'p, E>| -> Result<(), Error> {
            if handler.is_done() || !is_canonical(child)? {
                return Ok(());
            }
            let mol = child.augmented();
            if self.validator.is_valid(mol, size)? {
                handler.handle(child.parent(), mol);
            }
            if self.validator.can_extend(mol, size) {
                self.expand(mol, depth + 1, handler)?;
            }
            Ok(())
        };

        let parallel = match self.parallel {
            ParallelMode::None => false,
            ParallelMode::DepthOne => depth == 0,
            ParallelMode::Always => true,
        };
        if parallel {
            children.par_iter().try_for_each(&step)
        } else {
            children.iter().try_for_each(&step)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        handler::{CollectingHandler, CountingHandler, DuplicateCountingHandler},
        loader::parse_formula,
        molecule::Element,
    };

    fn count(formula: &str, augment: AugmentMode, elements: ElementMode) -> usize {
        let formula = parse_formula(formula).unwrap();
        let generator =
            Generator::for_formula(&formula, augment, elements, Capacities::default()).unwrap();
        let handler = CountingHandler::new();
        generator.run(&handler).unwrap();
        handler.count()
    }

    #[test]
    fn single_atom() {
        assert_eq!(count("CH4", AugmentMode::Atom, ElementMode::Sequence), 1);
        assert_eq!(count("CH4", AugmentMode::Bond, ElementMode::Sequence), 1);
        assert_eq!(count("CH2O", AugmentMode::Atom, ElementMode::Multiset), 1);
    }

    #[test]
    fn butanes() {
        assert_eq!(count("C4H10", AugmentMode::Atom, ElementMode::Sequence), 2);
        assert_eq!(count("C4H10", AugmentMode::Bond, ElementMode::Sequence), 2);
    }

    #[test]
    fn propenes() {
        assert_eq!(count("C3H6", AugmentMode::Atom, ElementMode::Sequence), 2);
        assert_eq!(count("C3H6", AugmentMode::Bond, ElementMode::Sequence), 2);
    }

    #[test]
    fn ethanol_and_dimethyl_ether() {
        assert_eq!(count("C2H6O", AugmentMode::Atom, ElementMode::Multiset), 2);
        // Oxygen last: the ether's oxygen is a cut atom and is never added.
        assert_eq!(count("C2H6O", AugmentMode::Atom, ElementMode::Sequence), 1);
        assert_eq!(count("C2H6O", AugmentMode::Bond, ElementMode::Multiset), 2);
    }

    #[test]
    fn parallel_search_agrees() {
        for mode in [ParallelMode::DepthOne, ParallelMode::Always] {
            let formula = parse_formula("C6H14").unwrap();
            let generator = Generator::for_formula(
                &formula,
                AugmentMode::Atom,
                ElementMode::Sequence,
                Capacities::default(),
            )
            .unwrap()
            .with_parallel(mode);
            let handler = DuplicateCountingHandler::new();
            generator.run(&handler).unwrap();
            assert_eq!(handler.classes(), 5);
            assert_eq!(handler.total(), 5);
        }
    }

    #[test]
    fn limit_stops_search() {
        let formula = parse_formula("C7H16").unwrap();
        let generator = Generator::for_formula(
            &formula,
            AugmentMode::Atom,
            ElementMode::Sequence,
            Capacities::default(),
        )
        .unwrap();
        let handler = CountingHandler::with_limit(3);
        generator.run(&handler).unwrap();
        assert_eq!(handler.count(), 3);
    }

    #[test]
    fn every_size_without_validation() {
        // C, C-C, C=C, C#C.
        let aug = AtomAugmentor::new(
            Capacities::default(),
            ElementSource::Sequence(vec![Element::Carbon; 2]),
        );
        let generator = Generator::new(Strategy::Atom(aug), Validator::Any);
        let handler = CollectingHandler::new();
        generator.run(&handler).unwrap();
        let found: Vec<String> = handler
            .into_molecules()
            .iter()
            .map(Molecule::to_string)
            .collect();
        assert_eq!(found, vec!["C0", "C0C1 0:1(1)", "C0C1 0:1(2)", "C0C1 0:1(3)"]);
    }

    #[test]
    fn extend_from_given_parent() {
        let aug = AtomAugmentor::new(
            Capacities::default(),
            ElementSource::Sequence(vec![Element::Carbon; 4]),
        );
        let generator = Generator::new(Strategy::Atom(aug), Validator::Connected);
        let handler = CountingHandler::new();
        let parent: Molecule = "C0C1C2 0:1(1),0:2(1),1:2(1)".parse().unwrap();
        generator.extend(&parent, &handler).unwrap();
        // Seven children survive the orbit filter. Methylcyclopropane and
        // bicyclobutane have their canonical parent elsewhere.
        assert_eq!(handler.count(), 5);
    }

    #[test]
    fn errors_abort_the_run() {
        let aug = AtomAugmentor::new(
            Capacities::default(),
            ElementSource::Sequence(vec![Element::Carbon, Element::Boron]),
        );
        let generator = Generator::new(Strategy::Atom(aug), Validator::Connected);
        let handler = CountingHandler::new();
        assert_eq!(
            generator.run(&handler),
            Err(Error::UnknownElement(Element::Boron))
        );
    }
}
