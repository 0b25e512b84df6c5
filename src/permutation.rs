//! Permutations of `0..n` and the groups they generate.
//!
//! A [`PermutationGroup`] is immutable. Automorphism searches collect
//! generators in a [`GroupBuilder`] and freeze them into a group once the
//! search is over.

use std::{
    collections::{HashSet, VecDeque},
    fmt::Display,
};

use bit_set::BitSet;

use crate::error::Error;

/// A bijection on `0..n`, stored as its image vector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permutation {
    images: Vec<usize>,
}

impl Permutation {
    /// The identity on `0..n`.
    pub fn identity(n: usize) -> Self {
        Self {
            images: (0..n).collect(),
        }
    }

    /// Construct a [`Permutation`] sending `i` to `images[i]`, or fail if
    /// `images` is not a bijection on `0..images.len()`.
    pub fn from_images(images: Vec<usize>) -> Result<Self, Error> {
        let mut seen = BitSet::with_capacity(images.len());
        let n = images.len();
        if images.iter().all(|&x| x < n && seen.insert(x)) {
            Ok(Self { images })
        } else {
            Err(Error::InvalidPermutation(images))
        }
    }

    pub(crate) fn from_images_unchecked(images: Vec<usize>) -> Self {
        debug_assert!(Self::from_images(images.clone()).is_ok());
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image of `i`.
    pub fn get(&self, i: usize) -> usize {
        self.images[i]
    }

    pub fn images(&self) -> &[usize] {
        &self.images
    }

    pub fn is_identity(&self) -> bool {
        self.images.iter().enumerate().all(|(i, &x)| i == x)
    }

    /// Composition applying `self` first and `other` second, so that
    /// `self.multiply(other).get(i) == other.get(self.get(i))`.
    pub fn multiply(&self, other: &Permutation) -> Permutation {
        debug_assert_eq!(self.len(), other.len());
        Permutation {
            images: self.images.iter().map(|&x| other.images[x]).collect(),
        }
    }

    pub fn invert(&self) -> Permutation {
        let mut images = vec![0; self.len()];
        for (i, &x) in self.images.iter().enumerate() {
            images[x] = i;
        }
        Permutation { images }
    }

    /// Move the entry at position `i` of `values` to position `self.get(i)`.
    pub fn apply_to<T: Clone>(&self, values: &[T]) -> Vec<T> {
        debug_assert_eq!(self.len(), values.len());
        let mut out = values.to_vec();
        for (i, value) in values.iter().enumerate() {
            out[self.images[i]] = value.clone();
        }
        out
    }

    /// Return `true` iff every point in `points` is mapped to itself.
    pub fn fixes_all(&self, points: &[usize]) -> bool {
        points.iter().all(|&p| self.images[p] == p)
    }
}

/// Cycle notation, omitting fixed points; the identity prints as `()`.
impl Display for Permutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut seen = BitSet::with_capacity(self.len());
        let mut any = false;
        for start in 0..self.len() {
            if seen.contains(start) || self.images[start] == start {
                continue;
            }
            any = true;
            write!(f, "({start}")?;
            seen.insert(start);
            let mut x = self.images[start];
            while x != start {
                write!(f, " {x}")?;
                seen.insert(x);
                x = self.images[x];
            }
            write!(f, ")")?;
        }
        if !any {
            write!(f, "()")?;
        }
        Ok(())
    }
}

/// A group of permutations on `0..degree`, listed in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermutationGroup {
    degree: usize,
    generators: Vec<Permutation>,
    // Sorted, for binary-search membership.
    elements: Vec<Permutation>,
}

impl PermutationGroup {
    /// The group containing only the identity.
    pub fn trivial(degree: usize) -> Self {
        GroupBuilder::new(degree).build()
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn generators(&self) -> &[Permutation] {
        &self.generators
    }

    /// Every element of the group, including the identity.
    pub fn all(&self) -> &[Permutation] {
        &self.elements
    }

    pub fn order(&self) -> usize {
        self.elements.len()
    }

    pub fn contains(&self, p: &Permutation) -> bool {
        self.elements.binary_search(p).is_ok()
    }

    /// The orbit of `point`.
    pub fn orbit(&self, point: usize) -> BitSet {
        self.elements.iter().map(|p| p.get(point)).collect()
    }

    /// Return `true` iff some element maps `a` to `b`.
    pub fn in_same_orbit(&self, a: usize, b: usize) -> bool {
        self.elements.iter().any(|p| p.get(a) == b)
    }

    /// All orbits, each sorted, ordered by smallest member.
    pub fn orbits(&self) -> Vec<Vec<usize>> {
        let mut seen = BitSet::with_capacity(self.degree);
        let mut orbits = Vec::new();
        for point in 0..self.degree {
            if seen.contains(point) {
                continue;
            }
            let orbit = self.orbit(point);
            seen.union_with(&orbit);
            orbits.push(orbit.iter().collect());
        }
        orbits
    }
}

/// Accumulates generators; [`GroupBuilder::build`] enumerates the closure.
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    degree: usize,
    generators: Vec<Permutation>,
}

impl GroupBuilder {
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            generators: Vec::new(),
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn generators(&self) -> &[Permutation] {
        &self.generators
    }

    /// Add a generator. Returns `false` (and does nothing) for the identity
    /// and for exact repeats.
    pub fn add(&mut self, p: Permutation) -> Result<bool, Error> {
        if p.len() != self.degree {
            return Err(Error::DegreeMismatch {
                expected: self.degree,
                found: p.len(),
            });
        }
        if p.is_identity() || self.generators.contains(&p) {
            return Ok(false);
        }
        self.generators.push(p);
        Ok(true)
    }

    /// Orbit representatives of the subgroup generated by those generators
    /// that fix every point of `fixed`: entry `i` is the smallest point in
    /// the orbit of `i`.
    pub fn orbit_roots_fixing(&self, fixed: &[usize]) -> Vec<usize> {
        let mut parent: Vec<usize> = (0..self.degree).collect();
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }
        for g in self.generators.iter().filter(|g| g.fixes_all(fixed)) {
            for i in 0..self.degree {
                let (a, b) = (find(&mut parent, i), find(&mut parent, g.get(i)));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
        (0..self.degree).map(|i| find(&mut parent, i)).collect()
    }

    /// Freeze into a [`PermutationGroup`] by breadth-first closure under
    /// right multiplication by the generators.
    pub fn build(self) -> PermutationGroup {
        let identity = Permutation::identity(self.degree);
        let mut seen = HashSet::from([identity.clone()]);
        let mut queue = VecDeque::from([identity]);
        while let Some(p) = queue.pop_front() {
            for g in &self.generators {
                let q = p.multiply(g);
                if seen.insert(q.clone()) {
                    queue.push_back(q);
                }
            }
        }
        let mut elements: Vec<Permutation> = seen.into_iter().collect();
        elements.sort();
        PermutationGroup {
            degree: self.degree,
            generators: self.generators,
            elements,
        }
    }
}

impl From<&PermutationGroup> for GroupBuilder {
    fn from(group: &PermutationGroup) -> Self {
        Self {
            degree: group.degree,
            generators: group.generators.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(images: &[usize]) -> Permutation {
        Permutation::from_images(images.to_vec()).unwrap()
    }

    #[test]
    fn rejects_non_bijections() {
        assert!(Permutation::from_images(vec![0, 0]).is_err());
        assert!(Permutation::from_images(vec![0, 2]).is_err());
        assert!(Permutation::from_images(vec![]).is_ok());
    }

    #[test]
    fn multiply_applies_left_first() {
        let p = perm(&[1, 2, 0]);
        let q = perm(&[1, 0, 2]);
        let pq = p.multiply(&q);
        for i in 0..3 {
            assert_eq!(pq.get(i), q.get(p.get(i)));
        }
        assert_eq!(pq, perm(&[0, 2, 1]));
    }

    #[test]
    fn inverse_composes_to_identity() {
        let p = perm(&[3, 0, 2, 1]);
        assert!(p.multiply(&p.invert()).is_identity());
        assert!(p.invert().multiply(&p).is_identity());
    }

    #[test]
    fn apply_moves_entries() {
        let p = perm(&[2, 0, 1]);
        assert_eq!(p.apply_to(&['a', 'b', 'c']), vec!['b', 'c', 'a']);
    }

    #[test]
    fn cycle_notation() {
        assert_eq!(perm(&[1, 0, 2]).to_string(), "(0 1)");
        assert_eq!(perm(&[1, 2, 0, 3]).to_string(), "(0 1 2)");
        assert_eq!(Permutation::identity(3).to_string(), "()");
    }

    #[test]
    fn closure_of_rotation_and_reflection() {
        // Symmetries of a square.
        let mut builder = GroupBuilder::new(4);
        assert!(builder.add(perm(&[1, 2, 3, 0])).unwrap());
        assert!(builder.add(perm(&[0, 3, 2, 1])).unwrap());
        assert!(!builder.add(perm(&[1, 2, 3, 0])).unwrap());
        assert!(!builder.add(Permutation::identity(4)).unwrap());
        let group = builder.build();
        assert_eq!(group.order(), 8);
        assert!(group.contains(&perm(&[2, 3, 0, 1])));
        assert!(!group.contains(&perm(&[1, 0, 2, 3])));
        for p in group.all() {
            assert!(group.contains(&p.invert()));
            for q in group.all() {
                assert!(group.contains(&p.multiply(q)));
            }
        }
    }

    #[test]
    fn orbits_partition_points() {
        let mut builder = GroupBuilder::new(5);
        builder.add(perm(&[1, 0, 2, 3, 4])).unwrap();
        builder.add(perm(&[0, 1, 2, 4, 3])).unwrap();
        let group = builder.build();
        assert_eq!(group.order(), 4);
        assert_eq!(group.orbits(), vec![vec![0, 1], vec![2], vec![3, 4]]);
        assert!(group.in_same_orbit(4, 3));
        assert!(!group.in_same_orbit(0, 2));
    }

    #[test]
    fn roots_respect_fixed_points() {
        let mut builder = GroupBuilder::new(4);
        builder.add(perm(&[1, 0, 2, 3])).unwrap();
        builder.add(perm(&[0, 1, 3, 2])).unwrap();
        assert_eq!(builder.orbit_roots_fixing(&[]), vec![0, 0, 2, 2]);
        assert_eq!(builder.orbit_roots_fixing(&[0]), vec![0, 1, 2, 2]);
    }

    #[test]
    fn degree_mismatch_is_an_error() {
        let mut builder = GroupBuilder::new(3);
        assert!(builder.add(Permutation::identity(2)).is_err());
    }
}
