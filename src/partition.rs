//! Ordered partitions of `0..n` and equitable refinement.
//!
//! A partition is equitable with respect to a [`Connectivity`] when, for
//! every pair of cells `(X, S)`, all vertices of `X` see the same multiset of
//! connection weights into `S`. [`refine`] computes the coarsest equitable
//! partition finer than its input, splitting cells in a fixed,
//! relabelling-invariant order so that the result can drive a canonical
//! search.

use bit_set::BitSet;

use crate::{error::Error, molecule::Molecule, permutation::Permutation};

/// An ordered list of disjoint, non-empty cells covering `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    cells: Vec<Vec<usize>>,
}

impl Partition {
    /// A single cell holding `0..n` (no cells when `n == 0`).
    pub fn unit(n: usize) -> Self {
        if n == 0 {
            return Self { cells: Vec::new() };
        }
        Self {
            cells: vec![(0..n).collect()],
        }
    }

    /// Validate `cells` as a partition of `0..n` where `n` is the total
    /// number of entries.
    pub fn from_cells(cells: Vec<Vec<usize>>) -> Result<Self, Error> {
        let n: usize = cells.iter().map(Vec::len).sum();
        let mut seen = BitSet::with_capacity(n);
        for cell in &cells {
            if cell.is_empty() {
                return Err(Error::InvalidPartition("empty cell".to_string()));
            }
            for &v in cell {
                if v >= n || !seen.insert(v) {
                    return Err(Error::InvalidPartition(format!(
                        "{v} is repeated or out of range"
                    )));
                }
            }
        }
        Ok(Self { cells })
    }

    /// Group `0..n` by `key`; cells are ordered by ascending key.
    pub fn by_key<K: Ord>(n: usize, key: impl Fn(usize) -> K) -> Self {
        let mut keyed: Vec<(K, usize)> = (0..n).map(|v| (key(v), v)).collect();
        keyed.sort();
        let mut cells: Vec<Vec<usize>> = Vec::new();
        for (k, (key, v)) in keyed.iter().enumerate() {
            if k == 0 || keyed[k - 1].0 != *key {
                cells.push(Vec::new());
            }
            if let Some(cell) = cells.last_mut() {
                cell.push(*v);
            }
        }
        Self { cells }
    }

    pub fn cells(&self) -> &[Vec<usize>] {
        &self.cells
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of points partitioned.
    pub fn degree(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_discrete(&self) -> bool {
        self.cells.iter().all(|c| c.len() == 1)
    }

    pub fn first_non_singleton(&self) -> Option<usize> {
        self.cells.iter().position(|c| c.len() > 1)
    }

    /// Split `vertex` out of cell `cell`, placing the singleton first.
    pub fn individualize(&self, cell: usize, vertex: usize) -> Partition {
        let mut cells = Vec::with_capacity(self.cells.len() + 1);
        for (i, c) in self.cells.iter().enumerate() {
            if i == cell {
                cells.push(vec![vertex]);
                cells.push(c.iter().copied().filter(|&v| v != vertex).collect());
            } else {
                cells.push(c.clone());
            }
        }
        Partition { cells }
    }

    /// Entry `v` is the index of the cell containing `v`.
    pub fn cell_indices(&self) -> Vec<usize> {
        let mut index = vec![0; self.degree()];
        for (i, cell) in self.cells.iter().enumerate() {
            for &v in cell {
                index[v] = i;
            }
        }
        index
    }

    pub fn in_same_cell(&self, a: usize, b: usize) -> bool {
        self.cells.iter().any(|c| c.contains(&a) && c.contains(&b))
    }

    /// For a discrete partition, the vertex at each position.
    pub fn order(&self) -> Option<Vec<usize>> {
        self.is_discrete()
            .then(|| self.cells.iter().map(|c| c[0]).collect())
    }
}

/// Dense symmetric matrix of non-negative connection weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connectivity {
    size: usize,
    weights: Vec<u32>,
}

impl Connectivity {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            weights: vec![0; size * size],
        }
    }

    /// Atoms as vertices, bond orders as weights.
    pub fn for_atoms(mol: &Molecule) -> Self {
        let mut conn = Self::new(mol.atom_count());
        for (a, b, bond) in mol.bonds() {
            conn.set(a, b, bond.order());
        }
        conn
    }

    /// Bonds as vertices; two bonds are connected when they share an atom.
    pub fn for_bonds(mol: &Molecule) -> Self {
        let bonds: Vec<_> = mol.bonds().collect();
        let mut conn = Self::new(bonds.len());
        for (i, &(a, b, _)) in bonds.iter().enumerate() {
            for (j, &(c, d, _)) in bonds.iter().enumerate().skip(i + 1) {
                if a == c || a == d || b == c || b == d {
                    conn.set(i, j, 1);
                }
            }
        }
        conn
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn set(&mut self, a: usize, b: usize, weight: u32) {
        self.weights[a * self.size + b] = weight;
        self.weights[b * self.size + a] = weight;
    }

    pub fn weight(&self, a: usize, b: usize) -> u32 {
        self.weights[a * self.size + b]
    }

    /// Non-zero entries `(a, b, weight)` with `a < b`.
    pub fn edges(&self) -> Vec<(usize, usize, u32)> {
        let mut edges = Vec::new();
        for a in 0..self.size {
            for b in (a + 1)..self.size {
                let w = self.weight(a, b);
                if w > 0 {
                    edges.push((a, b, w));
                }
            }
        }
        edges
    }

    /// Return `true` iff `p` preserves every weight and maps every vertex
    /// into its own cell of `colors`.
    pub fn is_automorphism(&self, p: &Permutation, colors: &Partition) -> bool {
        if p.len() != self.size || colors.degree() != self.size {
            return false;
        }
        let color = colors.cell_indices();
        (0..self.size).all(|v| color[v] == color[p.get(v)])
            && (0..self.size).all(|a| {
                ((a + 1)..self.size).all(|b| self.weight(a, b) == self.weight(p.get(a), p.get(b)))
            })
    }
}

/// The coarsest equitable partition finer than `partition`.
///
/// Cells are scanned left to right against splitter cells left to right; the
/// first cell found to be non-uniform is replaced, in place, by sub-cells in
/// ascending order of the sorted weights its vertices send into the
/// splitter, and scanning restarts.
pub fn refine(conn: &Connectivity, partition: &Partition) -> Partition {
    let mut cells = partition.cells.clone();
    'restart: loop {
        for ci in 0..cells.len() {
            if cells[ci].len() < 2 {
                continue;
            }
            for si in 0..cells.len() {
                let mut keyed: Vec<(Vec<u32>, usize)> = cells[ci]
                    .iter()
                    .map(|&v| (signature(conn, v, &cells[si]), v))
                    .collect();
                if keyed.iter().all(|(s, _)| *s == keyed[0].0) {
                    continue;
                }
                keyed.sort();
                let mut split: Vec<Vec<usize>> = Vec::new();
                for (k, (s, v)) in keyed.iter().enumerate() {
                    if k == 0 || keyed[k - 1].0 != *s {
                        split.push(Vec::new());
                    }
                    if let Some(cell) = split.last_mut() {
                        cell.push(*v);
                    }
                }
                cells.splice(ci..=ci, split);
                continue 'restart;
            }
        }
        break;
    }
    Partition { cells }
}

fn signature(conn: &Connectivity, v: usize, splitter: &[usize]) -> Vec<u32> {
    let mut weights: Vec<u32> = splitter
        .iter()
        .map(|&u| conn.weight(v, u))
        .filter(|&w| w > 0)
        .collect();
    weights.sort_unstable();
    weights
}
