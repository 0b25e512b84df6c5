//! Consumers of generated molecules.
//!
//! The driver calls [`Handler::handle`] once per reported molecule, possibly
//! from several threads, and polls [`Handler::is_done`] between children to
//! stop early.

use std::{
    io::Write,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use dashmap::DashMap;
use log::warn;

use crate::{
    canonize::{certificate, Certificate},
    molecule::Molecule,
};

pub trait Handler: Sync {
    /// Called with each reported `child` and the `parent` it was grown from.
    fn handle(&self, parent: &Molecule, child: &Molecule);

    /// Called once after the search has finished.
    fn finish(&self) {}

    /// Return `true` to stop the search.
    fn is_done(&self) -> bool {
        false
    }
}

impl<F> Handler for F
where
    F: Fn(&Molecule, &Molecule) + Sync,
{
    fn handle(&self, parent: &Molecule, child: &Molecule) {
        self(parent, child)
    }
}

/// Counts reports, optionally stopping after `limit` of them.
#[derive(Debug, Default)]
pub struct CountingHandler {
    count: AtomicUsize,
    limit: Option<usize>,
}

impl CountingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            count: AtomicUsize::new(0),
            limit: Some(limit),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Count one more report unless the limit is reached. Returns whether the
    /// report was counted.
    pub fn try_claim(&self) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                self.limit.map_or(true, |limit| n < limit).then_some(n + 1)
            })
            .is_ok()
    }
}

impl Handler for CountingHandler {
    fn handle(&self, _parent: &Molecule, _child: &Molecule) {
        self.try_claim();
    }

    fn is_done(&self) -> bool {
        self.limit.is_some_and(|limit| self.count() >= limit)
    }
}

/// Keeps every reported molecule.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    molecules: Mutex<Vec<Molecule>>,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_molecules(self) -> Vec<Molecule> {
        self.molecules
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Handler for CollectingHandler {
    fn handle(&self, _parent: &Molecule, child: &Molecule) {
        let mut molecules = self
            .molecules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        molecules.push(child.clone());
    }
}

/// Buckets reports by certificate to expose repeated isomorphism classes.
#[derive(Default)]
pub struct DuplicateCountingHandler {
    buckets: DashMap<Certificate, Vec<Molecule>>,
}

impl DuplicateCountingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct isomorphism classes seen.
    pub fn classes(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of reports.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.value().len()).sum()
    }

    /// Every class reported more than once, as the text form of its members.
    pub fn duplicates(&self) -> Vec<Vec<String>> {
        self.buckets
            .iter()
            .filter(|b| b.value().len() > 1)
            .map(|b| b.value().iter().map(Molecule::to_string).collect())
            .collect()
    }

    pub fn certificates(&self) -> Vec<Certificate> {
        self.buckets.iter().map(|b| b.key().clone()).collect()
    }
}

impl Handler for DuplicateCountingHandler {
    fn handle(&self, _parent: &Molecule, child: &Molecule) {
        let mut bucket = self.buckets.entry(certificate(child)).or_default();
        bucket.push(child.clone());
        if bucket.len() > 1 {
            warn!("Duplicate: {} repeats {}", child, bucket[0]);
        }
    }
}

/// Writes one `parent,child` row per report.
pub struct CsvHandler<W: Write> {
    writer: Mutex<csv::Writer<W>>,
}

impl<W: Write> CsvHandler<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Mutex::new(csv::Writer::from_writer(inner)),
        }
    }

    pub fn into_inner(self) -> Option<W> {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .into_inner()
            .ok()
    }
}

impl<W: Write + Send> Handler for CsvHandler<W> {
    fn handle(&self, parent: &Molecule, child: &Molecule) {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writer.write_record([parent.to_string(), child.to_string()]) {
            warn!("Could not write {child}: {e}");
        }
    }

    fn finish(&self) {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writer.flush() {
            warn!("Could not flush output: {e}");
        }
    }
}
