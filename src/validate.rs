//! Which generated molecules are reported, and which are worth extending.

use crate::{
    capacity::Capacities,
    error::Error,
    loader::Formula,
    molecule::Molecule,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// Report every canonical molecule, at every size.
    Any,
    /// Report connected molecules with the target number of atoms.
    Connected,
    /// Report connected molecules with the target number of atoms whose
    /// implicit hydrogen count is `hydrogens`.
    Formula {
        capacities: Capacities,
        hydrogens: u32,
        /// Sum of the valences of every heavy atom in the formula.
        total_capacity: u32,
    },
}

impl Validator {
    pub fn for_formula(formula: &Formula, capacities: &Capacities) -> Result<Self, Error> {
        Ok(Validator::Formula {
            capacities: capacities.clone(),
            hydrogens: formula.hydrogens,
            total_capacity: capacities.total_capacity(&formula.elements)?,
        })
    }

    pub fn is_valid(&self, mol: &Molecule, size: usize) -> Result<bool, Error> {
        match self {
            Validator::Any => Ok(true),
            Validator::Connected => Ok(mol.atom_count() == size && mol.is_connected()),
            Validator::Formula {
                capacities,
                hydrogens,
                ..
            } => Ok(mol.atom_count() == size
                && mol.is_connected()
                && capacities.implicit_hydrogens(mol)? == *hydrogens),
        }
    }

    /// Return `false` if no molecule grown from `mol` to `size` atoms can be
    /// valid. Every atom still to come adds at least one bond order, and each
    /// bond order uses two units of valence that hydrogens can no longer
    /// take.
    pub fn can_extend(&self, mol: &Molecule, size: usize) -> bool {
        match self {
            Validator::Any | Validator::Connected => true,
            Validator::Formula {
                hydrogens,
                total_capacity,
                ..
            } => {
                let bond_orders: u32 = mol.bonds().map(|(_, _, b)| b.order()).sum();
                let to_come = size.saturating_sub(mol.atom_count()) as u32;
                2 * (bond_orders + to_come) + hydrogens <= *total_capacity
            }
        }
    }
}
