use candle_core::{Device, Tensor};
use std::fmt;

/// Named columns of the per-atom descriptor tensor.
///
/// The descriptor is a `[num_atoms, FIELD_COUNT]` integer tensor; each variant maps to
/// a fixed column so the batch, chain and residue indices can be read by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomField {
    Batch,
    Chain,
    ResidueNumber,
    ResidueType,
    AtomName,
    Alternative,
}

impl AtomField {
    pub const FIELD_COUNT: usize = 6;

    pub const fn column(self) -> usize {
        match self {
            AtomField::Batch => 0,
            AtomField::Chain => 1,
            AtomField::ResidueNumber => 2,
            AtomField::ResidueType => 3,
            AtomField::AtomName => 4,
            AtomField::Alternative => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AtomField::Batch => "batch",
            AtomField::Chain => "chain",
            AtomField::ResidueNumber => "resnum",
            AtomField::ResidueType => "resname",
            AtomField::AtomName => "at_name",
            AtomField::Alternative => "alternative",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "batch" => Some(AtomField::Batch),
            "chain" => Some(AtomField::Chain),
            "resnum" => Some(AtomField::ResidueNumber),
            "resname" => Some(AtomField::ResidueType),
            "at_name" => Some(AtomField::AtomName),
            "alternative" => Some(AtomField::Alternative),
            _ => None,
        }
    }
}

impl fmt::Display for AtomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The structural metadata bundle that accompanies a coordinate tensor.
///
/// All six tensors are produced upstream (structure parsing is outside this crate) and
/// are only ever read here. They are co-indexed with the atoms of the coordinate tensor.
#[derive(Debug, Clone)]
pub struct StructureInfo {
    /// Number of atoms per structure in the batch.
    pub atom_number: Tensor,
    /// Integer descriptor per atom, columns addressed through [`AtomField`].
    pub atom_description: Tensor,
    /// Maps coordinate slots to atom rows.
    pub coords_indexing_atom: Tensor,
    /// Bonded-partner atom indices per atom.
    pub partners_indexing_atom: Tensor,
    /// Index tuples defining the rotatable angles.
    pub angle_indices: Tensor,
    /// Alternate-conformation mask; its last dimension is the number of alternate slots.
    pub alternative_mask: Tensor,
}

impl StructureInfo {
    pub fn new(
        atom_number: Tensor,
        atom_description: Tensor,
        coords_indexing_atom: Tensor,
        partners_indexing_atom: Tensor,
        angle_indices: Tensor,
        alternative_mask: Tensor,
    ) -> Self {
        Self {
            atom_number,
            atom_description,
            coords_indexing_atom,
            partners_indexing_atom,
            angle_indices,
            alternative_mask,
        }
    }

    pub fn device(&self) -> &Device {
        self.atom_description.device()
    }

    pub fn num_atoms(&self) -> usize {
        self.atom_description.dims().first().copied().unwrap_or(0)
    }

    pub fn num_alternates(&self) -> Option<usize> {
        self.alternative_mask.dims().last().copied()
    }

    /// Returns one descriptor column as a 1-D tensor of length `num_atoms`.
    pub fn field(&self, field: AtomField) -> candle_core::Result<Tensor> {
        self.atom_description
            .narrow(1, field.column(), 1)?
            .squeeze(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_with_description(rows: &[[i64; AtomField::FIELD_COUNT]]) -> StructureInfo {
        let device = Device::Cpu;
        let flat: Vec<i64> = rows.iter().flatten().copied().collect();
        let description =
            Tensor::from_vec(flat, (rows.len(), AtomField::FIELD_COUNT), &device).unwrap();
        let empty = Tensor::zeros(0, candle_core::DType::I64, &device).unwrap();
        let mask = Tensor::ones((rows.len(), 2), candle_core::DType::U8, &device).unwrap();
        StructureInfo::new(
            empty.clone(),
            description,
            empty.clone(),
            empty.clone(),
            empty,
            mask,
        )
    }

    #[test]
    fn field_name_round_trips_through_from_name() {
        for field in [
            AtomField::Batch,
            AtomField::Chain,
            AtomField::ResidueNumber,
            AtomField::ResidueType,
            AtomField::AtomName,
            AtomField::Alternative,
        ] {
            assert_eq!(AtomField::from_name(field.name()), Some(field));
        }
        assert_eq!(AtomField::from_name("occupancy"), None);
    }

    #[test]
    fn field_returns_requested_column() {
        let info = info_with_description(&[[0, 1, 7, 0, 0, 0], [1, 0, 3, 0, 0, 1]]);
        let resnum = info.field(AtomField::ResidueNumber).unwrap();
        assert_eq!(resnum.to_vec1::<i64>().unwrap(), vec![7, 3]);
        let batch = info.field(AtomField::Batch).unwrap();
        assert_eq!(batch.to_vec1::<i64>().unwrap(), vec![0, 1]);
    }

    #[test]
    fn counts_atoms_and_alternates() {
        let info = info_with_description(&[[0, 0, 0, 0, 0, 0]; 3]);
        assert_eq!(info.num_atoms(), 3);
        assert_eq!(info.num_alternates(), Some(2));
    }
}
