use super::info::{AtomField, StructureInfo};
use candle_core::DType;
use thiserror::Error;

/// Number of independently controllable side-chain rotation components per slot.
pub const ROTATION_DOF: usize = 8;
/// Number of components of a backbone displacement.
pub const TRANSLATION_DOF: usize = 3;

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("Atom descriptor must be a 2-D tensor, found rank {rank}")]
    DescriptorRank { rank: usize },

    #[error("Atom descriptor has {found} columns, at least {required} are required")]
    MissingColumns { found: usize, required: usize },

    #[error("Atom descriptor is empty; no residues to parametrize")]
    NoAtoms,

    #[error("Descriptor field '{field}' contains a negative index ({value})")]
    NegativeIndex { field: AtomField, value: i64 },

    #[error("Alternate-conformation mask is zero-dimensional")]
    ScalarAlternativeMask,

    #[error("Tensor operation failed while deriving shape: {0}")]
    Tensor(#[from] candle_core::Error),
}

/// Extents of the (batch, chain, residue, alternate) index space.
///
/// Every per-residue parameter tensor is shaped over these four dimensions plus a
/// trailing feature dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConformationShape {
    pub batch: usize,
    pub chains: usize,
    pub residues: usize,
    pub alternates: usize,
}

impl ConformationShape {
    pub fn new(batch: usize, chains: usize, residues: usize, alternates: usize) -> Self {
        Self {
            batch,
            chains,
            residues,
            alternates,
        }
    }

    /// Derives the parameter shape from a metadata bundle.
    ///
    /// Batch, chain and residue extents are the column maxima plus one; the alternate
    /// extent is the last dimension of the alternate-conformation mask.
    pub fn from_info(info: &StructureInfo) -> Result<Self, ShapeError> {
        let dims = info.atom_description.dims();
        if dims.len() != 2 {
            return Err(ShapeError::DescriptorRank { rank: dims.len() });
        }
        if dims[1] < AtomField::FIELD_COUNT {
            return Err(ShapeError::MissingColumns {
                found: dims[1],
                required: AtomField::FIELD_COUNT,
            });
        }
        if dims[0] == 0 {
            return Err(ShapeError::NoAtoms);
        }

        let alternates = info
            .num_alternates()
            .ok_or(ShapeError::ScalarAlternativeMask)?;

        Ok(Self {
            batch: extent_of(info, AtomField::Batch)?,
            chains: extent_of(info, AtomField::Chain)?,
            residues: extent_of(info, AtomField::ResidueNumber)?,
            alternates,
        })
    }

    pub fn dims4(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.chains, self.residues, self.alternates)
    }

    pub fn rotation_dims(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.batch,
            self.chains,
            self.residues,
            self.alternates,
            ROTATION_DOF,
        )
    }

    pub fn translation_dims(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.batch,
            self.chains,
            self.residues,
            self.alternates,
            TRANSLATION_DOF,
        )
    }

    /// Number of (batch, chain, residue) cells, ignoring alternates.
    pub fn residue_slots(&self) -> usize {
        self.batch * self.chains * self.residues
    }
}

fn extent_of(info: &StructureInfo, field: AtomField) -> Result<usize, ShapeError> {
    let column = info.field(field)?.to_dtype(DType::I64)?;
    let min = column.min(0)?.to_scalar::<i64>()?;
    if min < 0 {
        return Err(ShapeError::NegativeIndex { field, value: min });
    }
    let max = column.max(0)?.to_scalar::<i64>()?;
    Ok(max as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{Device, Tensor};

    fn info(rows: &[[i64; 6]], alternates: usize) -> StructureInfo {
        let device = Device::Cpu;
        let flat: Vec<i64> = rows.iter().flatten().copied().collect();
        let description = Tensor::from_vec(flat, (rows.len(), 6), &device).unwrap();
        let empty = Tensor::zeros(0, DType::I64, &device).unwrap();
        let mask = Tensor::ones((rows.len(), alternates), DType::U8, &device).unwrap();
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
    fn from_info_uses_column_maxima_plus_one() {
        let rows = [
            [0, 0, 0, 0, 0, 0],
            [0, 1, 4, 0, 0, 0],
            [2, 0, 9, 0, 0, 0],
        ];
        let shape = ConformationShape::from_info(&info(&rows, 3)).unwrap();
        assert_eq!(shape, ConformationShape::new(3, 2, 10, 3));
        assert_eq!(shape.rotation_dims(), (3, 2, 10, 3, ROTATION_DOF));
        assert_eq!(shape.translation_dims(), (3, 2, 10, 3, TRANSLATION_DOF));
        assert_eq!(shape.residue_slots(), 60);
    }

    #[test]
    fn from_info_is_recomputed_when_bundle_changes() {
        let small = ConformationShape::from_info(&info(&[[0, 0, 1, 0, 0, 0]], 1)).unwrap();
        let large = ConformationShape::from_info(&info(&[[0, 0, 5, 0, 0, 0]], 1)).unwrap();
        assert_eq!(small.residues, 2);
        assert_eq!(large.residues, 6);
    }

    #[test]
    fn from_info_rejects_empty_descriptor() {
        let device = Device::Cpu;
        let description = Tensor::zeros((0, 6), DType::I64, &device).unwrap();
        let empty = Tensor::zeros(0, DType::I64, &device).unwrap();
        let mask = Tensor::zeros((0, 1), DType::U8, &device).unwrap();
        let bundle = StructureInfo::new(
            empty.clone(),
            description,
            empty.clone(),
            empty.clone(),
            empty,
            mask,
        );
        assert!(matches!(
            ConformationShape::from_info(&bundle),
            Err(ShapeError::NoAtoms)
        ));
    }

    #[test]
    fn from_info_rejects_negative_indices() {
        let result = ConformationShape::from_info(&info(&[[0, -1, 0, 0, 0, 0]], 1));
        assert!(matches!(
            result,
            Err(ShapeError::NegativeIndex {
                field: AtomField::Chain,
                value: -1
            })
        ));
    }

    #[test]
    fn from_info_rejects_short_descriptor() {
        let device = Device::Cpu;
        let description = Tensor::zeros((2, 3), DType::I64, &device).unwrap();
        let empty = Tensor::zeros(0, DType::I64, &device).unwrap();
        let mask = Tensor::ones((2, 1), DType::U8, &device).unwrap();
        let bundle = StructureInfo::new(
            empty.clone(),
            description,
            empty.clone(),
            empty.clone(),
            empty,
            mask,
        );
        assert!(matches!(
            ConformationShape::from_info(&bundle),
            Err(ShapeError::MissingColumns {
                found: 3,
                required: 6
            })
        ));
    }
}
