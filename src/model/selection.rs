use crate::error::EvaluationError;

/// Subset of the profiles of a composite to evaluate
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Single(usize),
    Indices(Vec<usize>),
    Mask(Vec<bool>),
}

impl Selection {
    /// One flag per profile
    pub fn mask(&self, num_profiles: usize) -> Result<Vec<bool>, EvaluationError> {
        let out_of_range = |index: usize| EvaluationError::Selection {
            num_profiles,
            reason: format!("index {index} is out of range"),
        };
        match self {
            Self::All => Ok(vec![true; num_profiles]),
            Self::Single(index) => {
                if *index >= num_profiles {
                    return Err(out_of_range(*index));
                }
                Ok((0..num_profiles).map(|i| i == *index).collect())
            }
            Self::Indices(indices) => {
                let mut mask = vec![false; num_profiles];
                for &index in indices {
                    *mask.get_mut(index).ok_or_else(|| out_of_range(index))? = true;
                }
                Ok(mask)
            }
            Self::Mask(mask) => {
                if mask.len() != num_profiles {
                    return Err(EvaluationError::Selection {
                        num_profiles,
                        reason: format!("mask has {} entries", mask.len()),
                    });
                }
                Ok(mask.clone())
            }
        }
    }
}

impl From<usize> for Selection {
    fn from(index: usize) -> Self {
        Self::Single(index)
    }
}

impl From<Vec<usize>> for Selection {
    fn from(indices: Vec<usize>) -> Self {
        Self::Indices(indices)
    }
}

impl From<Vec<bool>> for Selection {
    fn from(mask: Vec<bool>) -> Self {
        Self::Mask(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks() {
        assert_eq!(Selection::All.mask(2), Ok(vec![true, true]));
        assert_eq!(Selection::from(1).mask(3), Ok(vec![false, true, false]));
        assert_eq!(Selection::from(vec![0, 2]).mask(3), Ok(vec![true, false, true]));
        assert_eq!(Selection::Indices(vec![]).mask(2), Ok(vec![false, false]));
        assert!(Selection::from(3).mask(3).is_err());
        assert!(Selection::from(vec![true]).mask(2).is_err());
    }
}
