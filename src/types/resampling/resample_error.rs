/// Error variants returned from resampler configuration and input validation, in the event that something went wrong.
#[derive(Debug)]
pub enum ResampleError {
    /// The branch factor must be at least 2.
    InvalidBranchFactor(usize),
    /// Every lattice dimension must be at least 2.
    InvalidDimensions([usize; 3]),
    /// The minimum number of points per subtree must be at least 1.
    InvalidMinPoints(usize),
    /// The lower bound of the range predicate is above the upper bound.
    InvalidRange { min: f64, max: f64 },
    /// The number of values does not match the number of samples.
    MismatchedValues { samples: usize, values: usize },
    /// A generic error with a custom message.
    Custom(String),
}

impl std::fmt::Display for ResampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResampleError::InvalidBranchFactor(branch_factor) => {
                write!(
                    f,
                    "The branch factor must be at least 2, but was {branch_factor}."
                )
            }
            ResampleError::InvalidDimensions(dimensions) => {
                write!(
                    f,
                    "Every lattice dimension must be at least 2, but the dimensions were ({}, {}, {}).",
                    dimensions[0], dimensions[1], dimensions[2]
                )
            }
            ResampleError::InvalidMinPoints(min_points) => {
                write!(
                    f,
                    "The minimum number of points per subtree must be at least 1, but was {min_points}."
                )
            }
            ResampleError::InvalidRange { min, max } => {
                write!(
                    f,
                    "The lower bound of the range predicate ({min}) is above the upper bound ({max})."
                )
            }
            ResampleError::MismatchedValues { samples, values } => {
                write!(
                    f,
                    "The dataset has {samples} samples but {values} values."
                )
            }
            ResampleError::Custom(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ResampleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let error = ResampleError::InvalidBranchFactor(1);
        assert!(error.to_string().contains("branch factor"));

        let error = ResampleError::MismatchedValues {
            samples: 3,
            values: 2,
        };
        assert!(error.to_string().contains('3'));
        assert!(error.to_string().contains('2'));
    }
}
