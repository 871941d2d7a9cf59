//! Feature Vector Validator

use crate::error::ValidationError;
use feature_engine::{FeatureVector, SchemaId};

/// Check width and finiteness of a raw vector
pub fn validate_vector(values: &[f64], expected_width: usize) -> Result<(), ValidationError> {
    if values.len() != expected_width {
        return Err(ValidationError::DimensionMismatch {
            expected: expected_width,
            actual: values.len(),
        });
    }

    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ValidationError::InvalidValues {
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

/// Validator bound to one schema and classifier width
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    schema: SchemaId,
    expected_width: usize,
}

impl Validator {
    /// Create a validator for vectors of `schema` feeding a classifier of `expected_width`
    pub fn new(schema: SchemaId, expected_width: usize) -> Self {
        Self {
            schema,
            expected_width,
        }
    }

    /// Validator whose width is the schema's own length
    pub fn for_schema(schema: SchemaId) -> Self {
        Self::new(schema, schema.schema().len())
    }

    pub fn expected_width(&self) -> usize {
        self.expected_width
    }

    /// Validate a feature vector
    pub fn validate(&self, vector: &FeatureVector) -> Result<(), ValidationError> {
        if vector.schema != self.schema {
            return Err(ValidationError::SchemaMismatch {
                expected: self.schema.schema().id(),
                actual: vector.schema.schema().id(),
            });
        }
        validate_vector(&vector.values, self.expected_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_vector() {
        assert!(validate_vector(&[0.0, -1.5, 1e300], 3).is_ok());
    }

    #[test]
    fn test_dimension_mismatch() {
        assert_eq!(
            validate_vector(&[1.0; 13], 16),
            Err(ValidationError::DimensionMismatch { expected: 16, actual: 13 })
        );
        assert!(validate_vector(&[], 1).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut values = vec![1.0; 4];
            values[2] = bad;
            assert!(matches!(
                validate_vector(&values, 4),
                Err(ValidationError::InvalidValues { index: 2, .. })
            ));
        }
    }

    #[test]
    fn test_width_checked_before_values() {
        assert!(matches!(
            validate_vector(&[f64::NAN; 3], 4),
            Err(ValidationError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_schema_mismatch() {
        let validator = Validator::for_schema(SchemaId::Voice);
        assert_eq!(validator.expected_width(), 22);
        let vector = FeatureVector::new(SchemaId::Drawing, vec![0.0; 22]);
        assert!(matches!(
            validator.validate(&vector),
            Err(ValidationError::SchemaMismatch { .. })
        ));
        let vector = FeatureVector::new(SchemaId::Voice, vec![0.0; 22]);
        assert!(validator.validate(&vector).is_ok());
    }

    proptest! {
        #[test]
        fn prop_nan_rejected_at_any_magnitude(
            mut values in prop::collection::vec(-1e300f64..1e300, 1..40),
            slot in any::<prop::sample::Index>(),
        ) {
            let width = values.len();
            prop_assert!(validate_vector(&values, width).is_ok());
            let index = slot.index(width);
            values[index] = f64::NAN;
            let rejected = matches!(
                validate_vector(&values, width),
                Err(ValidationError::InvalidValues { index: i, .. }) if i == index
            );
            prop_assert!(rejected);
        }

        #[test]
        fn prop_wrong_width_rejected(len in 0usize..64, expected in 0usize..64) {
            prop_assume!(len != expected);
            let values = vec![0.0; len];
            let rejected = matches!(
                validate_vector(&values, expected),
                Err(ValidationError::DimensionMismatch { .. })
            );
            prop_assert!(rejected);
        }
    }
}
