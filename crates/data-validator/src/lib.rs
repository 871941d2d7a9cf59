//! Feature Vector Validation and Normalization
//!
//! Shape and finiteness gate run before every classifier call, and the
//! fitted standard scaler applied to validated vectors.

mod error;
mod normalizer;
mod validator;

pub use error::ValidationError;
pub use normalizer::StandardScaler;
pub use validator::{validate_vector, Validator};
