pub mod numeric;
pub mod validation;

pub use validation::{FieldwiseJson, ValidatedJson};
