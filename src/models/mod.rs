pub mod product;
pub mod validation;

pub use product::*;
pub use validation::ValidationError;
