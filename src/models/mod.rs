// Re-export all model types
pub use self::enums::*;
pub use self::errors::*;
pub use self::order::*;
pub use self::product::*;
pub use self::validation::*;

mod enums;
mod errors;
mod order;
mod product;
mod validation;
