//! MySQL dialect: normalization, extraction and SQL generation.

mod extract;
mod generate;
mod normalize;

pub use extract::MySqlExtractor;
pub use generate::MySqlGenerator;
pub use normalize::MySqlNormalizer;
