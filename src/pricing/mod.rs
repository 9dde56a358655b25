pub mod catalog;
pub mod source;
pub mod table;

pub use source::{PricingConfigSource, PricingSnapshot, StaticCatalogSource, TomlFileSource};
pub use table::{
    DataGrade, PricePoints, PriceUnit, PricingError, PricingTable, ResolvedPrice, SizeQuery,
    TierRecord,
};
