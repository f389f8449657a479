//! Database Models

// Serde helpers
pub mod serde_helpers;

// Catalog
pub mod product;
pub mod taxonomy;

// Re-exports
pub use product::{
    DenormalizedFields, Product, ProductCreate, ProductFacetRow, ProductUpdate, StockStatus,
};
pub use taxonomy::{
    Category, CategoryCreate, CategoryUpdate, DegreeOrder, DegreeOrderCreate, DegreeOrderUpdate,
    Obedience, ObedienceCreate, ObedienceUpdate, Rite, RiteCreate, RiteUpdate, TaxonomyEntity,
    TaxonomyEntry, TaxonomyKind,
};
