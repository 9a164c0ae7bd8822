//! Pixel generators for map tiles.
//!
//! Two families of tiles are rendered from a resolved [`TileAddress`]:
//!
//! ```text
//!                     TileAddress (z, y, x)
//!                 ┌──────────┴───────────┐
//!                 ▼                      ▼
//!        ┌─────────────────┐   ┌────────────────────┐
//!        │ density         │   │ classify           │
//!        │ (Dataset →      │   │ (Classifier →      │
//!        │  green channel) │   │  categorical RGB)  │
//!        └─────────────────┘   └─────────┬──────────┘
//!                                        │
//!                              ┌─────────┴──────────┐
//!                              ▼                    ▼
//!                        CountryTable        PublisherTable
//! ```
//!
//! Both generators are pure functions of their inputs and produce an
//! `output_size × output_size` [`RgbImage`]; encoding and caching happen in
//! [`crate::tile`].
//!
//! [`TileAddress`]: crate::space::TileAddress
//! [`RgbImage`]: image::RgbImage

pub mod classify;
pub mod density;
pub mod table;

pub use classify::{category_color, render_categories, Classifier};
pub use density::{green_level, intensity, render_density, DensityGrid, GAMMA};
pub use table::{
    ClassificationTables, CountryEntry, CountryTable, PublisherEntry, PublisherTable, RangeRule,
};
