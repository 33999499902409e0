//! Data layer: cell and table types, storage, loading, filtering and projection.
//!
//! Architecture:
//! ```text
//!  .xlsx / .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────┐
//!   │ TableStore │  id → Arc<Table>
//!   └────────────┘
//!        │
//!        ▼
//!   ┌──────────┐      ┌─────────┐
//!   │  filter   │ ───▶ │ matcher │  per-column direct / text / numeric masks
//!   └──────────┘      └─────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ projector │  two columns → (x, y) series
//!   └───────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod projector;
pub mod store;
pub mod table;
