// CO2 Forecast core library
// Unit conversion graphs and emission estimates for fossil fuel production and reserves

// Enforce panic-free code in production
#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![cfg_attr(not(test), warn(clippy::expect_used))]
#![cfg_attr(not(test), warn(clippy::panic))]

pub mod config;
pub mod conversion;
pub mod emissions;
pub mod error;
pub mod feed;
pub mod fuel;
pub mod project;
pub mod reserves;
pub mod summary;
pub mod types;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types
pub use crate::config::{EngineConfig, GwpHorizons, SparseScope1Config};
pub use crate::conversion::{
    CacheKey, ConversionCache, ConversionGraph, ConversionPathLog, ConversionSet, ConversionTable,
    EdgeFactor, FactorResolver, GraphBuilder, ResolvedFactor,
};
pub use crate::emissions::EmissionsCalculator;
pub use crate::error::{
    ConfigError, ConversionError, ForecastError, ForecastResult, MalformedInputError,
};
pub use crate::feed::FeedBundle;
pub use crate::fuel::{full_fuel_type, FuelRegistry};
pub use crate::project::{current_projects, DataType, Project, ProjectDataPoint, ProjectType};
pub use crate::reserves::{
    AllocatedDatapoint, Allocation, GradeSelector, PreferenceOrderGrades, PreferredGrades,
    ReserveBalance, ReserveBalances, ReservesAllocator, StableProduction, YearLimits, YearRange,
};
pub use crate::summary::{
    add_to_total, country_current_co2, future_summary, project_co2, projection_sources, sum_of_co2,
    CountryCo2, ProductionVolume, ProjectCo2, SourceTotal,
};
pub use crate::types::{
    ConversionConstant, EmissionEstimate, Gwp, ProductionDatapoint, ReserveClass, ReserveEntry,
    Source, SourceId, Triple,
};
