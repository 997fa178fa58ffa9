//! Error types for the conversion and estimation engine
//!
//! Conversion failures come in two severities that share one error kind:
//! a missing path is an expected "not convertible" answer, while a path whose
//! hops lack table data is a defect in the constants feed. Callers that need
//! to tell them apart match on the variant instead of the message.

use thiserror::Error;

/// Main error type for forecast calculations
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Unit conversion errors
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Upstream data integrity errors
    #[error("Malformed input: {0}")]
    MalformedInput(#[from] MalformedInputError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for forecast operations
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Errors raised while resolving a conversion factor
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The fuel type has no conversion graph at all
    #[error("No conversion graph for {fuel}")]
    NoGraph { fuel: String },

    /// Both units exist in the graph (or not) but nothing connects them
    #[error("No conversion path from {from} to {to} for {fuel}")]
    NoPath {
        fuel: String,
        from: String,
        to: String,
    },

    /// A path was found but one of its hops has no table entry
    #[error("Conversion data issue: from {from} to {to} for {fuel} has no factor")]
    IncompleteEdgeData {
        fuel: String,
        from: String,
        to: String,
    },

    /// Scope 3 could not be resolved, which leaves no usable estimate
    #[error("While looking for {fuel} {unit} -> {target} conversion: {source}")]
    Scope3 {
        fuel: String,
        unit: String,
        target: String,
        #[source]
        source: Box<ConversionError>,
    },
}

impl ConversionError {
    /// True for the expected "units are unrelated" outcome
    pub fn is_no_path(&self) -> bool {
        match self {
            ConversionError::NoPath { .. } => true,
            ConversionError::Scope3 { source, .. } => source.is_no_path(),
            _ => false,
        }
    }

    /// True when the constants feed itself is incomplete
    pub fn is_data_defect(&self) -> bool {
        match self {
            ConversionError::IncompleteEdgeData { .. } => true,
            ConversionError::Scope3 { source, .. } => source.is_data_defect(),
            _ => false,
        }
    }

    /// True when the requested fuel type was never built
    pub fn is_missing_graph(&self) -> bool {
        match self {
            ConversionError::NoGraph { .. } => true,
            ConversionError::Scope3 { source, .. } => source.is_missing_graph(),
            _ => false,
        }
    }
}

/// Datapoints that cannot be processed at all
#[derive(Debug, Error)]
pub enum MalformedInputError {
    #[error("Malformed {context} data, no unit: {datapoint}")]
    MissingUnit { context: String, datapoint: String },

    #[error("No stable production rate for {fuel} to fill year {year}")]
    MissingStableProduction { fuel: String, year: i32 },
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope3_wrapper_keeps_severity() {
        let inner = ConversionError::IncompleteEdgeData {
            fuel: "oil".to_string(),
            from: "bbl".to_string(),
            to: "e6bbl".to_string(),
        };
        let err = ConversionError::Scope3 {
            fuel: "oil".to_string(),
            unit: "bbl".to_string(),
            target: "kgco2e".to_string(),
            source: Box::new(inner),
        };

        assert!(err.is_data_defect());
        assert!(!err.is_no_path());
        assert!(err.to_string().contains("oil bbl -> kgco2e"));
    }

    #[test]
    fn test_forecast_error_from_conversion() {
        let err: ForecastError = ConversionError::NoGraph {
            fuel: "coal".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            ForecastError::Conversion(ConversionError::NoGraph { .. })
        ));
    }
}
