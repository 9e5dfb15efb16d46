pub mod interpolate;
pub mod metrics;
pub mod regex_filter;
pub mod resolver;
pub mod selection;
pub mod trigger;

pub use interpolate::{HostVariableAdapter, StaticVariables, TemplateVariables};
pub use metrics::MetricsRequest;
pub use resolver::{CascadeResolver, ResolverOptions};
pub use selection::{
    DataPoint, DataSourceInstanceSelection, InstanceMode, Level, Query, ResourceType, Selection,
};

use std::fmt;

/// Errors raised by cascade operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeError {
    /// A required upstream level is not selected
    MissingSelection(Level),
    /// The operation needs a feature flag that is off
    FeatureDisabled(&'static str),
    /// The level's value is computed and cannot be picked
    DerivedSelection(Level),
}

impl fmt::Display for CascadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeError::MissingSelection(level) => write!(f, "missing {} selection", level),
            CascadeError::FeatureDisabled(feature) => write!(f, "{} is disabled", feature),
            CascadeError::DerivedSelection(level) => {
                write!(f, "{} selection is derived from the regex pattern", level)
            }
        }
    }
}

impl std::error::Error for CascadeError {}
