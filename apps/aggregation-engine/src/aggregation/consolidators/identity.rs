//! Filtered Identity Consolidator
//!
//! Pass-through for raw-tick and custom subscriptions: accepted points are
//! re-emitted immediately, rejected points are dropped silently. No
//! buffering, nothing to scan.

use crate::domain::market::{ConsolidatedData, MarketData};
use crate::domain::subscription::TickType;

use super::{Consolidator, ConsolidatorError};

/// Predicate selecting which points a pass-through subscription receives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum IdentityFilter {
    /// Accept ticks of one tick type.
    ByTickType(TickType),
    /// Accept custom points whose declared type name matches exactly.
    ByCustomType(String),
}

/// Emits every accepted data point immediately, filtered by a predicate.
#[derive(Debug, Clone)]
pub struct FilteredIdentityConsolidator {
    filter: IdentityFilter,
}

impl FilteredIdentityConsolidator {
    /// Pass through ticks of the given type.
    #[must_use]
    pub const fn by_tick_type(tick_type: TickType) -> Self {
        Self {
            filter: IdentityFilter::ByTickType(tick_type),
        }
    }

    /// Pass through custom points with this exact declared type name.
    #[must_use]
    pub const fn by_custom_type(type_name: String) -> Self {
        Self {
            filter: IdentityFilter::ByCustomType(type_name),
        }
    }

    fn accepts(&self, data: &MarketData) -> bool {
        match (&self.filter, data) {
            (IdentityFilter::ByTickType(TickType::Trade), MarketData::TradeTick { .. })
            | (IdentityFilter::ByTickType(TickType::Quote), MarketData::QuoteTick { .. })
            | (
                IdentityFilter::ByTickType(TickType::OpenInterest),
                MarketData::OpenInterest { .. },
            ) => true,
            (IdentityFilter::ByCustomType(name), MarketData::Custom { type_name, .. }) => {
                name == type_name
            }
            _ => false,
        }
    }
}

impl Consolidator for FilteredIdentityConsolidator {
    fn update(&mut self, data: &MarketData) -> Result<Option<ConsolidatedData>, ConsolidatorError> {
        Ok(self
            .accepts(data)
            .then(|| ConsolidatedData::Point(data.clone())))
    }
}
