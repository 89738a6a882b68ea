//! Weight check-in domain model

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

/// A body-weight measurement. Append-only time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Kilograms
    pub weight: f64,
    /// When the weight was measured (naive datetime, local time)
    pub recorded_at: NaiveDateTime,
    pub notes: Option<String>,
}

impl WeightEntry {
    /// Create a check-in recorded now
    pub fn new(user_id: Uuid, weight: f64) -> Self {
        Self::at(user_id, weight, Local::now().naive_local())
    }

    pub fn at(user_id: Uuid, weight: f64, recorded_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            weight,
            recorded_at,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(Error::validation("weight must be a positive number of kilograms"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_weight() {
        let user = Uuid::new_v4();
        assert!(WeightEntry::new(user, 72.5).validate().is_ok());
        assert!(WeightEntry::new(user, 0.0).validate().is_err());
        assert!(WeightEntry::new(user, f64::NAN).validate().is_err());
    }
}
