//! Aggregate value types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Running temperature sum and sample count for one (city, year) pair.
///
/// `count == 0` never appears in a populated map; an absent entry means
/// "no samples" by convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YearAggregate {
    /// Sum of all sampled temperatures
    pub sum: f64,
    /// Number of samples behind `sum`
    pub count: u64,
}

impl YearAggregate {
    /// Fold one temperature sample into the aggregate.
    pub fn add_sample(&mut self, temperature: f64) {
        self.sum += temperature;
        self.count += 1;
    }

    /// Combine another partial aggregate into this one. Addition is
    /// commutative, so merge order never affects the result.
    pub fn merge(&mut self, other: YearAggregate) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Average temperature, or `None` for an empty aggregate.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Year-keyed aggregates for a single city.
pub type CityAggregates = BTreeMap<i32, YearAggregate>;

/// One yearly average as served over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyAverage {
    /// Calendar year
    pub year: i32,
    /// Average temperature, rounded to one decimal place
    pub average_temperature: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sample_and_average() {
        let mut agg = YearAggregate::default();
        assert_eq!(agg.average(), None);

        agg.add_sample(10.0);
        agg.add_sample(20.0);
        assert_eq!(agg.count, 2);
        assert_eq!(agg.average(), Some(15.0));
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = YearAggregate { sum: 30.0, count: 2 };
        let b = YearAggregate { sum: 5.0, count: 1 };

        let mut left = a;
        left.merge(b);
        let mut right = b;
        right.merge(a);

        assert_eq!(left, right);
        assert_eq!(left.average(), Some(35.0 / 3.0));
    }
}
