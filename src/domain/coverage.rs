//! Cached coverage results that gate the economic analysis

use crate::domain::types::InputError;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoverageCache {
    population_score: Option<f64>,
    area_km2: Option<f64>,
}

impl CoverageCache {
    pub fn set_population_score(&mut self, score: f64) {
        self.population_score = Some(score);
    }

    pub fn set_area_km2(&mut self, area_km2: f64) {
        self.area_km2 = Some(area_km2);
    }

    pub fn population_score(&self) -> Option<f64> {
        self.population_score
    }

    pub fn area_km2(&self) -> Option<f64> {
        self.area_km2
    }

    /// `(population, area_km2)` once both coverage queries have succeeded
    pub fn economics_inputs(&self) -> Result<(f64, f64), InputError> {
        match (self.population_score, self.area_km2) {
            (Some(population), Some(area)) => Ok((population, area)),
            _ => Err(InputError::CoverageIncomplete),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_economics_requires_both_values() {
        let mut cache = CoverageCache::default();
        assert_eq!(cache.economics_inputs(), Err(InputError::CoverageIncomplete));

        cache.set_population_score(1200.0);
        assert_eq!(cache.economics_inputs(), Err(InputError::CoverageIncomplete));

        cache.set_area_km2(5.3e6);
        assert_eq!(cache.economics_inputs(), Ok((1200.0, 5.3e6)));

        cache.clear();
        assert_eq!(cache.population_score(), None);
        assert_eq!(cache.area_km2(), None);
    }
}
