use std::collections::BTreeSet;

use log::debug;
use serde::Serialize;

use crate::loader::Dataset;
use crate::models::{FilterOptions, Record, TimeOfDay};

/// Declarative restriction on the record set. An empty dimension places no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterPredicate {
    pub regions: BTreeSet<String>,
    pub times_of_day: BTreeSet<TimeOfDay>,
    pub year: Option<i32>,
}

impl FilterPredicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions.extend(regions.into_iter().map(Into::into));
        self
    }

    pub fn with_times_of_day<I>(mut self, times: I) -> Self
    where
        I: IntoIterator<Item = TimeOfDay>,
    {
        self.times_of_day.extend(times);
        self
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        (self.regions.is_empty() || self.regions.contains(&record.region_id))
            && (self.times_of_day.is_empty() || self.times_of_day.contains(&record.time_of_day))
            && self.year.map_or(true, |year| record.year == year)
    }

    pub fn apply<'a>(&self, dataset: &'a Dataset) -> View<'a> {
        let records: Vec<&Record> = dataset
            .records()
            .iter()
            .filter(|record| self.matches(record))
            .collect();
        debug!(
            "filter {:?} kept {} of {} records",
            self,
            records.len(),
            dataset.len()
        );
        View { records }
    }
}

/// Read-only subset of a dataset produced by one filter pass.
#[derive(Debug, Clone, Default)]
pub struct View<'a> {
    records: Vec<&'a Record>,
}

impl<'a> View<'a> {
    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_sales(&self) -> f64 {
        self.iter().map(|record| record.total_sales).sum()
    }
}

/// Distinct selector values present in the dataset.
///
/// Regions sort numerically when every id is an integer, lexically otherwise.
pub fn filter_options(dataset: &Dataset) -> FilterOptions {
    let regions: BTreeSet<&str> = dataset
        .records()
        .iter()
        .map(|record| record.region_id.as_str())
        .collect();
    let years: BTreeSet<i32> = dataset.records().iter().map(|record| record.year).collect();

    let mut regions: Vec<String> = regions.into_iter().map(str::to_string).collect();
    if regions.iter().all(|region| region.parse::<i64>().is_ok()) {
        regions.sort_by_key(|region| region.parse::<i64>().unwrap_or_default());
    }

    FilterOptions {
        regions,
        years: years.into_iter().collect(),
        times_of_day: TimeOfDay::ALL.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::dataset_from;

    fn sample() -> Dataset {
        dataset_from(&[
            "2023-01-05 09:00:00,9,Thursday,P1,1,S1,2,100,20,false,2023,1",
            "2023-01-06 22:00:00,22,Friday,P2,1,S2,1,50,5,true,2023,1",
            "2024-02-01 13:00:00,13,Thursday,P1,2,S1,4,200,40,false,2024,2",
        ])
    }

    #[test]
    fn unrestricted_filter_keeps_everything() {
        let dataset = sample();
        assert_eq!(FilterPredicate::all().apply(&dataset).len(), 3);
    }

    #[test]
    fn dimensions_are_anded_and_sets_are_ored() {
        let dataset = sample();
        let view = FilterPredicate::all()
            .with_regions(["1", "2"])
            .with_times_of_day([TimeOfDay::Morning, TimeOfDay::Afternoon])
            .apply(&dataset);
        assert_eq!(view.len(), 2);

        let view = FilterPredicate::all()
            .with_regions(["1"])
            .with_year(Some(2024))
            .apply(&dataset);
        assert!(view.is_empty());
    }

    #[test]
    fn unknown_region_yields_empty_view() {
        let dataset = sample();
        let view = FilterPredicate::all().with_regions(["9"]).apply(&dataset);
        assert!(view.is_empty());
        assert_eq!(view.total_sales(), 0.0);
    }

    #[test]
    fn options_are_sorted_and_distinct() {
        let options = filter_options(&sample());
        assert_eq!(options.regions, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(options.years, vec![2023, 2024]);
        assert_eq!(options.times_of_day.len(), 4);
    }

    #[test]
    fn numeric_regions_sort_by_value() {
        let dataset = dataset_from(&[
            "2023-01-05,9,Thursday,P1,10,S1,1,10,1,false,2023,1",
            "2023-01-05,9,Thursday,P1,2,S1,1,10,1,false,2023,1",
            "2023-01-05,9,Thursday,P1,1,S1,1,10,1,false,2023,1",
        ]);
        assert_eq!(filter_options(&dataset).regions, vec!["1", "2", "10"]);

        let dataset = dataset_from(&[
            "2023-01-05,9,Thursday,P1,North,S1,1,10,1,false,2023,1",
            "2023-01-05,9,Thursday,P1,10,S1,1,10,1,false,2023,1",
            "2023-01-05,9,Thursday,P1,2,S1,1,10,1,false,2023,1",
        ]);
        assert_eq!(filter_options(&dataset).regions, vec!["10", "2", "North"]);
    }
}
