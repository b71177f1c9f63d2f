use core::cmp::Ordering;

use super::Record;
use crate::comparator::Comparator;

/// Orders records by date, then by id.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ByDate;

/// A position in the date order that no record occupies unless its id is at the extreme.
///
/// `starting` sorts before every record of `date`, `through` after every one of them, so
/// both bounds of a date range are inclusive.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DateBound<'q> {
    date: &'q str,
    id: i64,
}

impl<'q> DateBound<'q> {
    pub(crate) fn starting(date: &'q str) -> Self {
        DateBound { date, id: i64::MIN }
    }

    pub(crate) fn through(date: &'q str) -> Self {
        DateBound { date, id: i64::MAX }
    }
}

impl<'r> Comparator<&'r Record> for ByDate {
    fn compare(&self, probe: &&'r Record, element: &&'r Record) -> Ordering {
        probe.date.cmp(&element.date).then(probe.id.cmp(&element.id))
    }
}

impl<'r> Comparator<&'r Record, DateBound<'_>> for ByDate {
    fn compare(&self, probe: &DateBound<'_>, element: &&'r Record) -> Ordering {
        probe.date.cmp(&element.date).then(probe.id.cmp(&element.id))
    }
}

/// Number of present records of one disease, within one country or overall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DiseaseCount<'r> {
    pub(crate) disease: &'r str,
    pub(crate) count: usize,
}

/// Ranks higher counts first; equal counts rank the alphabetically smaller disease first.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ByCount;

impl<'r> Comparator<DiseaseCount<'r>> for ByCount {
    fn compare(&self, probe: &DiseaseCount<'r>, element: &DiseaseCount<'r>) -> Ordering {
        probe.count.cmp(&element.count).then(element.disease.cmp(probe.disease))
    }
}
