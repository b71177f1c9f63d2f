//! A multi-index store of disease case records.
//!
//! [`Monitor`] keeps the same set of borrowed [`Record`]s in several containers at once,
//! each shaped for one query:
//!
//! - an id index for uniqueness and removal,
//! - date-ordered [`OrderedSet`]s: one global, one per country, one per disease and one per
//!   (country, disease) pair, for range and count queries,
//! - [`IndexableHeap`]s of case counts, one per country plus one global, for top-k queries.
//!
//! Every mutation updates all of them before returning.

use core::borrow::Borrow;
use core::hash::Hash;

use tracing::{debug, trace};

use crate::error::Result;
use crate::hash_map::HashMap;
use crate::heap::{HeapNode, IndexableHeap};
use crate::ordered_set::OrderedSet;

mod config;
mod order;
mod record;

pub use config::MonitorConfig;
pub use record::Record;

use order::{ByCount, ByDate, DateBound, DiseaseCount};

type RecordSet<'r> = OrderedSet<&'r Record, ByDate>;
type CountHeap<'r> = IndexableHeap<DiseaseCount<'r>, ByCount>;

/// Answers range, count and top-k queries over a set of case records.
///
/// Records are borrowed for `'r`, so the monitor never copies or frees them and the
/// borrow checker keeps them unchanged while they are stored.
///
/// Query filters are optional: `None` means "any". Date bounds are inclusive.
///
/// # Examples
///
/// ```
/// use wabi_monitor::{Monitor, Record};
///
/// let records = [
///     Record::new(1, "Ada", "Flu", "Greece", "2020-01-10"),
///     Record::new(2, "Ben", "Flu", "Greece", "2020-02-01"),
///     Record::new(3, "Cas", "Flu", "Germany", "2020-01-15"),
/// ];
///
/// let mut monitor = Monitor::new();
/// for record in &records {
///     monitor.insert(record);
/// }
///
/// assert_eq!(monitor.count_records(Some("Flu"), Some("Greece"), None, None), 2);
/// assert_eq!(monitor.top_diseases(1, Some("Germany")), ["Flu"]);
///
/// monitor.remove(2);
/// assert_eq!(monitor.get_records(Some("Flu"), Some("Greece"), None, None), [&records[0]]);
/// ```
#[derive(Debug)]
pub struct Monitor<'r> {
    config: MonitorConfig,
    by_id: HashMap<i64, &'r Record>,
    all: RecordSet<'r>,
    by_country: HashMap<&'r str, RecordSet<'r>>,
    by_disease: HashMap<&'r str, RecordSet<'r>>,
    // Keyed by (country, disease).
    by_pair: HashMap<(&'r str, &'r str), RecordSet<'r>>,
    country_heaps: HashMap<&'r str, CountHeap<'r>>,
    global_heap: CountHeap<'r>,
    pair_nodes: HashMap<(&'r str, &'r str), HeapNode>,
    disease_nodes: HashMap<&'r str, HeapNode>,
}

impl Default for Monitor<'_> {
    fn default() -> Self {
        Monitor::new()
    }
}

impl<'r> Monitor<'r> {
    /// Creates an empty monitor with the default [`MonitorConfig`].
    #[must_use]
    pub fn new() -> Self {
        Monitor {
            config: MonitorConfig::default(),
            by_id: HashMap::new(),
            all: OrderedSet::with_comparator(ByDate),
            by_country: HashMap::new(),
            by_disease: HashMap::new(),
            by_pair: HashMap::new(),
            country_heaps: HashMap::new(),
            global_heap: IndexableHeap::with_comparator(ByCount),
            pair_nodes: HashMap::new(),
            disease_nodes: HashMap::new(),
        }
    }

    /// Creates an empty monitor tuned by `config`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the configuration fails
    /// [`MonitorConfig::validate`].
    pub fn with_config(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        let load_factor = config.max_load_factor;
        Ok(Monitor {
            by_id: HashMap::with_capacity_and_load_factor(config.id_capacity, load_factor)?,
            by_country: HashMap::with_load_factor(load_factor)?,
            by_disease: HashMap::with_load_factor(load_factor)?,
            by_pair: HashMap::with_load_factor(load_factor)?,
            country_heaps: HashMap::with_load_factor(load_factor)?,
            pair_nodes: HashMap::with_load_factor(load_factor)?,
            disease_nodes: HashMap::with_load_factor(load_factor)?,
            config,
            ..Monitor::new()
        })
    }

    /// Returns the configuration the monitor was built with.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Returns the number of records present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no record is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Returns the record with `id`.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&'r Record> {
        self.by_id.get(&id).copied()
    }

    /// Forgets every record.
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.all.clear();
        self.by_country.clear();
        self.by_disease.clear();
        self.by_pair.clear();
        self.country_heaps.clear();
        self.global_heap.clear();
        self.pair_nodes.clear();
        self.disease_nodes.clear();
        debug!("cleared monitor");
    }

    /// Adds `record`, replacing a present record with the same id.
    ///
    /// Returns `true` if a record was replaced.
    ///
    /// # Complexity
    ///
    /// O(log n) on average.
    pub fn insert(&mut self, record: &'r Record) -> bool {
        let replaced = self.unindex(record.id).is_some();
        let country = record.country.as_str();
        let disease = record.disease.as_str();

        self.by_id.insert(record.id, record);
        let fresh = !self.all.insert(record);
        debug_assert!(fresh, "record {} was still in the global index", record.id);
        add_to(&mut self.by_country, country, record, "country");
        add_to(&mut self.by_disease, disease, record, "disease");
        add_to(&mut self.by_pair, (country, disease), record, "country and disease");

        let heap = self.country_heaps.get_or_insert_with(country, || {
            trace!(country, "created country heap");
            IndexableHeap::with_comparator(ByCount)
        });
        count_up(heap, &mut self.pair_nodes, (country, disease), disease);
        count_up(&mut self.global_heap, &mut self.disease_nodes, disease, disease);

        debug!(id = record.id, replaced, "inserted record");
        replaced
    }

    /// Removes the record with `id`, returning it.
    ///
    /// # Panics
    ///
    /// If the indexes disagree about the record. That means the monitor's own bookkeeping is
    /// broken.
    pub fn remove(&mut self, id: i64) -> Option<&'r Record> {
        let record = self.unindex(id)?;
        debug!(id, "removed record");
        Some(record)
    }

    fn unindex(&mut self, id: i64) -> Option<&'r Record> {
        let record = *self.by_id.get(&id)?;
        let country = record.country.as_str();
        let disease = record.disease.as_str();

        assert!(self.all.remove(&record), "record {id} missing from the global index");
        remove_from(&mut self.by_country, country, record, "country");
        remove_from(&mut self.by_disease, disease, record, "disease");
        remove_from(&mut self.by_pair, &(country, disease), record, "country and disease");

        let heap = self
            .country_heaps
            .get_mut(country)
            .unwrap_or_else(|| panic!("record {id} has no heap for country {country:?}"));
        count_down(heap, &mut self.pair_nodes, &(country, disease), id);
        if heap.is_empty() {
            self.country_heaps.remove(country);
            trace!(country, "dropped country heap");
        }
        count_down(&mut self.global_heap, &mut self.disease_nodes, disease, id);

        self.by_id.remove(&id);
        Some(record)
    }

    // The interned key of a (country, disease) pair, if any record carries it.
    fn pair_key(&self, country: &str, disease: &str) -> Option<(&'r str, &'r str)> {
        let (&country, _) = self.by_country.get_key_value(country)?;
        let (&disease, _) = self.by_disease.get_key_value(disease)?;
        Some((country, disease))
    }

    fn select(&self, disease: Option<&str>, country: Option<&str>) -> Option<&RecordSet<'r>> {
        match (disease, country) {
            (None, None) => Some(&self.all),
            (Some(disease), None) => self.by_disease.get(disease),
            (None, Some(country)) => self.by_country.get(country),
            (Some(disease), Some(country)) => self.by_pair.get(&self.pair_key(country, disease)?),
        }
    }

    /// Returns the matching records, ascending by date and then id.
    ///
    /// # Complexity
    ///
    /// O(log n + m) on average for m matches.
    pub fn get_records(
        &self,
        disease: Option<&str>,
        country: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Vec<&'r Record> {
        let Some(set) = self.select(disease, country) else {
            return Vec::new();
        };
        let from = date_from.map(DateBound::starting);
        let to = date_to.map(DateBound::through);
        let records: Vec<&'r Record> = set.return_from_to(from.as_ref(), to.as_ref()).into_iter().copied().collect();
        trace!(?disease, ?country, ?date_from, ?date_to, hits = records.len(), "get_records");
        records
    }

    /// Returns how many records match, without visiting them.
    ///
    /// A range whose start lies after its end matches nothing.
    ///
    /// # Complexity
    ///
    /// O(log n) on average.
    #[must_use]
    pub fn count_records(
        &self,
        disease: Option<&str>,
        country: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> usize {
        let Some(set) = self.select(disease, country) else {
            return 0;
        };
        let before = date_from.map_or(0, |date| set.count_less_than(&DateBound::starting(date)));
        let after = date_to.map_or(0, |date| set.count_greater_than(&DateBound::through(date)));
        let count = set.len().saturating_sub(before + after);
        trace!(?disease, ?country, ?date_from, ?date_to, count, "count_records");
        count
    }

    /// Returns up to `k` diseases with the most records, most first.
    ///
    /// With a `country` only that country's records count. Diseases with equal counts are
    /// listed alphabetically. Only diseases with at least one record are listed.
    ///
    /// # Complexity
    ///
    /// O(k log k)
    #[must_use]
    pub fn top_diseases(&self, k: usize, country: Option<&str>) -> Vec<&'r str> {
        let heap = match country {
            None => &self.global_heap,
            Some(country) => match self.country_heaps.get(country) {
                Some(heap) => heap,
                None => return Vec::new(),
            },
        };
        heap.top_k(k).into_iter().map(|count| count.disease).collect()
    }

    /// Returns how many present records have `disease`, optionally within one country.
    #[must_use]
    pub fn disease_count(&self, disease: &str, country: Option<&str>) -> usize {
        let count = match country {
            None => self
                .disease_nodes
                .get(disease)
                .and_then(|&node| self.global_heap.get(node)),
            Some(country) => self
                .pair_key(country, disease)
                .and_then(|key| self.pair_nodes.get(&key))
                .zip(self.country_heaps.get(country))
                .and_then(|(&node, heap)| heap.get(node)),
        };
        count.map_or(0, |count| count.count)
    }

    /// Verifies that every index holds exactly the records of the id index.
    ///
    /// # Panics
    ///
    /// On the first disagreement found.
    pub fn check_consistency(&self) {
        assert_eq!(self.all.len(), self.by_id.len(), "global index size differs from id index");
        for record in &self.all {
            let stored = self.by_id.get(&record.id);
            assert!(
                stored.is_some_and(|stored| core::ptr::eq(*stored, *record)),
                "record {} in the global index is not the one in the id index",
                record.id
            );
        }

        check_partition(&self.by_country, &self.by_id, "country");
        check_partition(&self.by_disease, &self.by_id, "disease");
        check_partition(&self.by_pair, &self.by_id, "country and disease");
        for (&country, set) in self.by_country.iter() {
            assert!(set.iter().all(|r| r.country == country), "country index {country:?} is mixed");
        }
        for (&disease, set) in self.by_disease.iter() {
            assert!(set.iter().all(|r| r.disease == disease), "disease index {disease:?} is mixed");
        }
        for (&(country, disease), set) in self.by_pair.iter() {
            assert!(
                set.iter().all(|r| r.country == country && r.disease == disease),
                "pair index ({country:?}, {disease:?}) is mixed"
            );
        }

        assert_eq!(self.pair_nodes.len(), self.by_pair.len(), "pair heap nodes differ from pair index");
        for (&(country, disease), &node) in self.pair_nodes.iter() {
            let count = self
                .country_heaps
                .get(country)
                .and_then(|heap| heap.get(node))
                .unwrap_or_else(|| panic!("pair ({country:?}, {disease:?}) has no live heap node"));
            let expected = self.by_pair.get(&(country, disease)).map_or(0, OrderedSet::len);
            assert_eq!(count.disease, disease, "heap node of ({country:?}, {disease:?}) holds another disease");
            assert_eq!(count.count, expected, "stale count for ({country:?}, {disease:?})");
        }
        let heaped: usize = self.country_heaps.values().map(IndexableHeap::len).sum();
        assert_eq!(heaped, self.pair_nodes.len(), "country heaps hold untracked nodes");
        assert_eq!(self.country_heaps.len(), self.by_country.len(), "country heaps differ from country index");

        assert_eq!(self.global_heap.len(), self.by_disease.len(), "global heap differs from disease index");
        assert_eq!(self.disease_nodes.len(), self.by_disease.len(), "disease heap nodes differ from disease index");
        for (&disease, &node) in self.disease_nodes.iter() {
            let count = self
                .global_heap
                .get(node)
                .unwrap_or_else(|| panic!("disease {disease:?} has no live heap node"));
            let expected = self.by_disease.get(disease).map_or(0, OrderedSet::len);
            assert_eq!(count.count, expected, "stale count for {disease:?}");
        }
    }
}

fn add_to<'r, K: Hash + Eq>(sets: &mut HashMap<K, RecordSet<'r>>, key: K, record: &'r Record, index: &'static str) {
    let set = sets.get_or_insert_with(key, || {
        trace!(index, "created set");
        OrderedSet::with_comparator(ByDate)
    });
    let fresh = !set.insert(record);
    debug_assert!(fresh, "record {} was still in the {index} index", record.id);
}

fn remove_from<'r, K, Q>(sets: &mut HashMap<K, RecordSet<'r>>, key: &Q, record: &'r Record, index: &'static str)
where
    K: Borrow<Q> + Hash + Eq,
    Q: Hash + Eq + ?Sized,
{
    let set = sets
        .get_mut(key)
        .unwrap_or_else(|| panic!("record {} has no {index} index", record.id));
    assert!(set.remove(&record), "record {} missing from the {index} index", record.id);
    if set.is_empty() {
        sets.remove(key);
        trace!(index, "dropped empty set");
    }
}

fn count_up<'r, K: Hash + Eq>(heap: &mut CountHeap<'r>, nodes: &mut HashMap<K, HeapNode>, key: K, disease: &'r str) {
    if let Some(&node) = nodes.get(&key) {
        heap.update(node, |c| c.count += 1)
            .unwrap_or_else(|error| panic!("count of {disease:?} lost its heap node: {error}"));
    } else {
        let node = heap.insert(DiseaseCount { disease, count: 1 });
        nodes.insert(key, node);
    }
}

fn count_down<K, Q>(heap: &mut CountHeap<'_>, nodes: &mut HashMap<K, HeapNode>, key: &Q, id: i64)
where
    K: Borrow<Q> + Hash + Eq,
    Q: Hash + Eq + ?Sized,
{
    let node = *nodes
        .get(key)
        .unwrap_or_else(|| panic!("record {id} has no case count node"));
    let count = heap
        .get(node)
        .unwrap_or_else(|| panic!("record {id} has a stale case count node"))
        .count;
    let result = if count == 1 {
        nodes.remove(key);
        heap.remove_node(node).map(drop)
    } else {
        heap.update(node, |c| c.count -= 1)
    };
    if let Err(error) = result {
        panic!("record {id} could not update its case count: {error}");
    }
}

// Each record of the id index lives in exactly one set of a partitioning index.
fn check_partition<K>(sets: &HashMap<K, RecordSet<'_>>, by_id: &HashMap<i64, &Record>, index: &str) {
    let total: usize = sets.values().map(OrderedSet::len).sum();
    let len = by_id.len();
    assert_eq!(total, len, "{index} index holds {total} records, id index holds {len}");
    assert!(sets.values().all(|set| !set.is_empty()), "{index} index keeps an empty set");
    for record in sets.values().flat_map(OrderedSet::iter) {
        let stored = by_id.get(&record.id);
        assert!(
            stored.is_some_and(|stored| core::ptr::eq(*stored, *record)),
            "record {} in the {index} index is not the one in the id index",
            record.id
        );
    }
}
