use std::collections::{BTreeMap, BTreeSet};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use wabi_monitor::{Error, Monitor, MonitorConfig, Record};

const DISEASES: [&str; 4] = ["COVID-2019", "Cold", "Flu", "Measles"];
const COUNTRIES: [&str; 3] = ["Germany", "Greece", "Italy"];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ids(records: &[&Record]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}

// ─── Worked example ──────────────────────────────────────────────────────────

#[test]
fn flu_in_greece_and_germany() {
    init_tracing();
    let records = [
        Record::new(1, "Ada", "Flu", "Greece", "2020-01-10"),
        Record::new(2, "Ben", "Flu", "Greece", "2020-02-01"),
        Record::new(3, "Cas", "Flu", "Germany", "2020-01-15"),
    ];

    let mut monitor = Monitor::new();
    for record in &records {
        assert!(!monitor.insert(record));
    }
    monitor.check_consistency();

    assert_eq!(monitor.count_records(Some("Flu"), Some("Greece"), None, None), 2);
    assert_eq!(monitor.top_diseases(1, Some("Germany")), ["Flu"]);

    assert_eq!(monitor.remove(2).map(|r| r.id), Some(2));
    monitor.check_consistency();
    assert_eq!(ids(&monitor.get_records(Some("Flu"), Some("Greece"), None, None)), [1]);
    assert_eq!(monitor.disease_count("Flu", Some("Greece")), 1);
    assert_eq!(monitor.disease_count("Flu", None), 2);
}

// ─── Queries ─────────────────────────────────────────────────────────────────

fn sample() -> Vec<Record> {
    vec![
        Record::new(10, "a", "Flu", "Greece", "2020-01-01"),
        Record::new(11, "b", "Flu", "Greece", "2020-01-05"),
        Record::new(12, "c", "Cold", "Greece", "2020-01-05"),
        Record::new(13, "d", "Flu", "Italy", "2020-01-07"),
        Record::new(14, "e", "Measles", "Italy", "2020-02-01"),
        Record::new(15, "f", "Flu", "Italy", "2020-03-01"),
        Record::new(16, "g", "Cold", "Germany", "2020-01-05"),
    ]
}

#[test]
fn date_bounds_are_inclusive() {
    let records = sample();
    let mut monitor = Monitor::new();
    for r in &records {
        monitor.insert(r);
    }

    let same_day = monitor.get_records(None, None, Some("2020-01-05"), Some("2020-01-05"));
    assert_eq!(ids(&same_day), [11, 12, 16]);
    assert_eq!(monitor.count_records(None, None, Some("2020-01-05"), Some("2020-01-05")), 3);

    assert_eq!(ids(&monitor.get_records(Some("Flu"), None, Some("2020-01-02"), None)), [11, 13, 15]);
    assert_eq!(ids(&monitor.get_records(None, Some("Italy"), None, Some("2020-02-01"))), [13, 14]);
    assert_eq!(monitor.count_records(Some("Cold"), None, None, Some("2020-01-04")), 0);
    assert_eq!(monitor.count_records(None, None, Some("2020-03-02"), None), 0);
}

#[test]
fn reversed_and_unknown_filters_match_nothing() {
    let records = sample();
    let mut monitor = Monitor::new();
    for r in &records {
        monitor.insert(r);
    }

    assert!(monitor.get_records(None, None, Some("2020-02-01"), Some("2020-01-01")).is_empty());
    assert_eq!(monitor.count_records(None, None, Some("2020-02-01"), Some("2020-01-01")), 0);
    assert_eq!(monitor.count_records(Some("Plague"), None, None, None), 0);
    assert_eq!(monitor.count_records(Some("Measles"), Some("Greece"), None, None), 0);
    assert!(monitor.get_records(None, Some("Spain"), None, None).is_empty());
    assert!(monitor.top_diseases(3, Some("Spain")).is_empty());
    assert_eq!(monitor.disease_count("Plague", Some("Greece")), 0);
}

#[test]
fn top_diseases_rank_by_count_then_name() {
    let records = sample();
    let mut monitor = Monitor::new();
    for r in &records {
        monitor.insert(r);
    }

    assert_eq!(monitor.top_diseases(10, None), ["Flu", "Cold", "Measles"]);
    assert_eq!(monitor.top_diseases(2, Some("Italy")), ["Flu", "Measles"]);
    assert_eq!(monitor.top_diseases(2, Some("Greece")), ["Flu", "Cold"]);
    assert!(monitor.top_diseases(0, None).is_empty());

    // Removing both Greek flu cases drops Flu from Greece entirely.
    monitor.remove(10);
    monitor.remove(11);
    assert_eq!(monitor.top_diseases(5, Some("Greece")), ["Cold"]);
    assert_eq!(monitor.top_diseases(1, None), ["Cold"]);
    monitor.check_consistency();
}

#[test]
fn insert_replaces_same_id() {
    init_tracing();
    let old = Record::new(7, "x", "Flu", "Greece", "2020-01-01");
    let new = Record::new(7, "x", "Cold", "Italy", "2020-05-05");

    let mut monitor = Monitor::new();
    assert!(!monitor.insert(&old));
    assert!(monitor.insert(&new));
    monitor.check_consistency();

    assert_eq!(monitor.len(), 1);
    assert_eq!(monitor.get(7), Some(&new));
    assert_eq!(monitor.count_records(Some("Flu"), None, None, None), 0);
    assert!(monitor.top_diseases(1, Some("Greece")).is_empty());
    assert_eq!(monitor.top_diseases(1, None), ["Cold"]);

    assert_eq!(monitor.remove(7), Some(&new));
    assert_eq!(monitor.remove(7), None);
    assert!(monitor.is_empty());
    monitor.check_consistency();
}

#[test]
fn clear_forgets_everything() {
    let records = sample();
    let mut monitor = Monitor::new();
    for r in &records {
        monitor.insert(r);
    }
    monitor.clear();
    monitor.check_consistency();
    assert!(monitor.is_empty());
    assert!(monitor.top_diseases(3, None).is_empty());

    monitor.insert(&records[0]);
    assert_eq!(monitor.count_records(None, None, None, None), 1);
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[test]
fn config_from_json() {
    let config: MonitorConfig = serde_json::from_str(r#"{ "id_capacity": 500, "max_load_factor": 0.75 }"#).unwrap();
    assert_eq!(
        config,
        MonitorConfig {
            id_capacity: 500,
            max_load_factor: 0.75,
        }
    );
    let monitor = Monitor::with_config(config.clone()).unwrap();
    assert_eq!(monitor.config(), &config);

    let defaults: MonitorConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, MonitorConfig::default());

    assert!(serde_json::from_str::<MonitorConfig>(r#"{ "capacity": 1 }"#).is_err());
}

#[test]
fn invalid_config_is_rejected() {
    let config = MonitorConfig {
        max_load_factor: -0.5,
        ..MonitorConfig::default()
    };
    assert!(matches!(Monitor::with_config(config), Err(Error::InvalidConfig(_))));

    let config = MonitorConfig {
        id_capacity: 1,
        max_load_factor: 1e-300,
    };
    assert!(config.validate().is_err());
    assert!(matches!(Monitor::with_config(config), Err(Error::InvalidConfig(_))));
}

#[test]
fn sparse_config_still_indexes() {
    let config = MonitorConfig {
        id_capacity: 1,
        max_load_factor: wabi_monitor::hash_map::MIN_MAX_LOAD_FACTOR,
    };
    let records = sample();
    let mut monitor = Monitor::with_config(config).unwrap();
    for r in &records {
        monitor.insert(r);
    }
    monitor.check_consistency();
    assert_eq!(monitor.count_records(Some("Flu"), None, None, None), 4);
}

#[test]
fn records_round_trip_through_json() {
    let json = r#"[
        { "id": 1, "name": "Ada", "disease": "Flu", "country": "Greece", "date": "2020-01-10" },
        { "id": 2, "name": "Ben", "disease": "Cold", "country": "Greece", "date": "2020-01-11" }
    ]"#;
    let records: Vec<Record> = serde_json::from_str(json).unwrap();
    let mut monitor = Monitor::new();
    for r in &records {
        monitor.insert(r);
    }
    assert_eq!(monitor.top_diseases(2, Some("Greece")), ["Cold", "Flu"]);
}

// ─── Randomized consistency ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum StoreOp {
    Insert(usize),
    Remove(i64),
}

fn store_op_strategy(pool: usize) -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        3 => (0..pool).prop_map(StoreOp::Insert),
        2 => (0..pool as i64 / 2).prop_map(StoreOp::Remove),
    ]
}

fn pool() -> Vec<Record> {
    // Ids repeat so inserts also exercise replacement.
    (0..120)
        .map(|i: i64| {
            let disease = DISEASES[(i * 7 % 4) as usize];
            let country = COUNTRIES[(i % 3) as usize];
            let date = format!("2020-{:02}-{:02}", 1 + i % 3, 1 + i * 11 % 28);
            Record::new(i / 2, format!("p{i}"), disease, country, date)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// After every mutation the indexes agree with each other and with a plain model.
    #[test]
    fn indexes_stay_consistent(ops in proptest::collection::vec(store_op_strategy(120), 0..300)) {
        let pool = pool();
        let mut monitor = Monitor::new();
        let mut model: BTreeMap<i64, &Record> = BTreeMap::new();

        for op in &ops {
            match op {
                StoreOp::Insert(i) => {
                    let record = &pool[*i];
                    let replaced = monitor.insert(record);
                    prop_assert_eq!(replaced, model.insert(record.id, record).is_some());
                }
                StoreOp::Remove(id) => {
                    prop_assert_eq!(monitor.remove(*id).map(|r| r.id), model.remove(id).map(|r| r.id));
                }
            }
            monitor.check_consistency();
            prop_assert_eq!(monitor.len(), model.len());
        }

        let all: BTreeSet<i64> = monitor.get_records(None, None, None, None).iter().map(|r| r.id).collect();
        prop_assert_eq!(all, model.keys().copied().collect::<BTreeSet<_>>());

        for country in COUNTRIES {
            for disease in DISEASES {
                let mut expected: Vec<&Record> = model
                    .values()
                    .filter(|r| r.country == country && r.disease == disease)
                    .copied()
                    .collect();
                expected.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
                let got = monitor.get_records(Some(disease), Some(country), None, None);
                prop_assert_eq!(ids(&got), ids(&expected));
                prop_assert_eq!(monitor.count_records(Some(disease), Some(country), None, None), expected.len());
                prop_assert_eq!(monitor.disease_count(disease, Some(country)), expected.len());

                let from = "2020-01-15";
                let to = "2020-02-20";
                let windowed = expected.iter().filter(|r| r.date.as_str() >= from && r.date.as_str() <= to).count();
                prop_assert_eq!(monitor.count_records(Some(disease), Some(country), Some(from), Some(to)), windowed);
            }

            let top = monitor.top_diseases(DISEASES.len(), Some(country));
            let counts: Vec<usize> = top.iter().map(|d| monitor.disease_count(d, Some(country))).collect();
            prop_assert!(counts.windows(2).all(|w| w[0] >= w[1]), "top_diseases not descending: {:?}", counts);
            prop_assert!(counts.iter().all(|&c| c > 0));
        }
    }
}
