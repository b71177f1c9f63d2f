use serde::{Deserialize, Serialize};

/// One reported case.
///
/// The monitor only borrows records; the caller keeps ownership and cannot mutate a record
/// while the monitor holds it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier. Inserting another record with the same id replaces this one.
    pub id: i64,
    /// Patient name.
    pub name: String,
    /// Disease name, e.g. `"COVID-2019"`.
    pub disease: String,
    /// Country name.
    pub country: String,
    /// Report date as `YYYY-MM-DD`. Dates order lexicographically.
    pub date: String,
}

impl Record {
    /// Builds a record from its fields.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        disease: impl Into<String>,
        country: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Record {
            id,
            name: name.into(),
            disease: disease.into(),
            country: country.into(),
            date: date.into(),
        }
    }
}
