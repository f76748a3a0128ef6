use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One CSV line: the row's own code and name, plus the parent's code when it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocationRow {
    pub(crate) line: u64,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) parent_code: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<LocationRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RawRow>().enumerate() {
        let raw = record?;
        rows.push(LocationRow {
            // header is line 1
            line: index as u64 + 2,
            code: raw.code,
            name: raw.name,
            parent_code: raw.county_code.or(raw.constituency_code),
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RawRow {
    code: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    county_code: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    constituency_code: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
