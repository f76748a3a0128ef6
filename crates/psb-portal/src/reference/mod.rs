//! Out-of-band loading of the static location lookups.
//!
//! Counties, constituencies and wards arrive as CSV exports with `code,name` columns and a
//! `county_code` or `constituency_code` parent column. Rows are upserted by code, so an import
//! can be rerun after corrections.

mod parser;
pub mod seed;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::storage::{ReferenceStore, StoreError};
use parser::LocationRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Counties,
    Constituencies,
    Wards,
}

impl LocationKind {
    pub fn label(self) -> &'static str {
        match self {
            LocationKind::Counties => "counties",
            LocationKind::Constituencies => "constituencies",
            LocationKind::Wards => "wards",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub upserted: usize,
    /// Line numbers of rows whose parent code matched nothing.
    pub skipped_lines: Vec<u64>,
}

#[derive(Debug)]
pub enum ReferenceImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Store(StoreError),
}

impl std::fmt::Display for ReferenceImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceImportError::Io(err) => write!(f, "failed to read reference export: {}", err),
            ReferenceImportError::Csv(err) => write!(f, "invalid reference CSV data: {}", err),
            ReferenceImportError::Store(err) => {
                write!(f, "could not store reference data: {}", err)
            }
        }
    }
}

impl std::error::Error for ReferenceImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReferenceImportError::Io(err) => Some(err),
            ReferenceImportError::Csv(err) => Some(err),
            ReferenceImportError::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ReferenceImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ReferenceImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<StoreError> for ReferenceImportError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

pub struct ReferenceImporter;

impl ReferenceImporter {
    pub async fn from_path<S, P>(
        store: &S,
        kind: LocationKind,
        path: P,
    ) -> Result<ImportSummary, ReferenceImportError>
    where
        S: ReferenceStore + ?Sized,
        P: AsRef<Path>,
    {
        let bytes = tokio::fs::read(path).await?;
        Self::from_reader(store, kind, bytes.as_slice()).await
    }

    pub async fn from_reader<S, R>(
        store: &S,
        kind: LocationKind,
        reader: R,
    ) -> Result<ImportSummary, ReferenceImportError>
    where
        S: ReferenceStore + ?Sized,
        R: Read,
    {
        let rows = parser::parse_rows(reader)?;
        let summary = match kind {
            LocationKind::Counties => import_counties(store, rows).await?,
            LocationKind::Constituencies => import_constituencies(store, rows).await?,
            LocationKind::Wards => import_wards(store, rows).await?,
        };
        info!(
            kind = kind.label(),
            upserted = summary.upserted,
            skipped = summary.skipped_lines.len(),
            "reference import finished"
        );
        Ok(summary)
    }
}

async fn import_counties<S>(store: &S, rows: Vec<LocationRow>) -> Result<ImportSummary, StoreError>
where
    S: ReferenceStore + ?Sized,
{
    let mut summary = ImportSummary::default();
    for row in rows {
        store.upsert_county(&row.code, &row.name).await?;
        summary.upserted += 1;
    }
    Ok(summary)
}

async fn import_constituencies<S>(
    store: &S,
    rows: Vec<LocationRow>,
) -> Result<ImportSummary, StoreError>
where
    S: ReferenceStore + ?Sized,
{
    let counties: HashMap<String, i32> = store
        .counties()
        .await?
        .into_iter()
        .map(|county| (county.code, county.id))
        .collect();

    let mut summary = ImportSummary::default();
    for row in rows {
        match parent_id(&counties, &row) {
            Some(county_id) => {
                store
                    .upsert_constituency(&row.code, &row.name, county_id)
                    .await?;
                summary.upserted += 1;
            }
            None => skip(&mut summary, &row, "county"),
        }
    }
    Ok(summary)
}

async fn import_wards<S>(store: &S, rows: Vec<LocationRow>) -> Result<ImportSummary, StoreError>
where
    S: ReferenceStore + ?Sized,
{
    let mut constituencies = HashMap::new();
    for county in store.counties().await? {
        for constituency in store.constituencies(county.id).await? {
            constituencies.insert(constituency.code, constituency.id);
        }
    }

    let mut summary = ImportSummary::default();
    for row in rows {
        match parent_id(&constituencies, &row) {
            Some(constituency_id) => {
                store
                    .upsert_ward(&row.code, &row.name, constituency_id)
                    .await?;
                summary.upserted += 1;
            }
            None => skip(&mut summary, &row, "constituency"),
        }
    }
    Ok(summary)
}

fn parent_id(parents: &HashMap<String, i32>, row: &LocationRow) -> Option<i32> {
    row.parent_code
        .as_deref()
        .and_then(|code| parents.get(code).copied())
}

fn skip(summary: &mut ImportSummary, row: &LocationRow, parent: &str) {
    warn!(
        line = row.line,
        code = %row.code,
        parent_code = row.parent_code.as_deref().unwrap_or(""),
        "skipping row with unknown {parent}"
    );
    summary.skipped_lines.push(row.line);
}
