//! Seed data read on start.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::model::User;

/// Errors that may occur while loading a fixture file.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize fixture: {0}")]
    Deserialize(#[from] serde_yaml::Error),
}

/// Stored report, referencing its author by id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    pub id: String,
    /// Kept as text: values are validated when joined.
    pub risk_level: String,
    pub anomaly_description: String,
    pub ppe_recommendation: String,
    pub infrastructure_suggestion: String,
    pub legal_reference: String,
    pub location: String,
    pub date: String,
    pub image_url: String,
    pub user_id: u64,
}

fn read<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, Error> {
    let file = File::open(path)?;
    Ok(serde_yaml::from_reader(file)?)
}

pub fn load_users(path: &Path) -> Result<Vec<User>, Error> {
    let users = read(path)?;
    tracing::info!(path = %path.display(), "users fixture loaded");
    Ok(users)
}

pub fn load_reports(path: &Path) -> Result<Vec<RawReport>, Error> {
    let reports = read(path)?;
    tracing::info!(path = %path.display(), "reports fixture loaded");
    Ok(reports)
}

/// Bundled users, for tests.
#[cfg(test)]
pub fn users() -> Vec<User> {
    serde_yaml::from_str(include_str!("../fixtures/users.yaml"))
        .expect("invalid users fixture")
}

/// Bundled reports, for tests.
#[cfg(test)]
pub fn reports() -> Vec<RawReport> {
    serde_yaml::from_str(include_str!("../fixtures/reports.yaml"))
        .expect("invalid reports fixture")
}
