use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Condition a dependency must satisfy before the dependent service is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyCondition {
    /// Dependency container is running.
    #[default]
    #[serde(alias = "service_started")]
    Started,
    /// Dependency container reports a `healthy` health status.
    ServiceHealthy,
    /// Dependency container exited with code 0.
    ServiceCompletedSuccessfully,
}

impl DependencyCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyCondition::Started => "started",
            DependencyCondition::ServiceHealthy => "service_healthy",
            DependencyCondition::ServiceCompletedSuccessfully => "service_completed_successfully",
        }
    }
}

impl fmt::Display for DependencyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyCondition {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "started" | "service_started" => Ok(DependencyCondition::Started),
            "service_healthy" => Ok(DependencyCondition::ServiceHealthy),
            "service_completed_successfully" => {
                Ok(DependencyCondition::ServiceCompletedSuccessfully)
            }
            other => Err(ModelError::UnknownCondition(other.to_string())),
        }
    }
}

/// One `depends_on` entry of a service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Name of the peer service within the same project.
    pub service: String,
    #[serde(default)]
    pub condition: DependencyCondition,
}

impl Dependency {
    pub fn new(service: impl Into<String>, condition: DependencyCondition) -> Self {
        Self {
            service: service.into(),
            condition,
        }
    }
}
