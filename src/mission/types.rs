use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub repository: String,
    pub title: String,
    pub description: String,

    #[serde(default)]
    pub definition_of_done: Vec<DodCriterion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default)]
    pub constraints: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Mission {
    pub fn new(
        id: impl Into<String>,
        repository: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            repository: repository.into(),
            title: title.into(),
            description: description.into(),
            definition_of_done: Vec::new(),
            context: None,
            constraints: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_criterion(mut self, criterion: DodCriterion) -> Self {
        self.definition_of_done.push(criterion);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_constraints(mut self, constraints: Vec<String>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn criterion(&self, criterion_id: &str) -> Option<&DodCriterion> {
        self.definition_of_done
            .iter()
            .find(|c| c.id == criterion_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DodCriterion {
    pub id: String,
    pub description: String,

    #[serde(default)]
    pub measurable: bool,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub completed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl DodCriterion {
    pub fn new(id: impl Into<String>, description: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            measurable: true,
            priority,
            completed: false,
            completed_at: None,
            evidence: None,
        }
    }

    pub fn with_measurable(mut self, measurable: bool) -> Self {
        self.measurable = measurable;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Tiers in scan order for next-criterion selection.
    pub const TIERS: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" | "normal" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}
