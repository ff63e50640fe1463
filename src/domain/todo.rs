use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CatalogRecord, FieldLimit, FieldViolation, check_present, check_required};

/// Todo priority. On the wire this is the integer rank, `High` being 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High,
    Medium,
    #[default]
    Low,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.rank()
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::High),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Low),
            other => Err(format!("invalid priority: {other} (expected 1, 2 or 3)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub priority: Priority,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFields {
    pub name: String,
    pub description: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoLimits {
    pub name: FieldLimit,
    pub description: FieldLimit,
}

impl Default for TodoLimits {
    fn default() -> Self {
        Self {
            name: FieldLimit::new(3, 512),
            description: FieldLimit::new(0, 4096),
        }
    }
}

impl CatalogRecord for Todo {
    type Draft = TodoDraft;
    type Fields = TodoFields;
    type Patch = TodoPatch;
    type Limits = TodoLimits;

    const KIND: &'static str = "todo";

    fn id(&self) -> u64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        self.priority.label()
    }

    fn summary(&self) -> &str {
        &self.description
    }

    fn validate_draft(
        draft: TodoDraft,
        limits: &TodoLimits,
    ) -> Result<TodoFields, Vec<FieldViolation>> {
        let mut violations = Vec::new();
        check_required(&mut violations, "name", draft.name.as_deref(), &limits.name);
        check_required(
            &mut violations,
            "description",
            draft.description.as_deref(),
            &limits.description,
        );

        match (draft.name, draft.description) {
            (Some(name), Some(description)) if violations.is_empty() => Ok(TodoFields {
                name,
                description,
                priority: draft.priority.unwrap_or_default(),
            }),
            _ => Err(violations),
        }
    }

    fn validate_patch(patch: &TodoPatch, limits: &TodoLimits) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        check_present(&mut violations, "name", patch.name.as_deref(), &limits.name);
        check_present(
            &mut violations,
            "description",
            patch.description.as_deref(),
            &limits.description,
        );
        violations
    }

    fn create(id: u64, fields: TodoFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
            priority: fields.priority,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: TodoPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        self.updated_at = now;
    }
}

pub fn seed_todos(now: DateTime<Utc>) -> Vec<Todo> {
    [
        (
            1,
            "FastAPI CC",
            "Complete the FastAPI Crash Course",
            Priority::High,
        ),
        (
            2,
            "React CC",
            "Complete the React Crash Course",
            Priority::Medium,
        ),
        (
            3,
            "System Design",
            "Complete the System Design with C# Course",
            Priority::Medium,
        ),
        (
            4,
            "Clean Architecture",
            "Complete the Clean Architecture Book",
            Priority::Low,
        ),
        (
            5,
            "Update Resume",
            "Update the Resume for Full Stack Developer Role",
            Priority::Low,
        ),
    ]
    .into_iter()
    .map(|(id, name, description, priority)| Todo {
        id,
        name: name.to_string(),
        description: description.to_string(),
        priority,
        updated_at: now,
    })
    .collect()
}
