use serde::{Deserialize, Serialize};

pub const MIN_PERCENTAGE: i32 = 0;
pub const MAX_PERCENTAGE: i32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub group_id: String,
    pub photo: String,
    pub percentage: i32,
}

/// A cohort ("field"). `cr` is the id of the group's representative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub cr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Ascending upper bounds of each star tier.
    pub star_thresholds: Vec<i32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            star_thresholds: vec![20, 40, 60, 80, 100],
        }
    }
}

/// The aggregate root that is persisted, exported and imported as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub groups: Vec<Group>,
    pub students: Vec<Student>,
    pub settings: Settings,
}

impl Dataset {
    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|student| student.id == student_id)
    }
}

/// Read-only leaderboard projection of a student. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStudent {
    pub id: String,
    pub name: String,
    pub group_id: String,
    pub group_name: String,
    pub photo: String,
    pub percentage: i32,
    pub is_representative: bool,
    pub rank: usize,
}
