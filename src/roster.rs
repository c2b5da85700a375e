use std::collections::HashSet;

use uuid::Uuid;

use crate::error::{Result, TrackerError, Violation};
use crate::models::{Dataset, Student, MAX_PERCENTAGE, MIN_PERCENTAGE};

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub group_id: String,
    pub photo: Option<String>,
    pub percentage: Option<i64>,
}

/// Fields to change on an existing student; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub group_id: Option<String>,
    pub photo: Option<String>,
    pub percentage: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Increase(i64),
    Decrease(i64),
    Set(i64),
}

pub fn clamp_percentage(value: i64) -> i32 {
    value.clamp(i64::from(MIN_PERCENTAGE), i64::from(MAX_PERCENTAGE)) as i32
}

pub fn default_avatar(name: &str) -> String {
    format!("{AVATAR_BASE_URL}{}", urlencoding::encode(name))
}

impl Dataset {
    pub fn with_student_added(&self, draft: NewStudent) -> Result<(Dataset, String)> {
        let name = required_name(&draft.name)?;
        self.require_group(&draft.group_id)?;

        let id = self.fresh_student_id();
        let photo = draft
            .photo
            .filter(|photo| !photo.trim().is_empty())
            .unwrap_or_else(|| default_avatar(&name));

        let mut next = self.clone();
        next.students.push(Student {
            id: id.clone(),
            name,
            group_id: draft.group_id,
            photo,
            percentage: clamp_percentage(draft.percentage.unwrap_or(0)),
        });
        Ok((next, id))
    }

    pub fn with_student_edited(&self, student_id: &str, patch: StudentPatch) -> Result<Dataset> {
        let current = self.require_student(student_id)?;
        let name = patch.name.as_deref().map(required_name).transpose()?;
        if let Some(group_id) = patch.group_id.as_deref() {
            self.require_group(group_id)?;
        }

        let old_group = current.group_id.clone();
        let mut next = self.clone();
        let student = next
            .students
            .iter_mut()
            .find(|student| student.id == student_id)
            .ok_or_else(|| TrackerError::student_not_found(student_id))?;

        if let Some(name) = name {
            student.name = name;
        }
        if let Some(group_id) = patch.group_id {
            student.group_id = group_id;
        }
        if let Some(photo) = patch.photo {
            student.photo = photo;
        }
        if let Some(percentage) = patch.percentage {
            student.percentage = clamp_percentage(percentage);
        }

        if student.group_id != old_group {
            // A representative does not follow the student into a new group.
            next.clear_representative_refs(student_id);
        }
        Ok(next)
    }

    pub fn with_student_deleted(&self, student_id: &str) -> Result<Dataset> {
        self.require_student(student_id)?;

        let mut next = self.clone();
        next.students.retain(|student| student.id != student_id);
        next.clear_representative_refs(student_id);
        Ok(next)
    }

    pub fn with_representative(&self, group_id: &str, student_id: &str) -> Result<Dataset> {
        self.require_group(group_id)?;
        let student = self.require_student(student_id)?;
        if student.group_id != group_id {
            return Err(TrackerError::validation(format!(
                "student {student_id} belongs to group {}, not {group_id}",
                student.group_id
            )));
        }

        let mut next = self.clone();
        for group in next.groups.iter_mut().filter(|group| group.id == group_id) {
            group.cr = Some(student_id.to_string());
        }
        Ok(next)
    }

    pub fn without_representative(&self, group_id: &str) -> Result<Dataset> {
        self.require_group(group_id)?;

        let mut next = self.clone();
        for group in next.groups.iter_mut().filter(|group| group.id == group_id) {
            group.cr = None;
        }
        Ok(next)
    }

    pub fn with_percentage_adjusted(
        &self,
        student_id: &str,
        adjustment: Adjustment,
    ) -> Result<Dataset> {
        let current = i64::from(self.require_student(student_id)?.percentage);
        let target = match adjustment {
            Adjustment::Increase(delta) => current.saturating_add(delta),
            Adjustment::Decrease(delta) => current.saturating_sub(delta),
            Adjustment::Set(value) => value,
        };

        let mut next = self.clone();
        for student in next.students.iter_mut().filter(|s| s.id == student_id) {
            student.percentage = clamp_percentage(target);
        }
        Ok(next)
    }

    fn require_group(&self, group_id: &str) -> Result<()> {
        if group_id.trim().is_empty() {
            return Err(TrackerError::validation("group is required"));
        }
        self.group(group_id)
            .map(|_| ())
            .ok_or_else(|| TrackerError::group_not_found(group_id))
    }

    fn require_student(&self, student_id: &str) -> Result<&Student> {
        self.student(student_id)
            .ok_or_else(|| TrackerError::student_not_found(student_id))
    }

    fn clear_representative_refs(&mut self, student_id: &str) {
        for group in &mut self.groups {
            if group.cr.as_deref() == Some(student_id) {
                tracing::debug!(group = %group.id, student = %student_id, "cleared representative");
                group.cr = None;
            }
        }
    }

    fn fresh_student_id(&self) -> String {
        loop {
            let id = format!("s{}", Uuid::new_v4().simple());
            if self.student(&id).is_none() {
                return id;
            }
        }
    }
}

fn required_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::validation("student name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Every broken invariant in `dataset`, in a stable order.
pub fn violations(dataset: &Dataset) -> Vec<Violation> {
    let mut found = Vec::new();

    let mut group_ids = HashSet::new();
    for group in &dataset.groups {
        if !group_ids.insert(group.id.as_str()) {
            found.push(Violation::DuplicateGroup(group.id.clone()));
        }
    }

    let mut student_ids = HashSet::new();
    for student in &dataset.students {
        if !student_ids.insert(student.id.as_str()) {
            found.push(Violation::DuplicateStudent(student.id.clone()));
        }
        if student.name.trim().is_empty() {
            found.push(Violation::EmptyName(student.id.clone()));
        }
        if !(MIN_PERCENTAGE..=MAX_PERCENTAGE).contains(&student.percentage) {
            found.push(Violation::PercentageOutOfRange {
                id: student.id.clone(),
                percentage: student.percentage,
            });
        }
        if !group_ids.contains(student.group_id.as_str()) {
            found.push(Violation::OrphanedStudent {
                student: student.id.clone(),
                group: student.group_id.clone(),
            });
        }
    }

    for group in &dataset.groups {
        let Some(cr) = group.cr.as_deref() else {
            continue;
        };
        match dataset.student(cr) {
            None => found.push(Violation::MissingRepresentative {
                group: group.id.clone(),
                student: cr.to_string(),
            }),
            Some(student) if student.group_id != group.id => {
                found.push(Violation::ForeignRepresentative {
                    group: group.id.clone(),
                    student: cr.to_string(),
                })
            }
            Some(_) => {}
        }
    }

    let thresholds = &dataset.settings.star_thresholds;
    if thresholds.is_empty() {
        found.push(Violation::NoThresholds);
    } else if thresholds.windows(2).any(|pair| pair[0] > pair[1]) {
        found.push(Violation::UnorderedThresholds);
    }

    found
}

pub fn validate(dataset: &Dataset) -> Result<()> {
    let found = violations(dataset);
    if found.is_empty() {
        Ok(())
    } else {
        Err(TrackerError::Integrity(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, Settings};

    fn group(id: &str, cr: Option<&str>) -> Group {
        Group {
            id: id.to_string(),
            name: format!("Field {id}"),
            cr: cr.map(str::to_string),
        }
    }

    fn student(id: &str, group_id: &str, percentage: i32) -> Student {
        Student {
            id: id.to_string(),
            name: format!("Student {id}"),
            group_id: group_id.to_string(),
            photo: String::new(),
            percentage,
        }
    }

    fn sample() -> Dataset {
        Dataset {
            groups: vec![group("x", Some("s1")), group("y", None)],
            students: vec![student("s1", "x", 50), student("s2", "x", 0), student("s3", "y", 100)],
            settings: Settings::default(),
        }
    }

    #[test]
    fn sample_is_valid() {
        assert!(validate(&sample()).is_ok());
    }

    #[test]
    fn add_assigns_unique_id_and_defaults() {
        let data = sample();
        let (next, id) = data
            .with_student_added(NewStudent {
                name: "  Jules Moreno ".to_string(),
                group_id: "y".to_string(),
                ..NewStudent::default()
            })
            .unwrap();

        let added = next.student(&id).unwrap();
        assert_eq!(added.name, "Jules Moreno");
        assert_eq!(added.percentage, 0);
        assert_eq!(added.photo, format!("{AVATAR_BASE_URL}Jules%20Moreno"));
        assert!(data.student(&id).is_none());
        assert_eq!(next.students.len(), data.students.len() + 1);
        assert!(validate(&next).is_ok());
    }

    #[test]
    fn add_clamps_percentage() {
        let draft = |percentage| NewStudent {
            name: "Kiara".to_string(),
            group_id: "x".to_string(),
            photo: Some("kiara.png".to_string()),
            percentage: Some(percentage),
        };
        let (next, id) = sample().with_student_added(draft(140)).unwrap();
        assert_eq!(next.student(&id).unwrap().percentage, 100);
        assert_eq!(next.student(&id).unwrap().photo, "kiara.png");
        let (next, id) = sample().with_student_added(draft(-3)).unwrap();
        assert_eq!(next.student(&id).unwrap().percentage, 0);
    }

    #[test]
    fn add_rejects_blank_name_and_unknown_group() {
        let data = sample();
        let blank = data.with_student_added(NewStudent {
            name: "   ".to_string(),
            group_id: "x".to_string(),
            ..NewStudent::default()
        });
        assert!(matches!(blank, Err(TrackerError::Validation(_))));

        let orphan = data.with_student_added(NewStudent {
            name: "Ola".to_string(),
            group_id: "nope".to_string(),
            ..NewStudent::default()
        });
        assert!(matches!(orphan, Err(TrackerError::NotFound { entity: "group", .. })));
    }

    #[test]
    fn moving_representative_clears_old_group() {
        let next = sample()
            .with_student_edited(
                "s1",
                StudentPatch {
                    group_id: Some("y".to_string()),
                    ..StudentPatch::default()
                },
            )
            .unwrap();

        assert_eq!(next.group("x").unwrap().cr, None);
        assert_eq!(next.group("y").unwrap().cr, None);
        assert_eq!(next.student("s1").unwrap().group_id, "y");
        assert!(validate(&next).is_ok());
    }

    #[test]
    fn editing_within_group_keeps_representative() {
        let next = sample()
            .with_student_edited(
                "s1",
                StudentPatch {
                    name: Some("Avery".to_string()),
                    group_id: Some("x".to_string()),
                    percentage: Some(250),
                    ..StudentPatch::default()
                },
            )
            .unwrap();

        assert_eq!(next.group("x").unwrap().cr.as_deref(), Some("s1"));
        assert_eq!(next.student("s1").unwrap().name, "Avery");
        assert_eq!(next.student("s1").unwrap().percentage, 100);
    }

    #[test]
    fn edit_rejects_missing_student_and_bad_fields() {
        let data = sample();
        assert!(matches!(
            data.with_student_edited("ghost", StudentPatch::default()),
            Err(TrackerError::NotFound { entity: "student", .. })
        ));
        assert!(matches!(
            data.with_student_edited(
                "s1",
                StudentPatch {
                    name: Some(String::new()),
                    ..StudentPatch::default()
                }
            ),
            Err(TrackerError::Validation(_))
        ));
        assert!(data
            .with_student_edited(
                "s1",
                StudentPatch {
                    group_id: Some("nope".to_string()),
                    ..StudentPatch::default()
                }
            )
            .is_err());
    }

    #[test]
    fn deleting_representative_cascades() {
        let next = sample().with_student_deleted("s1").unwrap();
        assert!(next.student("s1").is_none());
        assert!(next
            .groups
            .iter()
            .all(|group| group.cr.as_deref() != Some("s1")));
        assert!(validate(&next).is_ok());
    }

    #[test]
    fn delete_unknown_student_is_rejected() {
        assert!(sample().with_student_deleted("ghost").is_err());
    }

    #[test]
    fn representative_must_belong_to_group() {
        let data = sample();
        let result = data.with_representative("y", "s1");
        assert!(matches!(result, Err(TrackerError::Validation(_))));
        assert_eq!(data.group("y").unwrap().cr, None);
    }

    #[test]
    fn assigning_replaces_previous_representative() {
        let next = sample().with_representative("x", "s2").unwrap();
        assert_eq!(next.group("x").unwrap().cr.as_deref(), Some("s2"));
    }

    #[test]
    fn removing_representative_is_idempotent() {
        let once = sample().without_representative("x").unwrap();
        assert_eq!(once.group("x").unwrap().cr, None);
        let twice = once.without_representative("x").unwrap();
        assert_eq!(once, twice);
        assert!(sample().without_representative("nope").is_err());
    }

    #[test]
    fn adjustments_stop_at_bounds() {
        let data = sample();
        let up = data
            .with_percentage_adjusted("s3", Adjustment::Increase(1))
            .unwrap();
        assert_eq!(up.student("s3").unwrap().percentage, 100);

        let down = data
            .with_percentage_adjusted("s2", Adjustment::Decrease(1))
            .unwrap();
        assert_eq!(down.student("s2").unwrap().percentage, 0);

        let set = data
            .with_percentage_adjusted("s1", Adjustment::Set(i64::MAX))
            .unwrap();
        assert_eq!(set.student("s1").unwrap().percentage, 100);

        let step = data
            .with_percentage_adjusted("s1", Adjustment::Increase(5))
            .unwrap();
        assert_eq!(step.student("s1").unwrap().percentage, 55);

        assert!(data
            .with_percentage_adjusted("ghost", Adjustment::Increase(1))
            .is_err());
    }

    #[test]
    fn violations_report_every_broken_invariant() {
        let data = Dataset {
            groups: vec![group("x", Some("s3")), group("x", None), group("z", Some("gone"))],
            students: vec![
                student("s1", "x", 101),
                student("s1", "missing", 10),
                Student {
                    name: " ".to_string(),
                    ..student("s3", "z", 5)
                },
            ],
            settings: Settings {
                star_thresholds: vec![60, 40],
            },
        };

        let found = violations(&data);
        assert!(found.contains(&Violation::DuplicateGroup("x".to_string())));
        assert!(found.contains(&Violation::DuplicateStudent("s1".to_string())));
        assert!(found.contains(&Violation::EmptyName("s3".to_string())));
        assert!(found.contains(&Violation::PercentageOutOfRange {
            id: "s1".to_string(),
            percentage: 101
        }));
        assert!(found.contains(&Violation::OrphanedStudent {
            student: "s1".to_string(),
            group: "missing".to_string()
        }));
        assert!(found.contains(&Violation::ForeignRepresentative {
            group: "x".to_string(),
            student: "s3".to_string()
        }));
        assert!(found.contains(&Violation::MissingRepresentative {
            group: "z".to_string(),
            student: "gone".to_string()
        }));
        assert!(found.contains(&Violation::UnorderedThresholds));
        assert!(matches!(validate(&data), Err(TrackerError::Integrity(_))));
    }

    #[test]
    fn empty_thresholds_are_a_violation() {
        let mut data = sample();
        data.settings.star_thresholds.clear();
        assert_eq!(violations(&data), vec![Violation::NoThresholds]);
    }
}
