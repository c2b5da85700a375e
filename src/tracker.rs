use crate::error::Result;
use crate::models::{Dataset, RankedStudent};
use crate::ranking;
use crate::roster::{self, Adjustment, NewStudent, StudentPatch};
use crate::store::DatasetStore;

/// Sole owner of the working dataset.
///
/// Each mutation builds a new dataset, swaps it in, then awaits the save
/// before returning. `&mut self` keeps one mutation or persistence call in
/// flight at a time. A failed save is retried once; if that fails too the new
/// dataset stays in memory, marked dirty, until `flush` succeeds.
pub struct Tracker<S> {
    store: S,
    dataset: Dataset,
    dirty: bool,
}

impl<S: DatasetStore> Tracker<S> {
    pub async fn open(store: S) -> Result<Self> {
        let dataset = store.load().await?;
        roster::validate(&dataset)?;
        tracing::info!(
            groups = dataset.groups.len(),
            students = dataset.students.len(),
            "opened dataset"
        );
        Ok(Self {
            store,
            dataset,
            dirty: false,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn ranked(&self) -> Vec<RankedStudent> {
        ranking::compute_ranks(&self.dataset)
    }

    pub async fn add_student(&mut self, draft: NewStudent) -> Result<String> {
        let (next, id) = self.dataset.with_student_added(draft)?;
        self.commit(next, "add student").await?;
        Ok(id)
    }

    pub async fn edit_student(&mut self, student_id: &str, patch: StudentPatch) -> Result<()> {
        let next = self.dataset.with_student_edited(student_id, patch)?;
        self.commit(next, "edit student").await
    }

    pub async fn delete_student(&mut self, student_id: &str) -> Result<()> {
        let next = self.dataset.with_student_deleted(student_id)?;
        self.commit(next, "delete student").await
    }

    pub async fn assign_representative(&mut self, group_id: &str, student_id: &str) -> Result<()> {
        let next = self.dataset.with_representative(group_id, student_id)?;
        self.commit(next, "assign representative").await
    }

    pub async fn remove_representative(&mut self, group_id: &str) -> Result<()> {
        let next = self.dataset.without_representative(group_id)?;
        self.commit(next, "remove representative").await
    }

    pub async fn adjust_percentage(
        &mut self,
        student_id: &str,
        adjustment: Adjustment,
    ) -> Result<i32> {
        let next = self
            .dataset
            .with_percentage_adjusted(student_id, adjustment)?;
        self.commit(next, "adjust percentage").await?;
        Ok(self
            .dataset
            .student(student_id)
            .map_or(0, |student| student.percentage))
    }

    /// Replaces the working dataset wholesale, e.g. after an import.
    pub async fn replace(&mut self, dataset: Dataset) -> Result<()> {
        roster::validate(&dataset)?;
        self.commit(dataset, "replace dataset").await
    }

    /// Retries a save that failed earlier.
    pub async fn flush(&mut self) -> Result<()> {
        if self.dirty {
            self.store.save(&self.dataset).await?;
            self.dirty = false;
        }
        Ok(())
    }

    async fn commit(&mut self, next: Dataset, action: &'static str) -> Result<()> {
        self.dataset = next;
        let mut saved = self.store.save(&self.dataset).await;
        if let Err(err) = &saved {
            if err.is_persistence() {
                tracing::warn!(action, error = %err, "save failed; retrying once");
                saved = self.store.save(&self.dataset).await;
            }
        }
        match saved {
            Ok(()) => {
                self.dirty = false;
                tracing::info!(action, students = self.dataset.students.len(), "committed");
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                tracing::warn!(action, error = %err, "save failed; keeping dataset in memory");
                Err(err)
            }
        }
    }
}
