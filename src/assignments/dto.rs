use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{FeedbackEntry, TaskStatus, MAX_SCORE};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AssignmentFilter {
    pub program_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub user_id: Uuid,
    pub program_id: Uuid,
    pub task_status: Option<TaskStatus>,
    /// Beneficiaries only; ignored for volunteers.
    pub task_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssignmentRequest {
    pub user_id: Option<Uuid>,
    pub program_id: Option<Uuid>,
    pub task_status: Option<TaskStatus>,
    pub task_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub task_status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: Option<String>,
    pub score: i16,
}

impl FeedbackRequest {
    /// Score within 0..=5; blank feedback text counts as none.
    pub fn validated(self) -> Result<(Option<String>, i16), AppError> {
        if !(0..=MAX_SCORE).contains(&self.score) {
            return Err(AppError::validation(format!(
                "La puntuación debe estar entre 0 y {MAX_SCORE}"
            )));
        }
        let feedback = self
            .feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        Ok((feedback, self.score))
    }
}

#[derive(Debug, Serialize)]
pub struct ProgramFeedback {
    pub program_id: Uuid,
    pub average_score: Option<f64>,
    pub entries: Vec<FeedbackEntry>,
}

impl ProgramFeedback {
    pub fn new(program_id: Uuid, entries: Vec<FeedbackEntry>) -> Self {
        let scores: Vec<f64> = entries.iter().filter_map(|e| e.score).map(f64::from).collect();
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        Self {
            program_id,
            average_score,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_outside_range_is_rejected() {
        let req = FeedbackRequest { feedback: Some("bien".into()), score: 6 };
        assert!(req.validated().is_err());
        let req = FeedbackRequest { feedback: None, score: -1 };
        assert!(req.validated().is_err());
    }

    #[test]
    fn score_in_range_is_accepted() {
        let req = FeedbackRequest { feedback: Some("  muy útil ".into()), score: 3 };
        assert_eq!(req.validated().unwrap(), (Some("muy útil".to_string()), 3));
        let req = FeedbackRequest { feedback: Some("   ".into()), score: 0 };
        assert_eq!(req.validated().unwrap(), (None, 0));
    }

    #[test]
    fn average_ignores_missing_scores() {
        let entry = |score| FeedbackEntry {
            assignment_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: "Ana".into(),
            task_title: None,
            feedback: None,
            score,
        };
        let fb = ProgramFeedback::new(Uuid::new_v4(), vec![entry(Some(4)), entry(None), entry(Some(2))]);
        assert_eq!(fb.average_score, Some(3.0));
        assert_eq!(ProgramFeedback::new(Uuid::new_v4(), vec![]).average_score, None);
    }
}
