use serde::{Deserialize, Serialize};

pub const MAX_TOTAL: u8 = 100;

/// Board interview rubric. Each criterion has its own ceiling; together they cap at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewScorecard {
    pub technical_knowledge: u8,
    pub communication: u8,
    pub problem_solving: u8,
    pub leadership: u8,
}

impl InterviewScorecard {
    pub const TECHNICAL_KNOWLEDGE_MAX: u8 = 30;
    pub const COMMUNICATION_MAX: u8 = 25;
    pub const PROBLEM_SOLVING_MAX: u8 = 25;
    pub const LEADERSHIP_MAX: u8 = 20;

    pub fn total(&self) -> Result<u8, ScoreError> {
        let criteria = [
            ("technicalKnowledge", self.technical_knowledge, Self::TECHNICAL_KNOWLEDGE_MAX),
            ("communication", self.communication, Self::COMMUNICATION_MAX),
            ("problemSolving", self.problem_solving, Self::PROBLEM_SOLVING_MAX),
            ("leadership", self.leadership, Self::LEADERSHIP_MAX),
        ];

        let mut total = 0u8;
        for (criterion, score, max) in criteria {
            if score > max {
                return Err(ScoreError::CriterionOutOfRange {
                    criterion,
                    max,
                    actual: score,
                });
            }
            total += score;
        }
        Ok(total)
    }
}

/// Either a bare total or the per-criterion breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InterviewScore {
    Total(u8),
    Breakdown(InterviewScorecard),
}

impl InterviewScore {
    pub fn total(&self) -> Result<u8, ScoreError> {
        match self {
            InterviewScore::Total(total) if *total > MAX_TOTAL => {
                Err(ScoreError::TotalOutOfRange(*total))
            }
            InterviewScore::Total(total) => Ok(*total),
            InterviewScore::Breakdown(card) => card.total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("{criterion} score {actual} exceeds the maximum of {max}")]
    CriterionOutOfRange {
        criterion: &'static str,
        max: u8,
        actual: u8,
    },
    #[error("Interview score {0} exceeds the maximum of 100")]
    TotalOutOfRange(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(technical: u8, communication: u8, problem: u8, leadership: u8) -> InterviewScorecard {
        InterviewScorecard {
            technical_knowledge: technical,
            communication,
            problem_solving: problem,
            leadership,
        }
    }

    #[test]
    fn total_is_sum_of_criteria() {
        assert_eq!(card(20, 20, 15, 10).total(), Ok(65));
        assert_eq!(card(30, 25, 25, 20).total(), Ok(100));
    }

    #[test]
    fn criterion_above_ceiling_is_rejected() {
        assert_eq!(
            card(31, 0, 0, 0).total(),
            Err(ScoreError::CriterionOutOfRange {
                criterion: "technicalKnowledge",
                max: 30,
                actual: 31,
            })
        );
        assert!(card(0, 0, 0, 21).total().is_err());
    }

    #[test]
    fn bare_total_and_breakdown_both_parse() {
        let bare: InterviewScore = serde_json::from_str("72").expect("bare total");
        assert_eq!(bare.total(), Ok(72));

        let breakdown: InterviewScore = serde_json::from_str(
            r#"{"technicalKnowledge":20,"communication":20,"problemSolving":15,"leadership":10}"#,
        )
        .expect("breakdown");
        assert_eq!(breakdown.total(), Ok(65));

        let too_high: InterviewScore = serde_json::from_str("101").expect("parses as u8");
        assert_eq!(too_high.total(), Err(ScoreError::TotalOutOfRange(101)));
    }
}
