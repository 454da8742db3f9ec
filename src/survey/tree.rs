//! Rebuilds the nested survey from its flat join rows

use crate::models::{ChoiceNode, QuestionNode, SurveyJoinRow, SurveyTree};
use std::collections::HashMap;

/// Fold ordered join rows into a survey tree.
///
/// Questions appear in order of first sight; every row carrying a choice
/// appends it to its question. Returns `None` when there are no rows.
pub fn assemble_survey(rows: &[SurveyJoinRow]) -> Option<SurveyTree> {
    let first = rows.first()?;

    let mut questions: Vec<QuestionNode> = Vec::new();
    let mut index: HashMap<i32, usize> = HashMap::new();

    for row in rows {
        let (Some(question_id), Some(text), Some(question_type)) =
            (row.question_id, row.question_text.as_ref(), row.question_type)
        else {
            // Survey without questions
            continue;
        };

        let position = *index.entry(question_id).or_insert_with(|| {
            questions.push(QuestionNode {
                id: question_id,
                text: text.clone(),
                question_type,
                options: Vec::new(),
            });
            questions.len() - 1
        });

        if let (Some(choice_id), Some(choice_text)) = (row.choice_id, row.choice_text.as_ref()) {
            questions[position].options.push(ChoiceNode {
                id: choice_id,
                text: choice_text.clone(),
            });
        }
    }

    Some(SurveyTree {
        id: first.survey_id,
        title: first.title.clone(),
        description: first.description.clone(),
        questions,
    })
}
