use crate::models::{AnswerDetail, ResponseDetail, ResponseJoinRow};

/// Collapse the response join into one response with its answers.
///
/// Response fields come from the first row. Rows without an answer id
/// (a response with no answers) contribute nothing.
pub fn assemble_response(rows: &[ResponseJoinRow]) -> Option<ResponseDetail> {
    let first = rows.first()?;

    let answers = rows
        .iter()
        .filter_map(|row| {
            let (id, question_id, answer_text) =
                (row.answer_id?, row.question_id?, row.answer_text.clone()?);
            Some(AnswerDetail {
                id,
                question_id,
                question_text: row.question_text.clone(),
                answer_text,
            })
        })
        .collect();

    Some(ResponseDetail {
        response_id: first.response_id,
        survey_id: first.survey_id,
        completed_at: first.completed_at,
        answers,
    })
}
