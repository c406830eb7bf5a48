use std::collections::BTreeSet;

use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};

use crate::error::Result;
use crate::models::quiz::{format_grade, Quiz};
use crate::services::attempt_source::AttemptReview;
use crate::utils::html::strip_html;

/// Generate the gradebook workbook: one row per finished attempt, one column
/// per question plus raw total and rescaled final grade.
pub fn gradebook_xlsx(quiz: &Quiz, attempts: &[AttemptReview]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Gradebook")?;

    // Union of question numbers across attempts; random sections can give
    // candidates different subsets.
    let question_numbers: BTreeSet<i32> = attempts
        .iter()
        .filter(|a| a.is_finished())
        .flat_map(|a| a.questions.iter().filter_map(|q| q.number))
        .collect();

    let header_format = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let text_format = Format::new().set_border(FormatBorder::Thin);
    let number_format = Format::new()
        .set_align(FormatAlign::Right)
        .set_border(FormatBorder::Thin);
    let missing_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);

    worksheet.set_column_width(0, 6.0)?;
    worksheet.set_column_width(1, 32.0)?;
    worksheet.set_column_width(2, 18.0)?;
    worksheet.set_column_width(3, 12.0)?;

    let mut col: u16 = 0;
    for title in ["#", "Candidate", "Username", "Id number"] {
        worksheet.write_string_with_format(0, col, title, &header_format)?;
        col += 1;
    }
    for number in &question_numbers {
        worksheet.write_string_with_format(0, col, &format!("Q{}", number), &header_format)?;
        col += 1;
    }
    worksheet.write_string_with_format(0, col, "Marks", &header_format)?;
    worksheet.write_string_with_format(0, col + 1, "Final grade", &header_format)?;

    let mut row: u32 = 1;
    for review in attempts.iter().filter(|a| a.is_finished()) {
        worksheet.write_number_with_format(row, 0, row as f64, &number_format)?;
        worksheet.write_string_with_format(
            row,
            1,
            &strip_html(&review.candidate.fullname()),
            &text_format,
        )?;
        worksheet.write_string_with_format(row, 2, &review.candidate.username, &text_format)?;
        worksheet.write_string_with_format(
            row,
            3,
            &review.candidate.padded_idnumber(),
            &text_format,
        )?;

        let mut col: u16 = 4;
        for number in &question_numbers {
            let mark = review
                .questions
                .iter()
                .find(|q| q.number == Some(*number))
                .and_then(|q| q.mark);
            match mark.and_then(|m| m.to_f64()) {
                Some(value) => {
                    worksheet.write_number_with_format(row, col, value, &number_format)?
                }
                None => worksheet.write_string_with_format(row, col, "-", &missing_format)?,
            };
            col += 1;
        }

        match review.attempt.sumgrades.and_then(|m| m.to_f64()) {
            Some(value) => worksheet.write_number_with_format(row, col, value, &number_format)?,
            None => worksheet.write_string_with_format(row, col, "-", &missing_format)?,
        };
        match quiz.rescale(review.attempt.sumgrades) {
            Some(grade) => worksheet.write_string_with_format(
                row,
                col + 1,
                &format_grade(grade),
                &number_format,
            )?,
            None => worksheet.write_string_with_format(row, col + 1, "-", &missing_format)?,
        };

        row += 1;
    }

    worksheet.set_freeze_panes(1, 0)?;

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}
