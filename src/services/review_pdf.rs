//! Review document rendering with `printpdf` 0.8.
//!
//! printpdf 0.8 uses a data-oriented API: documents are built by constructing
//! `PdfPage` structs containing `Vec<Op>` operation lists, then serialised
//! via `PdfDocument::save()`.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};

use crate::services::attempt_source::AttemptReview;
use crate::utils::html::strip_html;

const PAGE_W_MM: f32 = 210.0;
const PAGE_H_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;
const HEADER_FONT_PT: f32 = 8.0;

/// One layout element of a review document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewBlock {
    Heading(String),
    SubHeading(String),
    /// Preformatted engine output (question and response summaries).
    Mono(String),
    Text(String),
    Rule,
    PageBreak,
}

#[derive(Debug, Clone)]
pub struct ReviewDocument {
    pub title: String,
    /// Printed at the top of every page, like a candidate identity line.
    pub header: String,
    pub blocks: Vec<ReviewBlock>,
}

/// Build the question-by-question review blocks of one attempt.
pub fn attempt_blocks(review: &AttemptReview) -> Vec<ReviewBlock> {
    let mut blocks = Vec::new();
    for question in &review.questions {
        match question.number {
            Some(number) => {
                blocks.push(ReviewBlock::Heading(format!("Question {}", number)));
                blocks.push(ReviewBlock::Mono(strip_html(&question.question_summary)));
                blocks.push(ReviewBlock::SubHeading("Given answer".to_string()));
                let response = question
                    .response_summary
                    .as_deref()
                    .map(strip_html)
                    .unwrap_or_else(|| "-".to_string());
                blocks.push(ReviewBlock::Mono(response));
            }
            None => {
                blocks.push(ReviewBlock::Text(strip_html(&question.question_summary)));
            }
        }
        blocks.push(ReviewBlock::Rule);
    }
    blocks
}

pub struct ReviewPdf;

impl ReviewPdf {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, document: &ReviewDocument) -> Vec<u8> {
        let page_w = Mm(PAGE_W_MM);
        let page_h = Mm(PAGE_H_MM);
        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let page_h_pt = page_h.into_pt().0;
        let usable_width_mm = PAGE_W_MM - 2.0 * MARGIN_MM;

        let mut doc = PdfDocument::new(document.title.as_str());
        let mut pages: Vec<PdfPage> = Vec::new();

        let mut ops = start_page_ops(&document.header, page_h_pt, margin_pt);
        // First line lands below the header band.
        let top_y = page_h_pt - margin_pt - 2.0 * line_height(HEADER_FONT_PT);
        let mut y = top_y;

        for block in &document.blocks {
            let (font, size_pt, content) = match block {
                ReviewBlock::Heading(text) => (BuiltinFont::HelveticaBold, 13.0, text.clone()),
                ReviewBlock::SubHeading(text) => (BuiltinFont::HelveticaBold, 11.0, text.clone()),
                ReviewBlock::Mono(text) => (BuiltinFont::Courier, 10.0, text.clone()),
                ReviewBlock::Text(text) => (BuiltinFont::Helvetica, 10.0, text.clone()),
                ReviewBlock::Rule => {
                    let width = max_chars(usable_width_mm, 10.0, BuiltinFont::Helvetica);
                    (BuiltinFont::Helvetica, 10.0, "-".repeat(width))
                }
                ReviewBlock::PageBreak => {
                    pages.push(PdfPage::new(page_w, page_h, std::mem::take(&mut ops)));
                    ops = start_page_ops(&document.header, page_h_pt, margin_pt);
                    y = top_y;
                    continue;
                }
            };

            let step = line_height(size_pt);
            let width = max_chars(usable_width_mm, size_pt, font);
            for line in wrap_text(&content, width) {
                if y < margin_pt + step {
                    pages.push(PdfPage::new(page_w, page_h, std::mem::take(&mut ops)));
                    ops = start_page_ops(&document.header, page_h_pt, margin_pt);
                    y = top_y;
                }
                push_line(&mut ops, &line, font, size_pt, margin_pt, y);
                y -= step;
            }
            // Breathing room after each block.
            y -= step * 0.4;
        }

        pages.push(PdfPage::new(page_w, page_h, ops));
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        doc.save(&PdfSaveOptions::default(), &mut warnings)
    }
}

impl Default for ReviewPdf {
    fn default() -> Self {
        Self::new()
    }
}

fn line_height(size_pt: f32) -> f32 {
    size_pt * 1.35
}

/// Approximate characters per line for a built-in font at the given size.
/// Average Helvetica glyph width is roughly 0.50 * font size in pt; Courier
/// is monospaced at 0.60. 1pt = 0.3528mm.
fn max_chars(usable_width_mm: f32, size_pt: f32, font: BuiltinFont) -> usize {
    let factor = match font {
        BuiltinFont::Courier | BuiltinFont::CourierBold => 0.60,
        _ => 0.50,
    };
    let avg_char_width_mm = factor * size_pt * 0.3528;
    ((usable_width_mm / avg_char_width_mm) as usize).max(8)
}

fn start_page_ops(header: &str, page_h_pt: f32, margin_pt: f32) -> Vec<Op> {
    let mut ops = Vec::new();
    if !header.is_empty() {
        push_line(
            &mut ops,
            header,
            BuiltinFont::Helvetica,
            HEADER_FONT_PT,
            margin_pt,
            page_h_pt - margin_pt,
        );
    }
    ops
}

fn push_line(ops: &mut Vec<Op>, line: &str, font: BuiltinFont, size_pt: f32, x_pt: f32, y_pt: f32) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Pt(x_pt),
            y: Pt(y_pt),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size_pt),
        font,
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(line.to_string())],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
/// Words longer than `max_width` are force-broken.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current_line = String::with_capacity(max_width);
        for word in words {
            if word.len() > max_width {
                if !current_line.is_empty() {
                    result.push(current_line.clone());
                    current_line.clear();
                }
                let mut remaining = word;
                while remaining.len() > max_width {
                    let (chunk, rest) = remaining.split_at(max_width);
                    result.push(chunk.to_string());
                    remaining = rest;
                }
                if !remaining.is_empty() {
                    current_line.push_str(remaining);
                }
            } else if current_line.is_empty() {
                current_line.push_str(word);
            } else if current_line.len() + 1 + word.len() <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                result.push(current_line.clone());
                current_line.clear();
                current_line.push_str(word);
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attempt::{QuizAttempt, STATE_FINISHED};
    use crate::models::candidate::Candidate;
    use crate::services::attempt_source::QuestionReview;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn sample_review() -> AttemptReview {
        AttemptReview {
            attempt: QuizAttempt {
                id: Uuid::new_v4(),
                quiz_id: Uuid::new_v4(),
                candidate_id: Uuid::new_v4(),
                state: STATE_FINISHED.to_string(),
                timestart: None,
                timefinish: None,
                sumgrades: Some(Decimal::from(7)),
                preview: false,
            },
            candidate: Candidate {
                id: Uuid::new_v4(),
                username: "mrossi".to_string(),
                idnumber: "7".to_string(),
                firstname: "Mario".to_string(),
                lastname: "Rossi".to_string(),
                suspended: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            questions: vec![
                QuestionReview {
                    slot: 1,
                    number: Some(1),
                    question_summary: "<p>What is 2 + 2?</p>".to_string(),
                    response_summary: Some("4".to_string()),
                    mark: Some(Decimal::from(1)),
                    max_mark: Decimal::from(1),
                    needs_grading: false,
                },
                QuestionReview {
                    slot: 2,
                    number: None,
                    question_summary: "Section B follows.".to_string(),
                    response_summary: None,
                    mark: None,
                    max_mark: Decimal::ZERO,
                    needs_grading: false,
                },
            ],
        }
    }

    #[test]
    fn blocks_follow_question_order_and_strip_markup() {
        let blocks = attempt_blocks(&sample_review());
        assert_eq!(
            blocks[0],
            ReviewBlock::Heading("Question 1".to_string())
        );
        assert_eq!(blocks[1], ReviewBlock::Mono("What is 2 + 2?".to_string()));
        assert_eq!(
            blocks[2],
            ReviewBlock::SubHeading("Given answer".to_string())
        );
        assert_eq!(blocks[3], ReviewBlock::Mono("4".to_string()));
        assert_eq!(blocks[4], ReviewBlock::Rule);
        // Description slots render their text only.
        assert_eq!(
            blocks[5],
            ReviewBlock::Text("Section B follows.".to_string())
        );
    }

    #[test]
    fn rendering_produces_a_pdf_byte_stream() {
        let document = ReviewDocument {
            title: "Review".to_string(),
            header: "Mario Rossi - Id number: 000007".to_string(),
            blocks: attempt_blocks(&sample_review()),
        };
        let bytes = ReviewPdf::new().render(&document);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn page_breaks_produce_additional_pages() {
        let mut blocks = Vec::new();
        for i in 0..3 {
            blocks.push(ReviewBlock::Heading(format!("Candidate {}", i)));
            blocks.push(ReviewBlock::PageBreak);
        }
        let with_breaks = ReviewPdf::new().render(&ReviewDocument {
            title: "Graded attempts".to_string(),
            header: String::new(),
            blocks,
        });
        let single = ReviewPdf::new().render(&ReviewDocument {
            title: "Graded attempts".to_string(),
            header: String::new(),
            blocks: vec![ReviewBlock::Heading("Candidate 0".to_string())],
        });
        assert!(with_breaks.len() > single.len());
    }

    #[test]
    fn long_words_are_force_wrapped() {
        let lines = wrap_text(&"x".repeat(25), 10);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() <= 10));
    }
}
