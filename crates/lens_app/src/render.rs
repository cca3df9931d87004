//! Plain-text rendering of view models.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use lens_core::{
    AppViewModel, CreateFlowView, DetailView, DocumentSearchView, ErrorView, PageItem, RetryPhase,
    StatsView, SubmissionRowView, SubmitPhase,
};

pub fn stats(view: &StatsView) -> String {
    let mut out = format!(
        "Documents analysed: {} (terms of service: {}, privacy policies: {})\n",
        format_with_commas(view.stats.total_count),
        format_with_commas(view.stats.tos_count),
        format_with_commas(view.stats.pp_count),
    );
    push_error(&mut out, view.error.as_ref());
    out
}

pub fn documents(view: &DocumentSearchView) -> String {
    let mut out = String::new();
    if view.items.is_empty() && view.error.is_none() {
        out.push_str("No documents found.\n");
    }
    for item in &view.items {
        let company = item.company_name.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "{:<24} {:<4} {:<40} {:>6} views",
            item.id,
            item.document_type,
            truncate(&format!("{company} ({})", item.url), 40),
            format_with_commas(item.views),
        );
    }
    let _ = writeln!(
        out,
        "Showing {} of {}{}",
        view.items.len(),
        format_with_commas(view.total),
        if view.has_more { ", more available" } else { "" }
    );
    push_error(&mut out, view.error.as_ref());
    out
}

pub fn detail(view: &DetailView) -> String {
    let mut out = String::new();
    match &view.document {
        Some(doc) => {
            let _ = writeln!(
                out,
                "{} [{}] {}",
                doc.company_name.as_deref().unwrap_or(&doc.url),
                doc.document_type,
                doc.url
            );
            if let Some(summary) = &doc.one_sentence_summary {
                let _ = writeln!(out, "\n{summary}");
            }
            if let Some(summary) = &doc.hundred_word_summary {
                let _ = writeln!(out, "\n{summary}");
            }
            if !doc.scores.is_empty() {
                out.push_str("\nScores:\n");
                for (name, score) in &doc.scores {
                    let _ = writeln!(out, "  {:<24} {:>5.1}", name.replace('_', " "), score);
                }
            }
            if !doc.key_points.is_empty() {
                out.push_str("\nKey points:\n");
                for point in &doc.key_points {
                    let _ = writeln!(out, "  - {point}");
                }
            }
            let updated = doc.updated_at.as_deref().map(format_timestamp);
            let _ = writeln!(
                out,
                "\n{} views{}",
                format_with_commas(doc.views),
                updated.map(|at| format!(", updated {at}")).unwrap_or_default()
            );
        }
        None if view.error.is_none() => out.push_str("No document loaded.\n"),
        None => {}
    }
    push_error(&mut out, view.error.as_ref());
    out
}

pub fn submissions(view: &AppViewModel) -> String {
    let mut out = String::new();
    if view.submissions.is_empty() && view.submissions_error.is_none() {
        out.push_str("No submissions found.\n");
    }
    for row in &view.submissions {
        let marker = if row.is_duplicate { " (existing analysis)" } else { "" };
        let _ = writeln!(
            out,
            "{:<24} {:<11} {:<4} {:<16} {}{}",
            row.id,
            row.status,
            row.document_type,
            format_timestamp(&row.created_at),
            truncate(&row.url, 48),
            marker,
        );
        if let Some(message) = row.error_message.as_deref().filter(|_| !row.is_duplicate) {
            let _ = writeln!(out, "{:<24} ! {}", "", message);
        }
    }
    if view.page_count > 0 {
        let _ = writeln!(
            out,
            "Page {} of {} ({} total): {}",
            view.query.page,
            view.page_count,
            format_with_commas(view.total_submissions),
            pages_line(&view.pages, view.query.page)
        );
    }
    push_error(&mut out, view.submissions_error.as_ref());
    out
}

pub fn create(view: &CreateFlowView) -> String {
    let mut out = String::new();
    match view.phase {
        SubmitPhase::Success => match &view.result_document_id {
            Some(id) => {
                let _ = writeln!(out, "Already analysed, see document {id}.");
            }
            None => out.push_str("Submitted. Analysis is running in the background.\n"),
        },
        SubmitPhase::Idle if view.trace.contains(&SubmitPhase::CheckingDuplicate) => {
            out.push_str("Not submitted, the existing analysis is shown instead.\n");
        }
        SubmitPhase::Idle if view.error.is_none() => out.push_str("Nothing submitted.\n"),
        SubmitPhase::Error | SubmitPhase::Idle => {}
        phase => {
            let _ = writeln!(out, "Still {phase:?}.");
        }
    }
    push_error(&mut out, view.error.as_ref());
    out
}

pub fn retry(row: &SubmissionRowView) -> String {
    let mut out = String::new();
    match row.retry {
        RetryPhase::Success => match &row.retry_document_id {
            Some(id) => {
                let _ = writeln!(out, "Already analysed, see document {id}.");
            }
            None => {
                let _ = writeln!(out, "Retry of {} started.", row.id);
            }
        },
        RetryPhase::Error => {
            let _ = writeln!(
                out,
                "Retry of {} failed: {}",
                row.id,
                row.retry_error.as_deref().unwrap_or("unknown error")
            );
        }
        RetryPhase::Idle => {
            let _ = writeln!(out, "{} is {}.", row.id, row.status);
        }
        phase => {
            let _ = writeln!(out, "Retry of {} still {phase:?}.", row.id);
        }
    }
    out
}

fn push_error(out: &mut String, error: Option<&ErrorView>) {
    if let Some(error) = error {
        let hint = if error.retryable { " (try again)" } else { "" };
        let _ = writeln!(out, "Error: {}{}", error.message, hint);
    }
}

fn pages_line(pages: &[PageItem], current: u32) -> String {
    pages
        .iter()
        .map(|item| match item {
            PageItem::Page(page) if *page == current => format!("[{page}]"),
            PageItem::Page(page) => page.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => at.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn format_with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
