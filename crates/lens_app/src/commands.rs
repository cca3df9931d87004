use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Result};
use lens_core::{ErrorView, Msg, SearchQuery, SubmissionStatus, MAX_PAGE_SIZE};

use crate::cli::{Command, SubmissionsArgs};
use crate::platform::app::App;
use crate::render;

pub fn run(command: &Command, app: &mut App, timeout: Duration) -> Result<ExitCode> {
    match command {
        Command::Stats => {
            app.dispatch(Msg::StatsRequested);
            app.settle(timeout)?;
            let view = app.view();
            print!("{}", render::stats(&view.stats));
            Ok(exit_code(view.stats.error.as_ref()))
        }
        Command::Documents {
            text,
            document_type,
            pages,
        } => {
            app.dispatch(Msg::DocumentSearchSubmitted {
                text: text.clone(),
                document_type: *document_type,
            });
            app.settle(timeout)?;
            for _ in 1..(*pages).max(1) {
                if !app.view().documents.has_more {
                    break;
                }
                app.dispatch(Msg::LoadMoreDocuments);
                app.settle(timeout)?;
            }
            let view = app.view();
            print!("{}", render::documents(&view.documents));
            Ok(exit_code(view.documents.error.as_ref()))
        }
        Command::Document {
            id,
            skip_view_increment,
        } => {
            app.dispatch(Msg::DocumentOpened {
                document_id: id.clone(),
                skip_view_increment: *skip_view_increment,
            });
            app.settle(timeout)?;
            let view = app.view();
            print!("{}", render::detail(&view.detail));
            Ok(exit_code(view.detail.error.as_ref()))
        }
        Command::Submissions(args) => {
            require_user(app)?;
            open_submissions(app, args, timeout)?;
            let view = app.view();
            print!("{}", render::submissions(&view));
            if !app.query_string().is_empty() {
                println!("Filters: ?{}", app.query_string());
            }
            Ok(exit_code(view.submissions_error.as_ref()))
        }
        Command::Submit {
            url,
            document_type,
            document_url,
            ..
        } => {
            require_user(app)?;
            app.dispatch(Msg::SubmitRequested {
                url: url.clone(),
                document_type: *document_type,
                document_url: document_url.clone(),
            });
            app.settle(timeout)?;
            let view = app.view();
            print!("{}", render::create(&view.create));
            if view.detail.document.is_some() || view.detail.error.is_some() {
                print!("\n{}", render::detail(&view.detail));
            }
            Ok(exit_code(view.create.error.as_ref()))
        }
        Command::Retry {
            id, document_url, ..
        } => {
            require_user(app)?;
            app.dispatch(Msg::SubmissionsLookupOpened(failed_lookup()));
            app.settle(timeout)?;
            if app.state().find_submission(id).is_none() {
                bail!("no failed submission with id {id} among your latest {MAX_PAGE_SIZE}");
            }

            app.watch_retry(id.clone());
            app.dispatch(Msg::RetryRequested {
                submission_id: id.clone(),
                document_url: document_url.clone(),
            });
            app.settle(timeout)?;
            if app.state().retries().needs_document_url(id) {
                bail!("submission {id} needs the document URL, pass --document-url");
            }

            let view = app.view();
            let Some(row) = view.submissions.iter().find(|row| &row.id == id) else {
                bail!("submission {id} disappeared from the table");
            };
            print!("{}", render::retry(row));
            if view.detail.document.is_some() {
                print!("\n{}", render::detail(&view.detail));
            }
            let failed = row.retry_error.is_some();
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
    }
}

fn require_user(app: &App) -> Result<()> {
    if app.state().user_email().is_none() {
        bail!("this command needs --email (or LENS_USER_EMAIL)");
    }
    Ok(())
}

fn open_submissions(app: &mut App, args: &SubmissionsArgs, timeout: Duration) -> Result<()> {
    let query = args.to_query();
    if app.state().is_admin() {
        app.dispatch(Msg::SubmissionsPageOpened);
        if let Some(query) = &query {
            app.dispatch(Msg::UrlRestored(query.to_query_string()));
        }
        if let Some(user) = &args.user {
            app.dispatch(Msg::UserEmailFilterChanged(Some(user.clone())));
            if let Some(page) = args.page {
                app.dispatch(Msg::PageSelected(page));
            }
        }
        app.dispatch(Msg::AdminSearchTriggered);
    } else {
        if let Some(query) = &query {
            app.dispatch(Msg::UrlRestored(query.to_query_string()));
        }
        app.dispatch(Msg::SubmissionsPageOpened);
    }
    app.settle(timeout)?;
    Ok(())
}

/// The user's failed submissions, as many as one page holds.
pub(crate) fn failed_lookup() -> SearchQuery {
    SearchQuery {
        status: Some(SubmissionStatus::Failed),
        page_size: MAX_PAGE_SIZE,
        ..SearchQuery::default()
    }
}

fn exit_code(error: Option<&ErrorView>) -> ExitCode {
    match error {
        Some(_) => ExitCode::FAILURE,
        None => ExitCode::SUCCESS,
    }
}
