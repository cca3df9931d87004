use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lens_core::{DocumentType, SearchQuery, SortOrder, SubmissionStatus, DEFAULT_PAGE_SIZE};
use log::LevelFilter;

use crate::platform::app::DuplicatePolicy;

/// Submit and browse terms-of-service and privacy-policy analyses.
#[derive(Parser, Debug)]
#[command(name = "lens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Email of the signed-in user
    #[arg(long, global = true, env = "LENS_USER_EMAIL")]
    pub email: Option<String>,

    /// Act with administrator rights
    #[arg(long, global = true)]
    pub admin: bool,

    /// Settings file (ron); defaults to ./lens.ron when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Seconds to wait for the server before giving up
    #[arg(long, global = true, default_value_t = 120)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show how many documents have been analysed
    Stats,

    /// Search analysed documents
    Documents {
        /// Company name or URL fragment
        text: String,

        /// tos or pp
        #[arg(long = "type")]
        document_type: Option<DocumentType>,

        /// Result pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Show one document analysis
    Document {
        id: String,

        /// Do not count this read as a view
        #[arg(long)]
        skip_view_increment: bool,
    },

    /// List submissions (your own, or everyone's with --admin)
    #[command(alias = "ls")]
    Submissions(SubmissionsArgs),

    /// Submit a URL for analysis
    Submit {
        /// Company site or document URL
        url: String,

        /// tos or pp
        #[arg(long = "type")]
        document_type: DocumentType,

        /// Exact URL of the document, when it cannot be discovered
        #[arg(long)]
        document_url: Option<String>,

        #[arg(long, value_enum, default_value = "ask")]
        on_duplicate: DuplicatePolicy,
    },

    /// Retry a failed submission
    Retry {
        /// Submission id
        id: String,

        /// Exact URL of the document
        #[arg(long)]
        document_url: Option<String>,

        #[arg(long, value_enum, default_value = "ask")]
        on_duplicate: DuplicatePolicy,
    },
}

impl Cli {
    /// Unknown level names fall back to `warn`.
    pub fn log_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }
}

impl Command {
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        match self {
            Command::Submit { on_duplicate, .. } | Command::Retry { on_duplicate, .. } => {
                *on_duplicate
            }
            _ => DuplicatePolicy::Abort,
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct SubmissionsArgs {
    /// Free-text filter
    #[arg(long)]
    pub q: Option<String>,

    /// tos or pp
    #[arg(long = "type")]
    pub document_type: Option<DocumentType>,

    /// initialized, processing, success or failed
    #[arg(long)]
    pub status: Option<SubmissionStatus>,

    /// Only this user's submissions (admin only)
    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub per_page: Option<u32>,

    /// asc or desc
    #[arg(long)]
    pub order: Option<SortOrder>,

    #[arg(long)]
    pub page: Option<u32>,
}

impl SubmissionsArgs {
    /// Table query from the flags, or `None` to keep the remembered one.
    pub fn to_query(&self) -> Option<SearchQuery> {
        let untouched = self.q.is_none()
            && self.document_type.is_none()
            && self.status.is_none()
            && self.per_page.is_none()
            && self.order.is_none()
            && self.page.is_none();
        if untouched {
            return None;
        }
        Some(SearchQuery {
            text: self.q.clone().unwrap_or_default(),
            document_type: self.document_type,
            status: self.status,
            user_email: None,
            page: self.page.unwrap_or(1),
            page_size: self.per_page.unwrap_or(DEFAULT_PAGE_SIZE),
            sort_order: self.order.unwrap_or_default(),
        })
    }
}
