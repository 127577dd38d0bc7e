//! CLI module for vidsage.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::content::ContentType;
use clap::{Parser, Subcommand};

/// vidsage - Ask questions about your videos, documents and comments
///
/// Ingests YouTube transcripts, document text and YouTube comments into an
/// owner-scoped vector store and answers questions about them with citations.
#[derive(Parser, Debug)]
#[command(name = "vidsage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Owner whose library is used (defaults to general.default_owner)
    #[arg(short, long, global = true, env = "VIDSAGE_OWNER")]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest already-extracted text (a transcript or document)
    Ingest {
        /// Text file to ingest ('-' reads stdin)
        input: String,

        /// Content type of the text (transcript, document)
        #[arg(short = 't', long = "type", default_value = "transcript")]
        content_type: ContentType,

        /// Source id: YouTube URL/ID for transcripts, document id for documents
        #[arg(short, long)]
        source: String,

        /// Source title (defaults to the source id)
        #[arg(long)]
        title: Option<String>,

        /// Replace this owner's existing chunks for the source
        #[arg(long)]
        replace: bool,
    },

    /// Ingest YouTube comments from a JSON file
    IngestComments {
        /// JSON file holding an array of comments ('-' reads stdin)
        input: String,

        /// YouTube URL or video ID the comments belong to
        #[arg(long)]
        video: String,

        /// Video title
        #[arg(long)]
        title: Option<String>,
    },

    /// Ask a question and get an answer from your library
    Ask {
        /// The question to ask
        question: String,

        /// Content type to ask about (transcript, document, comment)
        #[arg(short = 't', long = "type", default_value = "transcript")]
        content_type: ContentType,

        /// Restrict the question to one source
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum number of context chunks (1-10)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Search for relevant excerpts without generating an answer
    Search {
        /// Search query
        query: String,

        /// Content type to search (transcript, document, comment)
        #[arg(short = 't', long = "type", default_value = "transcript")]
        content_type: ContentType,

        /// Restrict the search to one source
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum number of results (1-10)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List ingested sources
    List,

    /// Delete a source from your library
    Delete {
        /// Source id (or YouTube URL)
        source: String,

        /// Only delete chunks of this content type
        #[arg(short = 't', long = "type")]
        content_type: Option<ContentType>,
    },

    /// Show top comments and sentiment for a video
    Insights {
        /// YouTube URL or video ID
        video: String,
    },

    /// Generate a description and viewer Q&A for an ingested video
    Analyze {
        /// YouTube URL or video ID
        video: String,

        /// Video duration in seconds, shown to the model
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
