use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    name = "article-cache",
    version,
    about = "Offline article cache tool",
    long_about = "Downloads article resources into a write-once content store,\n\
                  migrates previously cached content into it, and inspects\n\
                  stored entries by cache key."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Cache root directory
    #[arg(
        long,
        global = true,
        env = "ARTICLE_CACHE_DIR",
        help = "Directory holding cached entries (default: <tmp>/article-cache)"
    )]
    pub cache_dir: Option<PathBuf>,

    /// Bundled offline assets directory
    #[arg(
        long,
        global = true,
        env = "ARTICLE_CACHE_ASSETS_DIR",
        help = "Directory containing baseCSS.css, siteCSS.css, pcsCSS.css and pcsJS.js"
    )]
    pub assets_dir: Option<PathBuf>,

    /// Store entries under the raw cache key instead of its hash
    #[arg(long, global = true, help = "Use cache keys verbatim as file names")]
    pub raw_file_names: bool,

    /// Overall request timeout in seconds
    #[arg(
        long,
        global = true,
        default_value = "30",
        help = "Overall timeout in seconds for HTTP requests (0 disables)"
    )]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        global = true,
        default_value = "10",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Custom HTTP headers for download requests
    #[arg(
        long = "header",
        short = 'H',
        global = true,
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Disable system proxy settings
    #[arg(long, global = true, help = "Ignore system proxy settings for downloads")]
    pub no_system_proxy: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable detailed debug logging")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download resources into the cache
    Add {
        /// Group the downloads are tracked under (usually the article title)
        #[arg(short, long, default_value = "cli")]
        group: String,

        /// Item keys (resource URLs) to cache
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Copy previously cached content into the store
    Migrate {
        /// Desktop URL of the article the content belongs to
        #[arg(short, long)]
        url: String,

        /// File holding the legacy content
        #[arg(short, long)]
        content: PathBuf,

        /// MIME type recorded for the content
        #[arg(short, long, default_value = "text/html")]
        mime_type: String,

        /// Item keys to store the content under
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Show where cache keys are stored and their metadata
    Inspect {
        /// Treat the arguments as image URLs and look up their shared image key
        #[arg(long)]
        image: bool,

        /// Item keys to look up
        #[arg(required = true)]
        keys: Vec<String>,
    },
}
