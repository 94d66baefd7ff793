use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagepress")]
#[command(
    version,
    about = "Pagepress - Render URLs and HTML documents to PDF with headless Chromium",
    long_about = "Pagepress\n\nModes:\n- serve: run the HTTP API (POST /api/generate-pdf).\n- render: one-shot render of a URL or HTML file to a PDF file.\n- check: probe for a usable Chromium binary.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable debug logging (overrides RUST_LOG)")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) for limits, timeouts, profiles and server settings; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP rendering service
    Serve {
        #[arg(long, default_value = "0.0.0.0", help = "Address to bind")]
        bind: String,

        #[arg(long, default_value = "3001", help = "Port to listen on (PORT env also honoured)")]
        port: u16,

        #[arg(
            long,
            default_value = "4",
            help = "Maximum renders running at once; further requests wait"
        )]
        max_concurrent: usize,

        #[arg(long, help = "Also accept render requests on POST /")]
        root_route: bool,
    },

    /// Render a single URL or HTML file to a PDF file
    #[command(group(ArgGroup::new("input").required(true).args(["url", "html_file"])))]
    Render {
        #[arg(long, help = "http(s) URL to render")]
        url: Option<String>,

        #[arg(long, value_name = "PATH", help = "HTML document to render")]
        html_file: Option<PathBuf>,

        #[arg(
            long,
            value_name = "PATH",
            help = "JSON array of cookies ({name, value, url?, domain?, ...})"
        )]
        cookies: Option<PathBuf>,

        #[arg(long, value_name = "JSON", help = "Render options object (inline JSON)")]
        options: Option<String>,

        #[arg(
            long,
            value_name = "JSON",
            help = "PDF options object (inline JSON); wins over --options"
        )]
        pdf_options: Option<String>,

        #[arg(long, short, value_name = "PATH", help = "Where to write the PDF")]
        output: PathBuf,

        #[arg(long, value_enum, default_value = "json", help = "Status output format")]
        format: OutputFormat,
    },

    /// Probe for a usable browser binary
    Check {
        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
