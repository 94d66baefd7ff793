mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_check, run_render, run_serve};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let args = cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Serve {
            bind,
            port,
            max_concurrent,
            root_route,
        } => {
            run_serve(
                &raw_args,
                args.config,
                args.verbose,
                bind,
                port,
                max_concurrent,
                root_route,
            )
            .await
        }
        Commands::Render {
            url,
            html_file,
            cookies,
            options,
            pdf_options,
            output,
            format,
        } => {
            run_render(
                args.config,
                url,
                html_file,
                cookies,
                options,
                pdf_options,
                output,
                format,
            )
            .await
        }
        Commands::Check { format } => run_check(args.config, format).await,
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug,hyper=info,chromiumoxide=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,pagepress=info,pagepress_lib=info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
