use std::io::IsTerminal;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::instrument;

use rupload_tools_rupload::{fetch, share, upload};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rupload",
    version,
    about = "Upload files to a Nextcloud/ownCloud shared drop folder",
    long_about = "`rupload` uploads files into a Nextcloud/ownCloud shared folder using its public share link.

Files can be local, or - with --scp - copied from remote hosts first using `scp` syntax
(`[user@]host:path`, `[user@][ipv6]:path` or `scp://[user@]host[:port]/path`).

EXAMPLES:
    # Upload local files
    rupload https://cloud.example.com/index.php/s/AbC123 report.pdf logs.tar.gz

    # Upload into a password protected share
    rupload -p https://cloud.example.com/s/AbC123 report.pdf

    # Fetch remote files with scp and upload them
    rupload --scp https://cloud.example.com/s/AbC123 user@host:/var/log/syslog

Uploads are done with `curl`, remote files are fetched with `scp`; both must be installed."
)]
struct Args {
    // Upload options
    /// Prompt for the share link password
    #[arg(short = 'p', help_heading = "Upload options")]
    prompt_password: bool,

    /// Treat input files as scp locations
    ///
    /// Each file is copied into a temporary directory with `scp` before being uploaded. The
    /// temporary directory is removed when rupload exits.
    #[arg(long, help_heading = "Upload options")]
    scp: bool,

    // External tools
    /// scp executable used to fetch remote files
    #[arg(
        long,
        default_value = "scp",
        value_name = "PATH",
        help_heading = "External tools"
    )]
    scp_bin: std::path::PathBuf,

    /// curl executable used to upload files
    #[arg(
        long,
        default_value = "curl",
        value_name = "PATH",
        help_heading = "External tools"
    )]
    curl_bin: std::path::PathBuf,

    // Progress & output
    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Verbose level (implies "summary"): -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // Advanced settings
    /// Number of worker threads (0 = number of CPU cores)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_workers: usize,

    /// Number of blocking worker threads (0 = Tokio default of 512)
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_blocking_threads: usize,

    // ARGUMENTS
    /// The Nextcloud/ownCloud share link URL
    #[arg()]
    share_link: String,

    /// Files to upload
    #[arg(required = true)]
    files: Vec<String>,
}

async fn prompt_password() -> anyhow::Result<String> {
    if !std::io::stdin().is_terminal() {
        return Err(anyhow!("Cannot prompt for password when not on a TTY"));
    }
    let password = tokio::task::spawn_blocking(|| {
        dialoguer::Password::new()
            .with_prompt("Enter password for share link")
            .allow_empty_password(true)
            .interact()
    })
    .await?
    .context("failed reading password")?;
    Ok(password)
}

fn validate_files(args: &Args) -> anyhow::Result<()> {
    if args.scp {
        // also catches sources without a file name before anything is uploaded
        for file in &args.files {
            fetch::staged_name(file)?;
        }
        return Ok(());
    }
    for file in &args.files {
        if file.contains("://") && !std::path::Path::new(file).exists() {
            return Err(anyhow!(
                "Given file path {file:?} looks like a URL and does not exist locally, did you \
                mix up the syntax or forget --scp?"
            ));
        }
    }
    Ok(())
}

#[instrument]
async fn async_main(args: Args) -> anyhow::Result<upload::Summary> {
    validate_files(&args)?;
    let password = if args.prompt_password {
        prompt_password().await?
    } else {
        String::new()
    };
    let share = share::parse(&args.share_link)?;
    tracing::info!("uploading into {} (token {})", share.base_url, share.token);
    let staging = if args.scp {
        Some(fetch::Staging::new()?)
    } else {
        None
    };
    let fetch_settings = fetch::Settings {
        scp_bin: args.scp_bin.clone(),
    };
    let upload_settings = upload::Settings {
        curl_bin: args.curl_bin.clone(),
        password,
    };
    let mut summary = upload::Summary::default();
    // an early return drops the staging directory, which removes it
    for file in &args.files {
        let local = match &staging {
            Some(staging) => {
                if !args.quiet {
                    eprintln!("Downloading {file}");
                }
                let local = fetch::fetch(file, staging, &fetch_settings)
                    .await
                    .with_context(|| format!("failed fetching {file:?}"))?;
                summary.files_fetched += 1;
                local
            }
            None => std::path::PathBuf::from(file),
        };
        if !args.quiet {
            eprintln!("Uploading {}", local.display());
        }
        summary = summary
            + upload::upload(&local, &share, &upload_settings)
                .await
                .with_context(|| format!("failed uploading {:?}", &local))?;
    }
    if let Some(staging) = staging {
        staging.close()?;
    }
    Ok(summary)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary,
    };
    let runtime = common::RuntimeConfig {
        max_workers: args.max_workers,
        max_blocking_threads: args.max_blocking_threads,
    };
    let res = common::run(output, runtime, func);
    if res.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
