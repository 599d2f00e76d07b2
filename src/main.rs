use clap::Parser;
use miette::Result;
use minispec::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "MINISPEC_LOG";

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Query(cmd) => minispec::cli::commands::query::run(cmd, &global),
        Commands::Update(cmd) => minispec::cli::commands::update::run(cmd, &global),
        Commands::Validate(args) => minispec::cli::commands::validate::run(args, &global),
        Commands::Phase(args) => minispec::cli::commands::phase::run(args, &global),
        Commands::Completions(args) => minispec::cli::commands::completions::run(args),
    }
}

/// Log to stderr so stdout stays clean for piping
fn init_tracing(global: &GlobalOpts) {
    let default = if global.verbose { "minispec=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
