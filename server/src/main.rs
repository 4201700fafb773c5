use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::warn;
use rsvp_server::cli_error::CliError;
use std::path::PathBuf;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    if let Err(e) = run_command(args.command) {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => rsvp_server::web::serve(),
        Command::MigrateDatabase => rsvp_server::cli::database_migration::run_migrations(),
        Command::LoadGuests { path } => rsvp_server::cli::manage_guests::load_guests_from_file(
            &path,
            rsvp_server::CliAuthTokenKey::new(),
        ),
        Command::ListGuests => rsvp_server::cli::manage_guests::print_guest_list(),
        Command::RsvpLog => rsvp_server::cli::manage_guests::print_rsvp_log(),
        Command::AddAdmin => rsvp_server::cli::manage_admins::add_admin(),
        Command::ListAdmins => rsvp_server::cli::manage_admins::print_admin_list(),
    }
}

/// Guest list, RSVP and door check-in server for weddings and similar events
#[derive(Debug, Parser)]
#[clap(name = "rsvp-server", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the RSVP web application
    Serve,
    /// Migrate the database schema to the current version
    MigrateDatabase,
    /// Create or update guests from a JSON file
    LoadGuests {
        /// The path of the JSON file to read from. It must contain a list of guest objects.
        path: PathBuf,
    },
    /// Print all guests with their RSVP status
    ListGuests,
    /// Print the log of all RSVP answers
    RsvpLog,
    /// Create a new admin account interactively
    AddAdmin,
    /// Print all admin accounts
    ListAdmins,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
