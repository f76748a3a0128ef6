use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use psb_portal::config::AppConfig;
use psb_portal::error::AppError;
use psb_portal::otp::{LogSmsGateway, OtpPolicy, OtpService};
use psb_portal::reference::{LocationKind, ReferenceImporter};
use psb_portal::schema::Role;

use crate::demo::{run_demo, DemoArgs};
use crate::infra::{connect_storage, parse_role};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "PSB Recruitment Portal",
    about = "Serve and administer the Public Service Board recruitment portal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// One-time passcode maintenance
    Otp {
        #[command(subcommand)]
        command: OtpCommand,
    },
    /// Portal user administration
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Load county, constituency or ward codes from a CSV file
    Import(ImportArgs),
    /// Walk one application from profile to hire against in-memory storage
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum OtpCommand {
    /// Delete expired passcodes
    Cleanup(StorageArgs),
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// Assign a role to an existing user
    GrantRole(GrantRoleArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct StorageArgs {
    /// Use seeded in-memory storage even when DATABASE_URL is set
    #[arg(long)]
    pub(crate) memory: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
}

#[derive(Args, Debug)]
struct GrantRoleArgs {
    /// Identity-provider subject of the user
    user_id: String,
    /// applicant, admin or board
    #[arg(value_parser = parse_role)]
    role: Role,
    #[command(flatten)]
    storage: StorageArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ImportKind {
    Counties,
    Constituencies,
    Wards,
}

impl From<ImportKind> for LocationKind {
    fn from(kind: ImportKind) -> Self {
        match kind {
            ImportKind::Counties => LocationKind::Counties,
            ImportKind::Constituencies => LocationKind::Constituencies,
            ImportKind::Wards => LocationKind::Wards,
        }
    }
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[arg(value_enum)]
    kind: ImportKind,
    /// CSV with `code,name` plus the parent code for constituencies and wards
    path: PathBuf,
    #[command(flatten)]
    storage: StorageArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Otp {
            command: OtpCommand::Cleanup(args),
        } => cleanup_otps(args).await,
        Command::Users {
            command: UsersCommand::GrantRole(args),
        } => grant_role(args).await,
        Command::Import(args) => import_locations(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

async fn cleanup_otps(args: StorageArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let storage = connect_storage(&config, args.memory).await?;
    let otp = OtpService::new(
        storage,
        Arc::new(LogSmsGateway),
        OtpPolicy::from(config.otp),
    );
    let removed = otp.cleanup_expired().await?;
    println!("Removed {removed} expired passcode(s)");
    Ok(())
}

async fn grant_role(args: GrantRoleArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let storage = connect_storage(&config, args.storage.memory).await?;
    let user = storage.set_user_role(&args.user_id, args.role).await?;
    println!("{} is now {}", user.id, user.role);
    Ok(())
}

async fn import_locations(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let storage = connect_storage(&config, args.storage.memory).await?;
    let kind = LocationKind::from(args.kind);
    let summary = ReferenceImporter::from_path(storage.as_ref(), kind, &args.path).await?;

    println!("Imported {} {}", summary.upserted, kind.label());
    if !summary.skipped_lines.is_empty() {
        let lines: Vec<String> = summary
            .skipped_lines
            .iter()
            .map(|line| line.to_string())
            .collect();
        println!("Skipped lines with unknown parent codes: {}", lines.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["psb-portal"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn grant_role_parses_role_names() {
        let cli = Cli::try_parse_from(["psb-portal", "users", "grant-role", "user-9", "Board"])
            .expect("parses");
        match cli.command {
            Some(Command::Users {
                command: UsersCommand::GrantRole(args),
            }) => {
                assert_eq!(args.user_id, "user-9");
                assert_eq!(args.role, Role::Board);
                assert!(!args.storage.memory);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(
            Cli::try_parse_from(["psb-portal", "users", "grant-role", "user-9", "superuser"])
                .is_err()
        );
    }

    #[test]
    fn import_takes_kind_and_path() {
        let cli = Cli::try_parse_from([
            "psb-portal",
            "import",
            "wards",
            "data/wards.csv",
            "--memory",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Import(args)) => {
                assert!(matches!(args.kind, ImportKind::Wards));
                assert_eq!(args.path, PathBuf::from("data/wards.csv"));
                assert!(args.storage.memory);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
