use crate::server;
use autocare::error::AppError;
use autocare::validation::{parse_kilometer_value, parse_monetary_value, validate_document};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(
    name = "Autocare API",
    about = "Run the vehicle maintenance API or check values from the command line",
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
    /// Validate or parse a single value and print the JSON result
    Validate {
        #[command(subcommand)]
        command: ValidateCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ValidateCommand {
    /// Check a CPF or CNPJ, formatted or bare
    Document { value: String },
    /// Parse a monetary amount such as "R$ 1.234,56"
    Money { value: String },
    /// Parse an odometer reading such as "152.000 km"
    Km { value: String },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Validate { command } => run_validate(command),
    }
}

fn run_validate(command: ValidateCommand) -> Result<(), AppError> {
    let (report, failure) = validation_report(&command);
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| AppError::Invalid(format!("unable to render result: {err}")))?;
    println!("{rendered}");

    match failure {
        Some(reason) => Err(AppError::Invalid(reason)),
        None => Ok(()),
    }
}

/// JSON result for `command`, plus the failure reason when the value was rejected.
fn validation_report(command: &ValidateCommand) -> (Value, Option<String>) {
    let json = |value: Result<Value, serde_json::Error>| value.unwrap_or(Value::Null);

    match command {
        ValidateCommand::Document { value } => {
            let result = validate_document(value);
            let failure = (!result.is_valid).then(|| {
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("'{value}' is not a valid document"))
            });
            (json(serde_json::to_value(&result)), failure)
        }
        ValidateCommand::Money { value } => {
            let parsed = parse_monetary_value(Some(value));
            let failure = parsed.error().map(str::to_string);
            (json(serde_json::to_value(&parsed)), failure)
        }
        ValidateCommand::Km { value } => {
            let parsed = parse_kilometer_value(Some(value));
            let failure = parsed.error().map(str::to_string);
            (json(serde_json::to_value(&parsed)), failure)
        }
    }
}
