use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "locale-duper")]
#[command(about = "Copy localized content from one locale to another", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the site's locales; the first one is the main locale
    Locales,
    /// List the models that can be duplicated
    Models {
        /// Include block models
        #[arg(long)]
        all: bool,
    },
    /// List the fields of a model
    Fields {
        /// Model ID
        #[arg(long)]
        model: String,
    },
    /// Copy every localized field from one locale to another
    Duplicate(DuplicateArgs),
    /// Copy one field of one record to another locale
    CopyField(CopyFieldArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct DuplicateArgs {
    /// Source locale; defaults to the site's main locale
    #[arg(long)]
    pub from: Option<String>,
    /// Target locale
    #[arg(long)]
    pub to: String,
    /// Restrict to these model IDs (repeatable); all models when omitted
    #[arg(long = "model")]
    pub models: Vec<String>,
    /// Skip the confirmation prompts
    #[arg(short, long)]
    pub yes: bool,
    /// List the error of every failed record in the summary
    #[arg(long)]
    pub show_errors: bool,
}

#[derive(Debug, Args)]
pub struct CopyFieldArgs {
    /// Record ID
    #[arg(long)]
    pub record: String,
    /// Field API key
    #[arg(long)]
    pub field: String,
    #[arg(long)]
    pub from: String,
    #[arg(long)]
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_duplicate() {
        let cli = Cli::parse_from([
            "locale-duper",
            "duplicate",
            "--to",
            "fr",
            "--model",
            "m1",
            "--model",
            "m2",
            "-y",
        ]);
        match cli.command {
            Some(Commands::Duplicate(args)) => {
                assert_eq!(args.from, None);
                assert_eq!(args.to, "fr");
                assert_eq!(args.models, vec!["m1", "m2"]);
                assert!(args.yes);
                assert!(!args.show_errors);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
