//! Command-line surface of `qfly`.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use queryfly::{
    bind, parse_query_string_with_diagnostics, Builder, ColumnCatalog, MalformedFragment,
    StructuredQuery,
};
use queryfly_client::ClientConfig;
use serde::Serialize;

/// Parse and compile queryfly query strings.
#[derive(Debug, Parser)]
#[command(name = "qfly", version, about)]
pub struct Cli {
    /// Log at debug level (overrides QUERYFLY_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json, global = true)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the structured form of a query string
    Parse {
        /// Query string, e.g. "age=gte:18&_limit=10"
        query: String,

        /// Also list the fragments that were dropped
        #[arg(long)]
        diagnostics: bool,
    },
    /// Turn a query string into a request against a collection
    Compile {
        /// Query string, e.g. "age=gte:18&_limit=10"
        query: String,

        /// Target collection
        #[arg(short, long)]
        collection: String,

        /// Known columns; a projection naming anything else is rejected
        #[arg(long, value_delimiter = ',')]
        known: Option<Vec<String>>,

        /// Client config (YAML or JSON) used to print the full URL
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Yaml,
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    query: &'a StructuredQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    dropped: Option<&'a [MalformedFragment]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negated_keys: Option<&'a [String]>,
}

#[derive(Serialize)]
struct CompileOutput {
    path: String,
    query: String,
    url: String,
    projection: Vec<String>,
}

/// Runs a command and returns what should be printed.
pub fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Command::Parse { query, diagnostics } => {
            let parsed = parse_query_string_with_diagnostics(query);
            let output = ParseOutput {
                query: &parsed.query,
                dropped: diagnostics.then_some(parsed.dropped.as_slice()),
                negated_keys: diagnostics.then_some(parsed.negated_keys.as_slice()),
            };
            render(&output, cli.format)
        }
        Command::Compile {
            query,
            collection,
            known,
            config,
        } => {
            let parsed = queryfly::parse_query_string(query);
            let catalog: Option<BTreeSet<String>> =
                known.as_ref().map(|cols| cols.iter().cloned().collect());

            let mut builder = Builder::new(collection.as_str());
            let bound = bind(
                &parsed,
                &mut builder,
                catalog.as_ref().map(|c| c as &dyn ColumnCatalog),
            )?;
            let projection = bound.projection;
            let request = builder.compile()?;

            let url = match config {
                Some(path) => {
                    let config = ClientConfig::load(path)
                        .with_context(|| format!("loading {}", path.display()))?;
                    format!("{}{}", config.base_url()?, request.url())
                }
                None => request.url(),
            };

            let output = CompileOutput {
                path: request.path,
                query: request.query,
                url,
                projection,
            };
            render(&output, cli.format)
        }
    }
}

fn render<T: Serialize>(value: &T, format: Format) -> Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(value)?),
        Format::Yaml => Ok(serde_yaml::to_string(value)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        run(&cli)
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["qfly", "-v", "parse", "age=eq:1", "--diagnostics"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, Format::Json);
        assert!(matches!(cli.command, Command::Parse { diagnostics: true, .. }));

        let cli = Cli::try_parse_from([
            "qfly", "compile", "a=eq:1", "-c", "users", "--known", "a,b", "--format", "yaml",
        ])
        .unwrap();
        assert_eq!(cli.format, Format::Yaml);
        match cli.command {
            Command::Compile {
                collection, known, ..
            } => {
                assert_eq!(collection, "users");
                assert_eq!(known, Some(vec!["a".to_string(), "b".to_string()]));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn compile_requires_collection() {
        assert!(Cli::try_parse_from(["qfly", "compile", "a=eq:1"]).is_err());
    }

    #[test]
    fn parse_outputs_structured_query() {
        let out = run_args(&["qfly", "parse", "age=gte:18&_limit=10"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["query"]["filters"][0]["field"], "age");
        assert_eq!(value["query"]["filters"][0]["operator"], ">=");
        assert_eq!(value["query"]["directives"][0]["kind"], "limit");
        assert!(value.get("dropped").is_none());
    }

    #[test]
    fn parse_diagnostics_lists_drops() {
        let out = run_args(&["qfly", "parse", "age=bogus:1&!x=eq:2", "--diagnostics"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["dropped"][0]["key"], "age");
        assert_eq!(value["negated_keys"][0], "x");
    }

    #[test]
    fn compile_outputs_request() {
        let out = run_args(&["qfly", "compile", "age=gte:18&_field=name&_limit=5", "-c", "users"])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["path"], "/users/query");
        assert_eq!(value["query"], "age=gte:18&_limit=5");
        assert_eq!(value["url"], "/users/query?age=gte:18&_limit=5");
        assert_eq!(value["projection"][0], "name");
    }

    #[test]
    fn compile_rejects_unknown_projection() {
        let err = run_args(&[
            "qfly", "compile", "_field=name,ghost", "-c", "users", "--known", "name,age",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn yaml_output() {
        let out = run_args(&["qfly", "--format", "yaml", "compile", "a=eq:1", "-c", "t"]).unwrap();
        assert!(out.contains("path: /t/query"));
    }
}
