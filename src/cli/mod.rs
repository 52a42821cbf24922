use crate::domain::{ProjectLookup, get_sort_field};
use crate::infra::{LoadDatasetError, ResolveDatasetPathError, load_dataset, resolve_dataset_path};
use crate::ui::fields::{RenderContext, field_formatter, get_field_renderer};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui { dataset: Option<PathBuf> },
    Command(CliCommand),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    /// Print every grid column with its declared type and sort key.
    Columns { dataset: Option<PathBuf> },
    /// Print one column's rendered text for every event.
    Render {
        dataset: Option<PathBuf>,
        field: String,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("missing required flag: {0}")]
    MissingFlag(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1).peekable();

    let Some(first) = iter.next() else {
        return Ok(CliInvocation::Tui { dataset: None });
    };

    match first.as_str() {
        "columns" => {
            let mut dataset: Option<PathBuf> = None;
            for arg in iter {
                match arg.as_str() {
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        if dataset.is_some() {
                            return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                        }
                        dataset = Some(PathBuf::from(arg));
                    }
                }
            }
            Ok(CliInvocation::Command(CliCommand::Columns { dataset }))
        }
        "render" => {
            let mut dataset: Option<PathBuf> = None;
            let mut field: Option<String> = None;

            let mut args = iter.peekable();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--field" | "-f" => {
                        let value = args.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--field".to_string())
                        })?;
                        field = Some(value.to_string());
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        if dataset.is_some() {
                            return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                        }
                        dataset = Some(PathBuf::from(arg));
                    }
                }
            }

            let field = field.ok_or_else(|| CliParseError::MissingFlag("--field".to_string()))?;
            Ok(CliInvocation::Command(CliCommand::Render { dataset, field }))
        }
        _ if first.starts_with('-') => Err(CliParseError::UnknownFlag(first.to_string())),
        _ => {
            if let Some(extra) = iter.next() {
                return Err(CliParseError::UnexpectedArgument(extra.to_string()));
            }
            Ok(CliInvocation::Tui {
                dataset: Some(PathBuf::from(first)),
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Load(#[from] LoadDatasetError),

    #[error(transparent)]
    ResolveDatasetPath(#[from] ResolveDatasetPathError),

    #[error("unknown field: {0}")]
    UnknownField(String),
}

pub fn run_command(command: CliCommand) -> Result<(), CliRunError> {
    match command {
        CliCommand::Columns { dataset } => run_columns(dataset),
        CliCommand::Render { dataset, field } => run_render(dataset, &field),
    }
}

fn dataset_path(dataset: Option<PathBuf>) -> Result<PathBuf, CliRunError> {
    match dataset {
        Some(path) => Ok(path),
        None => Ok(resolve_dataset_path()?),
    }
}

fn run_columns(dataset: Option<PathBuf>) -> Result<(), CliRunError> {
    let path = dataset_path(dataset)?;
    let dataset = load_dataset(&path)?;

    println!(
        "{:<32} {:<12} {:<9} {}",
        "FIELD", "TYPE", "SORTABLE", "SORT KEY"
    );
    for field in &dataset.fields {
        let declared = dataset.meta.get(field).copied();
        let type_label = declared.map_or("-", |field_type| field_type.label());
        let type_sortable = declared.map_or("-", |field_type| {
            if field_formatter(field_type).sortable {
                "yes"
            } else {
                "no"
            }
        });
        let sort = get_sort_field(field, Some(&dataset.meta))
            .unwrap_or_else(|| "(not sortable)".to_string());
        println!("{field:<32} {type_label:<12} {type_sortable:<9} {sort}");
    }
    Ok(())
}

fn run_render(dataset: Option<PathBuf>, field: &str) -> Result<(), CliRunError> {
    let path = dataset_path(dataset)?;
    let dataset = load_dataset(&path)?;

    if !dataset.fields.iter().any(|name| name == field) {
        return Err(CliRunError::UnknownField(field.to_string()));
    }

    // Headless rendering resolves projects synchronously.
    let projects = ProjectLookup::resolved(dataset.projects);
    let context = RenderContext {
        organization: &dataset.organization,
        projects: &projects,
    };
    let renderer = get_field_renderer(field, &dataset.meta);

    for event in &dataset.events {
        let rendered = renderer(&event.data, &context);
        println!("{}", rendered.text());
    }
    Ok(())
}

pub fn print_help() {
    println!("evgrid — explore error-monitoring events in a terminal grid");
    println!();
    println!("Usage:");
    println!("  evgrid [DATASET]                open the grid (default dataset path otherwise)");
    println!("  evgrid columns [DATASET]        list columns with types and sort keys");
    println!("  evgrid render [DATASET] -f F    print field F rendered for every event");
    println!();
    println!("Flags:");
    println!("  -f, --field <NAME>              field to render (render subcommand)");
    println!("  -h, --help                      print this help");
    println!("  -V, --version                   print the version");
    println!();
    println!("The default dataset path honors EVGRID_DATASET.");
}

pub fn print_version() {
    println!("evgrid {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        std::iter::once("evgrid")
            .chain(parts.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_arguments_opens_the_tui() {
        assert_eq!(
            parse_invocation(&args(&[])).unwrap(),
            CliInvocation::Tui { dataset: None }
        );
    }

    #[test]
    fn dataset_path_argument_opens_the_tui_on_it() {
        assert_eq!(
            parse_invocation(&args(&["events.json"])).unwrap(),
            CliInvocation::Tui {
                dataset: Some(PathBuf::from("events.json"))
            }
        );
    }

    #[test]
    fn help_flag_wins_anywhere() {
        assert_eq!(
            parse_invocation(&args(&["columns", "--help"])).unwrap(),
            CliInvocation::PrintHelp
        );
    }

    #[test]
    fn columns_subcommand_takes_an_optional_dataset() {
        assert_eq!(
            parse_invocation(&args(&["columns"])).unwrap(),
            CliInvocation::Command(CliCommand::Columns { dataset: None })
        );
        assert_eq!(
            parse_invocation(&args(&["columns", "events.json"])).unwrap(),
            CliInvocation::Command(CliCommand::Columns {
                dataset: Some(PathBuf::from("events.json"))
            })
        );
    }

    #[test]
    fn render_requires_a_field() {
        assert!(matches!(
            parse_invocation(&args(&["render", "events.json"])),
            Err(CliParseError::MissingFlag(_))
        ));
        assert_eq!(
            parse_invocation(&args(&["render", "events.json", "--field", "release"])).unwrap(),
            CliInvocation::Command(CliCommand::Render {
                dataset: Some(PathBuf::from("events.json")),
                field: "release".to_string(),
            })
        );
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(matches!(
            parse_invocation(&args(&["columns", "--nope"])),
            Err(CliParseError::UnknownFlag(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["--nope"])),
            Err(CliParseError::UnknownFlag(_))
        ));
    }

    #[test]
    fn extra_positional_arguments_are_rejected() {
        assert!(matches!(
            parse_invocation(&args(&["a.json", "b.json"])),
            Err(CliParseError::UnexpectedArgument(_))
        ));
    }
}
