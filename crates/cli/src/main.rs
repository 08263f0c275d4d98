use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use qedit_core::config::{config_from_env_values, extension_namespace_from_env_value};
use qedit_core::constants::{EXTENSION_NAMESPACE_ENV, STRICT_ACTIONS_ENV};
use qedit_core::{
    parse_action_log_json, parse_action_log_yaml, Action, Editor, EditorConfig, TreeItemStore,
    ValidationErrors,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "qedit")]
#[command(about = "Questionnaire item-extension editor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the recognised custom extension kinds
    Kinds,
    /// Show the custom extensions of one item
    Show {
        /// Questionnaire file (.yaml/.yml or .json)
        questionnaire: PathBuf,
        /// linkId of the item
        link_id: String,
        /// Validation errors file used to flag rows
        #[arg(long)]
        errors: Option<PathBuf>,
    },
    /// Apply an action log to a questionnaire
    Apply {
        /// Questionnaire file (.yaml/.yml or .json)
        questionnaire: PathBuf,
        /// Action log file (.yaml/.yml or .json)
        actions: PathBuf,
        /// Write the result here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output format (defaults to the input's)
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Fail on the first action that cannot be applied
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("qedit=info".parse()?)
                .add_directive("qedit_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = cli.command else {
        println!("Use 'qedit --help' for commands");
        return Ok(());
    };

    let config = resolve_config(
        &command,
        std::env::var(EXTENSION_NAMESPACE_ENV).ok(),
        std::env::var(STRICT_ACTIONS_ENV).ok(),
    )?;

    match command {
        Commands::Kinds => {
            for option in qedit_core::select_options(config.extension_namespace()) {
                println!("{}\t{}", option.display, option.code);
            }
        }
        Commands::Show {
            questionnaire,
            link_id,
            errors,
        } => {
            let store = read_questionnaire(&questionnaire)?;
            let errors = match errors {
                Some(path) => read_validation_errors(&path)?,
                None => ValidationErrors::default(),
            };
            for line in show_item(config, store, &link_id, &errors)? {
                println!("{line}");
            }
        }
        Commands::Apply {
            questionnaire,
            actions,
            out,
            format,
            ..
        } => {
            let store = read_questionnaire(&questionnaire)?;
            let actions = read_actions(&actions)?;
            let format = format.unwrap_or_else(|| Format::from_path(&questionnaire));

            let action_count = actions.len();
            let (result, applied) = apply_actions(config, store, actions)?;
            tracing::info!("applied {applied} of {action_count} actions");

            let rendered = render_questionnaire(&result, format)?;
            match out {
                Some(path) => std::fs::write(&path, rendered)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{rendered}"),
            }
        }
    }

    Ok(())
}

/// Resolve the config `command` needs from raw environment values.
///
/// Only `apply` looks at the strict-actions flag; `--strict` overrides it.
fn resolve_config(
    command: &Commands,
    namespace: Option<String>,
    strict_actions: Option<String>,
) -> anyhow::Result<EditorConfig> {
    let config = match command {
        Commands::Apply { strict, .. } => {
            let config = config_from_env_values(namespace, strict_actions)?;
            if *strict {
                config.with_strict_actions(true)
            } else {
                config
            }
        }
        Commands::Kinds | Commands::Show { .. } => {
            EditorConfig::new(extension_namespace_from_env_value(namespace)?, false)?
        }
    };
    Ok(config)
}

fn read_questionnaire(path: &Path) -> anyhow::Result<TreeItemStore> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let store = match Format::from_path(path) {
        Format::Json => TreeItemStore::from_json(&text),
        Format::Yaml => TreeItemStore::from_yaml(&text),
    }
    .with_context(|| format!("failed to load questionnaire {}", path.display()))?;
    Ok(store)
}

fn read_actions(path: &Path) -> anyhow::Result<Vec<Action>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let actions = match Format::from_path(path) {
        Format::Json => parse_action_log_json(&text),
        Format::Yaml => parse_action_log_yaml(&text),
    }
    .with_context(|| format!("failed to parse action log {}", path.display()))?;
    Ok(actions)
}

fn read_validation_errors(path: &Path) -> anyhow::Result<ValidationErrors> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let errors = match Format::from_path(path) {
        Format::Json => ValidationErrors::from_json(&text),
        Format::Yaml => ValidationErrors::from_yaml(&text),
    }
    .with_context(|| format!("failed to parse validation errors {}", path.display()))?;
    Ok(errors)
}

fn render_questionnaire(store: &TreeItemStore, format: Format) -> anyhow::Result<String> {
    let rendered = match format {
        Format::Json => store.to_json()?,
        Format::Yaml => store.to_yaml()?,
    };
    Ok(rendered)
}

/// Apply actions in order; returns the resulting document and how many actions took effect.
fn apply_actions(
    config: EditorConfig,
    store: TreeItemStore,
    actions: Vec<Action>,
) -> anyhow::Result<(TreeItemStore, usize)> {
    let mut editor = Editor::new(config, store);
    let mut applied = 0;
    for (position, action) in actions.into_iter().enumerate() {
        if editor
            .dispatch(action)
            .with_context(|| format!("action {position} could not be applied"))?
        {
            applied += 1;
        }
    }
    Ok((editor.into_store(), applied))
}

/// One line per custom extension: index, identity, url, value, and `!` on flagged rows.
fn show_item(
    config: EditorConfig,
    store: TreeItemStore,
    link_id: &str,
    errors: &ValidationErrors,
) -> anyhow::Result<Vec<String>> {
    let mut editor = Editor::new(config, store);
    let Some(rows) = editor.extension_rows(link_id, errors) else {
        bail!("no item with linkId '{link_id}'");
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let flag = if row.has_validation_error { "\t!" } else { "" };
            format!(
                "{}\t{}\t{}\t{}{}",
                row.index,
                row.entry.token(),
                row.entry.url,
                row.entry.value,
                flag
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qedit_core::constants::DEFAULT_EXTENSION_NAMESPACE as NS;
    use std::io::Write;

    fn sample_yaml() -> String {
        format!(
            r#"resourceType: Questionnaire
status: draft
item:
  - linkId: q1
    type: decimal
    extension:
      - url: "{NS}external-threshold"
        valueString: "5"
"#
        )
    }

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn format_follows_file_extension() {
        assert_eq!(Format::from_path(Path::new("q.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("q.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("q.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("q")), Format::Yaml);
    }

    #[test]
    fn applies_action_log_from_files() {
        let questionnaire = write_temp(".yaml", &sample_yaml());
        let actions = write_temp(
            ".yaml",
            r#"- type: add_extension
  linkId: q1
- type: update_extension_property
  linkId: q1
  index: 1
  property: value
  value: "10"
- type: delete_extension
  linkId: missing
  index: 0
"#,
        );

        let store = read_questionnaire(questionnaire.path()).expect("read questionnaire");
        let actions = read_actions(actions.path()).expect("read actions");
        let (result, applied) =
            apply_actions(EditorConfig::default(), store, actions).expect("apply");

        assert_eq!(applied, 2);
        let extensions = result.get("q1").expect("q1").extensions();
        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions[1].value.as_text(), "10");
    }

    #[test]
    fn strict_apply_fails_on_bad_action() {
        let store = TreeItemStore::from_yaml(&sample_yaml()).expect("parse");
        let config = EditorConfig::default().with_strict_actions(true);
        let err = apply_actions(config, store, vec![Action::delete_extension("q1", 4)])
            .expect_err("out of range");
        assert!(err.to_string().contains("action 0"));
    }

    #[test]
    fn show_flags_rows_with_code_errors() {
        let store = TreeItemStore::from_yaml(&sample_yaml()).expect("parse");
        let errors_file = write_temp(
            ".json",
            r#"[{"linkId": "q1", "index": 0, "errorProperty": "code"}]"#,
        );
        let errors = read_validation_errors(errors_file.path()).expect("read errors");

        let lines = show_item(EditorConfig::default(), store, "q1", &errors).expect("show");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("0\t"));
        assert!(lines[0].ends_with("5\t!"));
    }

    #[test]
    fn loads_questionnaires_with_unmodelled_elements() {
        let yaml = format!(
            r#"resourceType: Questionnaire
subjectType: [Patient]
item:
  - linkId: q1
    type: decimal
    code:
      - system: http://loinc.org
        code: 4548-4
    extension:
      - url: "{NS}external-threshold"
        valueString: "5"
"#
        );
        let questionnaire = write_temp(".yaml", &yaml);
        let store = read_questionnaire(questionnaire.path()).expect("read questionnaire");

        let (result, applied) =
            apply_actions(EditorConfig::default(), store, vec![Action::add_extension("q1")])
                .expect("apply");
        assert_eq!(applied, 1);

        let rendered = render_questionnaire(&result, Format::Yaml).expect("yaml");
        assert!(rendered.contains("4548-4"));
        assert!(rendered.contains("subjectType"));
    }

    fn command(args: &[&str]) -> Commands {
        Cli::try_parse_from(args.iter().copied())
            .expect("parse")
            .command
            .expect("subcommand")
    }

    #[test]
    fn bad_strict_flag_only_affects_apply() {
        let bad = || Some("sometimes".to_string());

        let kinds = resolve_config(&command(&["qedit", "kinds"]), None, bad()).expect("kinds");
        assert!(!kinds.strict_actions());
        let show = command(&["qedit", "show", "q.yaml", "q1"]);
        assert!(resolve_config(&show, None, bad()).is_ok());

        let apply = command(&["qedit", "apply", "q.yaml", "a.yaml"]);
        assert!(resolve_config(&apply, None, bad()).is_err());
    }

    #[test]
    fn strict_argument_overrides_environment() {
        let apply = command(&["qedit", "apply", "q.yaml", "a.yaml", "--strict"]);
        let config = resolve_config(&apply, None, Some("false".into())).expect("valid");
        assert!(config.strict_actions());

        let kinds = command(&["qedit", "kinds"]);
        let bad_namespace = Some("ftp://example.org/".to_string());
        assert!(resolve_config(&kinds, bad_namespace, None).is_err());
    }

    #[test]
    fn show_rejects_unknown_item() {
        let store = TreeItemStore::from_yaml(&sample_yaml()).expect("parse");
        let err = show_item(EditorConfig::default(), store, "nope", &ValidationErrors::default())
            .expect_err("unknown item");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn renders_in_requested_format() {
        let store = TreeItemStore::from_yaml(&sample_yaml()).expect("parse");
        let json = render_questionnaire(&store, Format::Json).expect("json");
        assert!(json.trim_start().starts_with('{'));
        let yaml = render_questionnaire(&store, Format::Yaml).expect("yaml");
        assert!(yaml.starts_with("resourceType: Questionnaire"));
    }
}
