use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keynav_engine::{Document, HotkeyOptions, HotkeyRegistry, HotkeyScope, MemoryDocument, ScopeBus, Selector};
use keynav_types::{CanonicalKey, ElementId, attributes};
use keynav_util::{KeynavConfig, default_config_path, legacy_keycodes};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "keynav", version, about = "Keyboard navigation for HTML-like documents")]
struct Cli {
    /// Configuration file; defaults to KEYNAV_CONFIG_PATH or the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive terminal demo (the default).
    Demo {
        /// YAML or JSON document to load instead of the built-in mailbox.
        #[arg(long)]
        document: Option<PathBuf>,
    },
    /// Print the hotkey bindings and rejected declarations of a document as JSON.
    Hotkeys {
        #[arg(long)]
        document: PathBuf,
        /// Only read declarations inside the element with this id.
        #[arg(long)]
        container: Option<String>,
    },
    /// Translate a legacy numeric key code to its key name, or a name to its code.
    Keycode {
        value: String,
        /// Treat VALUE as a key name even when it is numeric.
        #[arg(long)]
        name: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Demo { document: None });
    init_tracing(matches!(command, Command::Demo { .. }));

    let config = match cli.config.as_deref() {
        Some(path) => KeynavConfig::load_from(path),
        None => KeynavConfig::load(),
    }
    .context("failed to read keynav config")?;

    match command {
        Command::Demo { document } => {
            let document = match document {
                Some(path) => load_document(&path)?,
                None => keynav_tui::demo_document()?,
            };
            keynav_tui::run(document, config)
        }
        Command::Hotkeys { document, container } => {
            let mut document = load_document(&document)?;
            let report = hotkey_report(&mut document, &config, container.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Keycode { value, name } => {
            let report = keycode_report(&value, name)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

/// Installs the fmt subscriber. The demo owns the terminal, so its logs go
/// to a file next to the config (or nowhere when that cannot be opened).
fn init_tracing(interactive: bool) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    if !interactive {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    }
    if let Some(file) = open_log_file() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    }
}

fn open_log_file() -> Option<File> {
    let path = default_config_path().with_file_name("demo.log");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    File::options().create(true).append(true).open(path).ok()
}

fn load_document(path: &Path) -> Result<MemoryDocument> {
    let source = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let document = if is_json {
        MemoryDocument::from_json_str(&source)
    } else {
        MemoryDocument::from_yaml_str(&source)
    };
    debug!(path = %path.display(), json = is_json, "loading document");
    document.with_context(|| format!("failed to parse {}", path.display()))
}

#[derive(Debug, Serialize)]
struct HotkeyReport {
    bindings: Vec<BindingReport>,
    diagnostics: Vec<DiagnosticReport>,
}

#[derive(Debug, Serialize)]
struct BindingReport {
    /// `global`, or the dialog that owns the binding.
    scope: String,
    combo: String,
    declared_on: String,
    trigger: String,
}

#[derive(Debug, Serialize)]
struct DiagnosticReport {
    element: String,
    message: String,
}

/// Reports the global registry over `container` (the whole document when
/// `None`) followed by one registry per dialog inside it.
fn hotkey_report(doc: &mut MemoryDocument, config: &KeynavConfig, container: Option<&str>) -> Result<HotkeyReport> {
    let scope = match container {
        Some(id) => doc
            .find_by_id(id)
            .with_context(|| format!("document has no element with id {id:?}"))?,
        None => doc.root(),
    };
    let dialogs = doc.query_selector_all(scope, &Selector::parse(attributes::DIALOG)?);

    let bus = ScopeBus::new();
    let mut registries = vec![(
        "global".to_string(),
        HotkeyRegistry::new(doc, &bus, HotkeyOptions::from_config(&config.selectors).container(scope))?,
    )];
    for dialog in dialogs {
        let options = HotkeyOptions::from_config(&config.selectors)
            .container(dialog)
            .scope(HotkeyScope::Dialog);
        registries.push((describe(doc, dialog), HotkeyRegistry::new(doc, &bus, options)?));
    }

    let mut report = HotkeyReport {
        bindings: Vec::new(),
        diagnostics: Vec::new(),
    };
    for (scope, registry) in &registries {
        report.bindings.extend(registry.bindings().map(|binding| BindingReport {
            scope: scope.clone(),
            combo: binding.combo.to_string(),
            declared_on: describe(doc, binding.declared_on),
            trigger: describe(doc, binding.trigger),
        }));
        report.diagnostics.extend(registry.diagnostics().iter().map(|diagnostic| DiagnosticReport {
            element: describe(doc, diagnostic.element()),
            message: diagnostic.to_string(),
        }));
    }
    Ok(report)
}

/// `tag#id` when the element has an id, `tag(#n)` otherwise.
fn describe(doc: &MemoryDocument, element: ElementId) -> String {
    let tag = doc.tag_name(element).unwrap_or_default();
    match doc.attribute(element, attributes::ID) {
        Some(id) => format!("{tag}#{id}"),
        None => format!("{tag}({element})"),
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct KeycodeReport {
    code: u16,
    name: String,
    /// Canonical key the normalizer derives, absent for keys outside the
    /// navigation set.
    canonical: Option<String>,
    /// The code also stands for the key's shifted character.
    ambiguous: bool,
}

fn keycode_report(value: &str, as_name: bool) -> Result<KeycodeReport> {
    let numeric = if as_name { None } else { value.parse::<u16>().ok() };
    let (code, name) = match numeric {
        Some(code) => {
            let name = legacy_keycodes::code_to_name(code)
                .with_context(|| format!("no key is known for legacy code {code}"))?;
            (code, name.to_string())
        }
        None => {
            let code = legacy_keycodes::name_to_code(value)
                .with_context(|| format!("no legacy code is known for key {value:?}"))?;
            (code, value.to_string())
        }
    };
    Ok(KeycodeReport {
        code,
        canonical: CanonicalKey::from_key_name(&name).map(|key| key.name()),
        ambiguous: legacy_keycodes::is_ambiguous(code),
        name,
    })
}
