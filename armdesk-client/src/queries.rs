use std::io::{self, BufRead};
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use tracing::warn;

use armdesk_shared::api::rest;
use armdesk_shared::api::{QueryDto, QuerySaveReq};

use crate::session::{Session, SessionStore, api_result};
use crate::{AppError, confirm, notice, prompt};

/// Recognized device-type filter clause, e.g. `dvcDeviceType_FRK = 138`.
static DEVICE_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"dvcDeviceType_FRK\s*=\s*(\d+)").expect("device type pattern"));

/// Recognized source-table clause: the first FROM target.
static SOURCE_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFROM\s+([A-Za-z_][A-Za-z0-9_]*)").expect("source table pattern"));

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditMode {
    Basic,
    Advanced,
}

/// Edit state for one query template. The SQL text is the single source
/// of truth; the basic-mode fields are a derived, regenerable view over
/// the two recognized substitution points.
#[derive(Debug, Clone)]
pub struct TemplateEditor {
    name: String,
    sql: String,
    description: String,
    updated_at: Option<String>,
    mode: EditMode,
    device_type: Option<String>,
    table: Option<String>,
    loaded_table: Option<String>,
}

impl TemplateEditor {
    pub fn from_template(dto: &QueryDto) -> Self {
        let mut editor = Self {
            name: dto.query_name.clone(),
            sql: dto.query_sql.clone(),
            description: dto.description.clone(),
            updated_at: dto.updated_at.clone(),
            mode: EditMode::Basic,
            device_type: None,
            table: None,
            loaded_table: None,
        };
        editor.derive_basic();
        editor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    /// An absent server timestamp means the template is still at the
    /// built-in default.
    pub fn is_customized(&self) -> bool {
        self.updated_at.is_some()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn device_type(&self) -> Option<&str> {
        self.device_type.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Re-derives the basic-mode view when entering it; the advanced view
    /// is always the authoritative text itself. Unsaved basic-field edits
    /// do not survive a mode switch.
    pub fn switch_mode(&mut self, mode: EditMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        if mode == EditMode::Basic {
            self.derive_basic();
        }
    }

    fn derive_basic(&mut self) {
        self.device_type = DEVICE_TYPE_RE
            .captures(&self.sql)
            .map(|c| c[1].to_string());
        self.loaded_table = SOURCE_TABLE_RE
            .captures(&self.sql)
            .map(|c| c[1].to_string());
        self.table = self.loaded_table.clone();
    }

    pub fn set_device_type(&mut self, value: &str) -> Result<(), AppError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.device_type = None;
            return Ok(());
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Validation(format!(
                "device type must be a numeral, got '{trimmed}'"
            )));
        }
        self.device_type = Some(trimmed.to_string());
        Ok(())
    }

    pub fn set_table(&mut self, value: &str) -> Result<(), AppError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.table = None;
            return Ok(());
        }
        let mut chars = trimmed.chars();
        let head_ok = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !head_ok || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::Validation(format!(
                "'{trimmed}' is not a valid table identifier"
            )));
        }
        self.table = Some(trimmed.to_string());
        Ok(())
    }

    pub fn set_description(&mut self, value: &str) {
        self.description = value.trim().to_string();
    }

    /// Replaces the authoritative SQL text (an advanced-mode edit). The
    /// basic view is regenerated on the next switch into basic mode.
    pub fn set_sql(&mut self, sql: String) {
        self.sql = sql;
    }

    /// Overwrites the in-progress edit with the built-in default text;
    /// the server record is untouched until a save.
    pub fn reset_to_default(&mut self, default_sql: &str) {
        self.sql = default_sql.to_string();
        self.derive_basic();
    }

    /// The SQL that a save would persist. Advanced mode returns the text
    /// verbatim. Basic mode substitutes the field values into every
    /// occurrence of the recognized clauses; a field whose pattern never
    /// matched the template is a no-op, which is logged when the operator
    /// set a value for it.
    pub fn build_effective_sql(&self) -> String {
        match self.mode {
            EditMode::Advanced => self.sql.clone(),
            EditMode::Basic => {
                let mut out = self.sql.clone();
                if let Some(device_type) = self.device_type.as_deref() {
                    if DEVICE_TYPE_RE.is_match(&out) {
                        let replacement = format!("dvcDeviceType_FRK = {device_type}");
                        out = DEVICE_TYPE_RE
                            .replace_all(&out, NoExpand(&replacement))
                            .into_owned();
                    } else {
                        warn!(
                            field = "device-type",
                            "no recognized device-type clause in template; value not applied"
                        );
                    }
                }
                if let Some(new_table) = self.table.as_deref() {
                    match self.loaded_table.as_deref() {
                        Some(orig) if orig != new_table => {
                            let pattern = format!(r"\b{}\b", regex::escape(orig));
                            if let Ok(re) = Regex::new(&pattern) {
                                out = re.replace_all(&out, NoExpand(new_table)).into_owned();
                            }
                        }
                        Some(_) => {}
                        None => {
                            warn!(
                                field = "table",
                                "no recognized source table in template; value not applied"
                            );
                        }
                    }
                }
                out
            }
        }
    }

    /// Client-side gate before any save: the query must be a SELECT.
    pub fn validate(sql: &str) -> Result<(), AppError> {
        if sql.trim().to_lowercase().starts_with("select") {
            Ok(())
        } else {
            Err(AppError::Validation(
                "query must be a SELECT statement".into(),
            ))
        }
    }
}

pub async fn ls(base: &str, store: &SessionStore, session: &Session) -> Result<(), AppError> {
    let resp = api_result(store, rest::list_queries(base, &session.token).await)?;
    if resp.queries.is_empty() {
        println!("No queries configured.");
        return Ok(());
    }
    println!("{:<20} {:<12} {:<20} DESCRIPTION", "NAME", "STATE", "UPDATED");
    for q in resp.queries {
        println!(
            "{:<20} {:<12} {:<20} {}",
            q.query_name,
            if q.updated_at.is_some() {
                "customized"
            } else {
                "default"
            },
            q.updated_at.as_deref().unwrap_or("-"),
            q.description
        );
    }
    Ok(())
}

pub async fn show(
    base: &str,
    store: &SessionStore,
    session: &Session,
    name: &str,
) -> Result<(), AppError> {
    let dto = api_result(store, rest::get_query(base, &session.token, name).await)?;
    print_editor(&TemplateEditor::from_template(&dto));
    Ok(())
}

pub async fn show_default(
    base: &str,
    store: &SessionStore,
    session: &Session,
    name: &str,
) -> Result<(), AppError> {
    let dto = api_result(
        store,
        rest::get_default_query(base, &session.token, name).await,
    )?;
    print_editor(&TemplateEditor::from_template(&dto));
    Ok(())
}

pub async fn test(
    base: &str,
    store: &SessionStore,
    session: &Session,
    name: &str,
) -> Result<(), AppError> {
    let resp = api_result(store, rest::test_query(base, &session.token, name).await)?;
    if resp.success {
        println!("Query '{name}' passed the server-side check: {}", resp.message);
        Ok(())
    } else {
        Err(AppError::Api(format!(
            "query '{name}' failed the server-side check: {}",
            resp.message
        )))
    }
}

pub async fn revert(
    base: &str,
    store: &SessionStore,
    session: &Session,
    name: &str,
    assume_yes: bool,
) -> Result<(), AppError> {
    if !confirm(
        &format!("Delete the customization of '{name}' and revert to the default?"),
        assume_yes,
    )? {
        notice("Cancelled.");
        return Ok(());
    }
    let resp = api_result(store, rest::delete_query(base, &session.token, name).await)?;
    notice(&resp.message);
    Ok(())
}

/// Validates, confirms, saves, then reloads the template so the editor
/// picks up the server's updated timestamp. Returns false when the
/// operator declined the confirmation.
pub async fn push_template(
    base: &str,
    store: &SessionStore,
    session: &Session,
    editor: &mut TemplateEditor,
    assume_yes: bool,
) -> Result<bool, AppError> {
    let sql = editor.build_effective_sql();
    TemplateEditor::validate(&sql)?;
    if !confirm(
        &format!("Save query '{}' to the server?", editor.name()),
        assume_yes,
    )? {
        notice("Save cancelled.");
        return Ok(false);
    }
    let req = QuerySaveReq {
        query_name: editor.name().to_string(),
        query_sql: sql,
        description: editor.description().to_string(),
    };
    let resp = api_result(store, rest::save_query(base, &session.token, &req).await)?;
    notice(&resp.message);
    let dto = api_result(
        store,
        rest::get_query(base, &session.token, editor.name()).await,
    )?;
    *editor = TemplateEditor::from_template(&dto);
    Ok(true)
}

#[allow(clippy::too_many_arguments)]
pub async fn save(
    base: &str,
    store: &SessionStore,
    session: &Session,
    name: &str,
    sql_file: Option<PathBuf>,
    device_type: Option<String>,
    table: Option<String>,
    description: Option<String>,
    assume_yes: bool,
) -> Result<(), AppError> {
    if sql_file.is_some() && (device_type.is_some() || table.is_some()) {
        return Err(AppError::Validation(
            "--sql-file replaces the whole query; drop --device-type/--table".into(),
        ));
    }
    if sql_file.is_none() && device_type.is_none() && table.is_none() && description.is_none() {
        return Err(AppError::Validation(
            "nothing to change; pass --sql-file, --device-type, --table or --description".into(),
        ));
    }

    let dto = api_result(store, rest::get_query(base, &session.token, name).await)?;
    let mut editor = TemplateEditor::from_template(&dto);

    if let Some(desc) = description {
        editor.set_description(&desc);
    }
    if let Some(path) = sql_file {
        let sql = std::fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("read {} failed: {e}", path.display())))?;
        editor.switch_mode(EditMode::Advanced);
        editor.set_sql(sql);
    } else {
        if let Some(dt) = device_type {
            editor.set_device_type(&dt)?;
        }
        if let Some(t) = table {
            editor.set_table(&t)?;
        }
    }

    push_template(base, store, session, &mut editor, assume_yes).await?;
    Ok(())
}

const EDITOR_HELP: &str = "Commands:
  show                      print the template and both views
  mode basic|advanced       switch the editing mode
  set device-type VALUE     set the basic-mode device type numeral
  set table VALUE           set the basic-mode source table
  set description TEXT      set the template description
  sql                       enter raw SQL, finish with a single '.' line
  preview                   print the SQL a save would persist
  validate                  run the client-side SELECT check
  test                      ask the server to syntax-check the saved template
  default                   load the built-in default into the editor
  save                      validate, confirm and save, then reload
  quit                      leave the editor, discarding unsaved edits";

pub async fn edit(
    base: &str,
    store: &SessionStore,
    session: &Session,
    name: &str,
) -> Result<(), AppError> {
    let dto = api_result(store, rest::get_query(base, &session.token, name).await)?;
    let mut editor = TemplateEditor::from_template(&dto);
    print_editor(&editor);
    println!("{EDITOR_HELP}");

    loop {
        let line = prompt("query> ")?;
        let mut parts = line.splitn(3, ' ');
        let cmd = parts.next().unwrap_or("");
        match cmd {
            "" | "quit" | "q" => {
                notice("Leaving editor; unsaved edits discarded.");
                break;
            }
            "help" => println!("{EDITOR_HELP}"),
            "show" => print_editor(&editor),
            "mode" => match parts.next() {
                Some("basic") => {
                    editor.switch_mode(EditMode::Basic);
                    print_editor(&editor);
                }
                Some("advanced") => {
                    editor.switch_mode(EditMode::Advanced);
                    print_editor(&editor);
                }
                _ => notice("usage: mode basic|advanced"),
            },
            "set" => {
                let field = parts.next().unwrap_or("");
                let value = parts.next().unwrap_or("");
                let res = match field {
                    "device-type" => editor.set_device_type(value),
                    "table" => editor.set_table(value),
                    "description" => {
                        editor.set_description(value);
                        Ok(())
                    }
                    _ => {
                        notice("usage: set device-type|table|description VALUE");
                        Ok(())
                    }
                };
                if let Err(e) = res {
                    notice(&e.to_string());
                }
            }
            "sql" => {
                editor.switch_mode(EditMode::Advanced);
                editor.set_sql(read_sql_lines()?);
                print_editor(&editor);
            }
            "preview" => println!("{}", editor.build_effective_sql()),
            "validate" => match TemplateEditor::validate(&editor.build_effective_sql()) {
                Ok(()) => println!("Query validation passed."),
                Err(e) => notice(&e.to_string()),
            },
            "test" => {
                if let Err(e) = test(base, store, session, name).await {
                    match e {
                        AppError::SessionExpired => return Err(e),
                        other => notice(&other.to_string()),
                    }
                }
            }
            "default" => {
                if confirm("Overwrite the current edit with the built-in default?", false)? {
                    let dto = api_result(
                        store,
                        rest::get_default_query(base, &session.token, name).await,
                    )?;
                    editor.reset_to_default(&dto.query_sql);
                    print_editor(&editor);
                }
            }
            "save" => match push_template(base, store, session, &mut editor, false).await {
                Ok(_) => {}
                Err(AppError::SessionExpired) => return Err(AppError::SessionExpired),
                Err(e) => notice(&e.to_string()),
            },
            other => notice(&format!("unknown command '{other}'; try 'help'")),
        }
    }
    Ok(())
}

fn print_editor(editor: &TemplateEditor) {
    println!(
        "Query: {} ({})",
        editor.name(),
        if editor.is_customized() {
            "customized"
        } else {
            "default"
        }
    );
    if let Some(ts) = editor.updated_at() {
        println!("Updated: {ts}");
    }
    if !editor.description().is_empty() {
        println!("Description: {}", editor.description());
    }
    println!(
        "Mode: {}",
        match editor.mode() {
            EditMode::Basic => "basic",
            EditMode::Advanced => "advanced",
        }
    );
    println!("Device type: {}", editor.device_type().unwrap_or("-"));
    println!("Source table: {}", editor.table().unwrap_or("-"));
    println!("--- SQL ---");
    println!("{}", editor.sql().trim_end());
    println!("-----------");
}

fn read_sql_lines() -> Result<String, AppError> {
    println!("Enter SQL; finish with a single '.' line.");
    let mut out = String::new();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim_end() == "." {
            break;
        }
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}
