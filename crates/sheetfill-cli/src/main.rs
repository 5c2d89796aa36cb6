//! sheetfill CLI - fill XLSX templates from JSON data

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetfill::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetfill")]
#[command(author, version, about = "Fill XLSX templates with data")]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Substitute placeholders with values from a JSON file
    Render {
        /// Template workbook
        template: PathBuf,

        /// JSON object mapping placeholder names to values
        #[arg(short, long)]
        data: PathBuf,

        /// Output workbook
        #[arg(short, long)]
        output: PathBuf,

        /// Sheet name or id to fill (repeatable; default: every sheet)
        #[arg(short, long)]
        sheet: Vec<String>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// List the placeholders found in a template
    Placeholders {
        /// Template workbook
        template: PathBuf,
    },

    /// List all sheets in a template
    Sheets {
        /// Template workbook
        template: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct OptionArgs {
    /// Move images below expanded table rows down with them
    #[arg(long)]
    move_images: bool,

    /// Also move images anchored on the expanded row
    #[arg(long)]
    move_same_line_images: bool,

    /// Image scale in percent
    #[arg(long, default_value_t = 100)]
    image_ratio: i32,

    /// Copy plain cells of a table row into every generated row
    #[arg(long)]
    substitute_all_table_rows: bool,

    /// Move print ranges and manual page breaks below expanded table rows
    #[arg(long)]
    push_down_page_breaks: bool,

    /// Base directory for relative image paths
    #[arg(long)]
    image_root: Option<PathBuf>,

    /// Skip images that cannot be decoded instead of failing
    #[arg(long)]
    skip_broken_images: bool,

    /// Fail when an image lands on a sheet with an unreadable relationships part
    #[arg(long)]
    strict_relationships: bool,
}

impl OptionArgs {
    fn to_options(&self) -> TemplateOptions {
        let options = TemplateOptions {
            move_images: self.move_images,
            move_same_line_images: self.move_same_line_images,
            image_ratio: self.image_ratio,
            substitute_all_table_rows: self.substitute_all_table_rows,
            push_down_page_breaks: self.push_down_page_breaks,
            image_root_path: self.image_root.clone(),
            image_error_handler: None,
            strict_relationships: self.strict_relationships,
        };
        if self.skip_broken_images {
            options.with_image_error_handler(|source, err| {
                log::warn!("skipped image {}: {}", describe_source(source), err);
            })
        } else {
            options
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            template,
            data,
            output,
            sheet,
            options,
        } => render(&template, &data, &output, &sheet, &options),
        Commands::Placeholders { template } => list_placeholders(&template),
        Commands::Sheets { template } => list_sheets(&template),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn open(path: &Path) -> Result<Template> {
    Template::open(path).with_context(|| format!("Failed to open '{}'", path.display()))
}

fn render(
    template_path: &Path,
    data: &Path,
    output: &Path,
    sheets: &[String],
    options: &OptionArgs,
) -> Result<()> {
    let values = load_values(data)?;
    let mut template = open(template_path)?.with_options(options.to_options());

    if sheets.is_empty() {
        template
            .substitute_all(&values)
            .context("Failed to fill template")?;
    } else {
        for sheet in sheets {
            template
                .substitute(sheet, &values)
                .with_context(|| format!("Failed to fill sheet '{}'", sheet))?;
        }
    }

    template
        .save(output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    eprintln!("Wrote '{}'", output.display());
    Ok(())
}

/// Read a JSON object into substitution values
fn load_values(path: &Path) -> Result<Substitutions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    parse_values(&text).with_context(|| format!("Invalid data file '{}'", path.display()))
}

fn parse_values(text: &str) -> Result<Substitutions> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    let serde_json::Value::Object(map) = json else {
        bail!("expected a JSON object at the top level");
    };
    Ok(map
        .into_iter()
        .map(|(name, value)| (name, TemplateValue::from(value)))
        .collect())
}

fn describe_source(source: &ImageSource) -> String {
    match source {
        ImageSource::Path(path) => format!("'{}'", path.display()),
        ImageSource::Bytes(bytes) => format!("({} bytes)", bytes.len()),
        ImageSource::Base64(text) => format!("(base64, {} chars)", text.len()),
    }
}

fn list_placeholders(path: &Path) -> Result<()> {
    let template = open(path)?;
    for placeholder in template.placeholders() {
        let subtype = placeholder
            .subtype
            .as_deref()
            .map(|s| format!(":{}", s))
            .unwrap_or_default();
        println!("{}\t{}{}\t{}", placeholder.kind, placeholder.path(), subtype, placeholder.text);
    }
    Ok(())
}

fn list_sheets(path: &Path) -> Result<()> {
    let template = open(path)?;
    for (i, name) in template.sheet_names().into_iter().enumerate() {
        println!("{}\t{}", i, name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_values() {
        let values = parse_values(r#"{"name": "Ada", "rows": [{"n": 1}, {"n": null}], "ok": true}"#).unwrap();
        assert_eq!(values.get("name"), Some(&TemplateValue::from("Ada")));
        assert_eq!(values.get("ok"), Some(&TemplateValue::Bool(true)));
        assert_eq!(
            values.get("rows").and_then(|r| r.as_list()).map(|l| l.len()),
            Some(2)
        );
    }

    #[test]
    fn test_parse_values_rejects_non_objects() {
        assert!(parse_values("[1, 2]").is_err());
        assert!(parse_values("not json").is_err());
    }

    #[test]
    fn test_option_flags() {
        let cli = Cli::parse_from([
            "sheetfill",
            "render",
            "in.xlsx",
            "--data",
            "data.json",
            "-o",
            "out.xlsx",
            "--sheet",
            "Summary",
            "--sheet",
            "2",
            "--move-images",
            "--image-ratio",
            "40",
            "--skip-broken-images",
        ]);
        let Commands::Render { sheet, options, .. } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(sheet, vec!["Summary", "2"]);
        let options = options.to_options();
        assert!(options.move_images);
        assert!(!options.push_down_page_breaks);
        assert_eq!(options.effective_image_ratio(), 40);
        assert!(options.image_error_handler.is_some());
    }
}
