use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::cli::{Cli, Command, ConfigCommand, FieldArgs, RunArgs};
use crate::config::{self, FieldOverrides};
use crate::provision::provision;
use crate::record::{DEFAULT_FIELD_SIZE, FieldInfo};
use crate::stream::run_stream;
use crate::tool::DirectoryCreateTool;

const CONFIG_DIR: &str = ".dircreate";
const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ConfigPathSource {
    Explicit,
    Discovered,
    HomeDefault,
}

impl ConfigPathSource {
    fn as_str(&self) -> &'static str {
        match self {
            ConfigPathSource::Explicit => "explicit",
            ConfigPathSource::Discovered => "discovered",
            ConfigPathSource::HomeDefault => "home-default",
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfigPath {
    path: Utf8PathBuf,
    source: ConfigPathSource,
}

/// Global options shared by every command.
#[derive(Debug)]
struct CliContext {
    chdir: Option<PathBuf>,
    file: Option<PathBuf>,
}

impl From<&Cli> for CliContext {
    fn from(cli: &Cli) -> Self {
        Self {
            chdir: cli.chdir.clone(),
            file: cli.file.clone(),
        }
    }
}

impl CliContext {
    fn apply_chdir(&self) -> Result<()> {
        if let Some(dir) = &self.chdir {
            std::env::set_current_dir(dir)
                .with_context(|| format!("changing directory to {}", dir.display()))?;
            debug!(dir = %dir.display(), "changed working directory");
        }
        Ok(())
    }

    fn resolve_config_path(&self) -> Result<ResolvedConfigPath> {
        let cwd = current_working_dir()?;
        self.resolve_config_path_from(&cwd)
    }

    fn resolve_config_path_from(&self, start: &Utf8Path) -> Result<ResolvedConfigPath> {
        if let Some(file) = &self.file {
            let path = Utf8PathBuf::from_path_buf(file.clone())
                .map_err(|_| anyhow!("config path must be valid UTF-8"))?;
            return Ok(ResolvedConfigPath {
                path,
                source: ConfigPathSource::Explicit,
            });
        }

        let mut current = Some(start);
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.exists() {
                return Ok(ResolvedConfigPath {
                    path: candidate,
                    source: ConfigPathSource::Discovered,
                });
            }
            current = dir.parent();
        }

        let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|_| anyhow!("home directory is not valid UTF-8"))?;
        Ok(ResolvedConfigPath {
            path: home.join(CONFIG_DIR).join(CONFIG_FILE),
            source: ConfigPathSource::HomeDefault,
        })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let ctx = CliContext::from(&cli);
    ctx.apply_chdir()?;

    match cli.command {
        Command::Run(args) => handle_run(&ctx, args),
        Command::Check { root, target } => handle_check(&root, &target),
        Command::Fields => handle_fields(&ctx),
        Command::Config { command } => handle_config(&ctx, command),
    }
}

fn handle_run(ctx: &CliContext, args: RunArgs) -> Result<()> {
    let resolved = ctx.resolve_config_path()?;
    let config = config::load_or_default(&resolved.path)?;
    let settings = config.resolve(&overrides(args.fields))?;
    info!(
        config = %resolved.path,
        source = resolved.source.as_str(),
        root_field = %settings.root_folder_field,
        target_field = %settings.target_folder_field,
        "starting folder provisioning"
    );
    let tool = DirectoryCreateTool::new(settings);

    let (reader, total_bytes): (Box<dyn io::BufRead>, Option<u64>) = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening input {}", path.display()))?;
            let size = file.metadata().ok().map(|meta| meta.len());
            (Box::new(BufReader::new(file)), size)
        }
        None => (Box::new(io::stdin().lock()), None),
    };

    let writer: Box<dyn io::Write> = match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("creating output {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    run_stream(reader, writer, tool, total_bytes)?;
    Ok(())
}

fn handle_check(root: &str, target: &str) -> Result<()> {
    let outcome = provision(root, target);
    println!("{}\t{}", outcome.result_text(), outcome.message);
    Ok(())
}

fn handle_fields(ctx: &CliContext) -> Result<()> {
    let resolved = ctx.resolve_config_path()?;
    let config = config::load_or_default(&resolved.path)?;
    let tool_id = config.tool_id();

    for field in [
        FieldInfo::result(tool_id, DEFAULT_FIELD_SIZE),
        FieldInfo::description(tool_id, config.description_size()?),
    ] {
        println!(
            "{} (string, size {}): {} [{}]",
            field.name, field.size, field.description, field.source
        );
    }
    Ok(())
}

fn handle_config(ctx: &CliContext, command: Option<ConfigCommand>) -> Result<()> {
    let resolved = ctx.resolve_config_path()?;
    let config_path = resolved.path;
    match command {
        Some(ConfigCommand::Path) => {
            println!("Config path: {} ({})", config_path, resolved.source.as_str());
            Ok(())
        }
        None | Some(ConfigCommand::Show) => {
            if !config_path.exists() {
                println!("No config found at {}.", config_path);
                println!("Use `dircreate config generate` to scaffold a default configuration.");
                return Ok(());
            }

            let config = config::load_from_path(&config_path)?;
            println!("Config path: {} ({})", config_path, resolved.source.as_str());
            println!("{}", config::format_summary(&config));
            Ok(())
        }
        Some(ConfigCommand::Check) => {
            let config = config::load_from_path(&config_path)?;
            config.resolve(&FieldOverrides::default())?;
            println!("Config OK: {} ({})", config_path, resolved.source.as_str());
            println!("{}", config::format_summary(&config));
            Ok(())
        }
        Some(ConfigCommand::Generate { path, force }) => {
            let target = match path {
                Some(path) => Utf8PathBuf::from_path_buf(path)
                    .map_err(|_| anyhow!("config generate path must be valid UTF-8"))?,
                None => config_path.clone(),
            };
            config::write_example_config(&target, force)?;
            if force {
                println!("Overwrote config at {}", target);
            } else {
                println!("Wrote example config to {}", target);
            }
            Ok(())
        }
        Some(ConfigCommand::SetFields(fields)) => {
            config::set_fields(
                &config_path,
                fields.root_field.as_deref(),
                fields.target_field.as_deref(),
            )?;
            println!("Updated field selections in {}", config_path);
            Ok(())
        }
    }
}

fn overrides(fields: FieldArgs) -> FieldOverrides {
    FieldOverrides {
        root_folder_field: fields.root_field,
        target_folder_field: fields.target_field,
    }
}

fn current_working_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().context("determining current directory")?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|_| anyhow!("current directory is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir() -> Utf8PathBuf {
        let mut dir = std::env::temp_dir();
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        dir.push(format!("dircreate-runner-{ts}"));
        Utf8PathBuf::from_path_buf(dir).unwrap()
    }

    #[test]
    fn resolve_config_prefers_nearest_discovered() {
        let root = unique_temp_dir();
        let nested = root.join("a").join("b");
        fs::create_dir_all(nested.as_std_path()).unwrap();
        fs::create_dir_all(root.join(CONFIG_DIR).as_std_path()).unwrap();
        let cfg = root.join(CONFIG_DIR).join(CONFIG_FILE);
        fs::write(cfg.as_std_path(), "root_folder_field = 'RootFolder'\n").unwrap();

        let ctx = CliContext {
            chdir: None,
            file: None,
        };
        let resolved = ctx.resolve_config_path_from(&nested).unwrap();
        assert_eq!(resolved.source, ConfigPathSource::Discovered);
        assert!(resolved.path.ends_with(".dircreate/config.toml"));

        let _ = fs::remove_dir_all(root.as_std_path());
    }

    #[test]
    fn resolve_config_prefers_explicit_file() {
        let root = unique_temp_dir();
        fs::create_dir_all(root.join(CONFIG_DIR).as_std_path()).unwrap();
        fs::write(root.join(CONFIG_DIR).join(CONFIG_FILE).as_std_path(), "").unwrap();
        let cfg = root.join("explicit.toml");

        let ctx = CliContext {
            chdir: None,
            file: Some(cfg.as_std_path().to_path_buf()),
        };
        let resolved = ctx.resolve_config_path_from(&root).unwrap();
        assert_eq!(resolved.source, ConfigPathSource::Explicit);
        assert!(resolved.path.ends_with("explicit.toml"));

        let _ = fs::remove_dir_all(root.as_std_path());
    }

    #[test]
    fn run_streams_file_to_file() {
        let root = unique_temp_dir();
        fs::create_dir_all(root.as_std_path()).unwrap();
        let input = root.join("rows.jsonl");
        let output = root.join("out").join("rows.jsonl");
        let target = root.join("made");
        fs::write(
            input.as_std_path(),
            format!("{{\"Base\": \"{root}\", \"Dest\": \"{target}\"}}\n"),
        )
        .unwrap();

        let ctx = CliContext {
            chdir: None,
            file: Some(root.join("absent.toml").into_std_path_buf()),
        };
        let args = RunArgs {
            input: Some(input.clone().into_std_path_buf()),
            output: Some(output.clone().into_std_path_buf()),
            fields: FieldArgs {
                root_field: Some("Base".to_owned()),
                target_field: Some("Dest".to_owned()),
            },
        };
        handle_run(&ctx, args).unwrap();

        assert!(target.as_std_path().is_dir());
        let written = fs::read_to_string(output.as_std_path()).unwrap();
        assert!(written.contains("\"FolderCreationResult\":\"True\""));
        assert!(written.contains("\"FolderCreationDescription\":\"Created Successfully\""));

        let _ = fs::remove_dir_all(root.as_std_path());
    }

    #[test]
    fn run_without_field_selection_is_a_config_error() {
        let root = unique_temp_dir();
        fs::create_dir_all(root.as_std_path()).unwrap();
        let input = root.join("rows.jsonl");
        fs::write(input.as_std_path(), "").unwrap();

        let ctx = CliContext {
            chdir: None,
            file: Some(root.join("absent.toml").into_std_path_buf()),
        };
        let args = RunArgs {
            input: Some(input.into_std_path_buf()),
            output: None,
            fields: FieldArgs::default(),
        };
        let err = handle_run(&ctx, args).unwrap_err();
        assert_eq!(err.to_string(), "Please select the root folder field");

        let _ = fs::remove_dir_all(root.as_std_path());
    }
}
