//! Configuration loading from lakechat.toml, the environment, and the data
//! folder written by the provisioning pipeline.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read from the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "lakechat.toml";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub fabric: FabricConfig,

    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

/// Foundry project settings.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    /// Project endpoint, e.g. `https://<resource>.services.ai.azure.com/api/projects/<name>`.
    pub endpoint: Option<String>,
    pub api_version: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentConfig {
    pub id: Option<String>,
    /// Tool rounds allowed per turn.
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FabricConfig {
    pub workspace_id: Option<String>,
    /// Folder holding `agent_ids.json`, `fabric_ids.json` and
    /// `sample_questions.txt` (directly or under `config/`).
    pub data_folder: Option<PathBuf>,
    pub api_base: Option<String>,
    pub query_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WarehouseConfig {
    /// Query a local SQLite snapshot instead of the lakehouse.
    pub sqlite: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path` if given, else `lakechat.toml` if present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).is_file() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

/// Values given on the command line. These win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub agent_id: Option<String>,
    pub sqlite: Option<PathBuf>,
    pub max_iterations: Option<usize>,
}

/// Where `execute_sql` runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// The lakehouse SQL endpoint, discovered through the Fabric API.
    Fabric {
        workspace_id: String,
        lakehouse: FabricIds,
        api_base: Option<String>,
    },
    /// A local snapshot file.
    Sqlite {
        path: PathBuf,
        lakehouse_name: Option<String>,
    },
}

impl DataSource {
    pub fn lakehouse_name(&self) -> Option<&str> {
        match self {
            Self::Fabric { lakehouse, .. } => Some(&lakehouse.lakehouse_name),
            Self::Sqlite { lakehouse_name, .. } => lakehouse_name.as_deref(),
        }
    }
}

/// Contents of `fabric_ids.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FabricIds {
    pub lakehouse_name: String,
    pub lakehouse_id: String,
}

#[derive(Debug, Deserialize)]
struct AgentIds {
    #[serde(default)]
    foundry_agent_id: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: String,
    pub api_version: Option<String>,
    pub request_timeout: Duration,
    pub agent_id: String,
    pub max_iterations: Option<usize>,
    pub query_timeout: Duration,
    pub source: DataSource,
    pub sample_questions: Vec<String>,
}

impl Settings {
    /// Merge config, environment and flags.
    ///
    /// Precedence is flag, then environment variable, then config file, then
    /// the data folder.
    pub fn resolve(
        config: Config,
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let endpoint = env("AZURE_AI_PROJECT_ENDPOINT")
            .or(config.project.endpoint)
            .ok_or(ConfigError::Missing {
                name: "AZURE_AI_PROJECT_ENDPOINT",
                hint: "deploy the Azure resources first (azd up)",
            })?;

        let data_dir = env("DATA_FOLDER")
            .map(PathBuf::from)
            .or(config.fabric.data_folder);
        let config_dir = data_dir.as_deref().map(config_dir);

        let sqlite = overrides.sqlite.or(config.warehouse.sqlite);
        let fabric_ids = match &config_dir {
            Some(dir) => read_fabric_ids(dir)?,
            None => None,
        };

        let source = match sqlite {
            Some(path) => DataSource::Sqlite {
                path,
                lakehouse_name: fabric_ids.map(|ids| ids.lakehouse_name),
            },
            None => {
                let workspace_id = env("FABRIC_WORKSPACE_ID")
                    .or(config.fabric.workspace_id)
                    .ok_or(ConfigError::Missing {
                        name: "FABRIC_WORKSPACE_ID",
                        hint: "set it in .env or fabric.workspace_id",
                    })?;
                if config_dir.is_none() {
                    return Err(ConfigError::Missing {
                        name: "DATA_FOLDER",
                        hint: "generate the sample data first",
                    });
                }
                let lakehouse = fabric_ids.ok_or(ConfigError::MissingFile {
                    file: "fabric_ids.json",
                    hint: "set up the Fabric workspace first",
                })?;
                DataSource::Fabric {
                    workspace_id,
                    lakehouse,
                    api_base: config.fabric.api_base,
                }
            }
        };

        let agent_id = match overrides
            .agent_id
            .or_else(|| env("FOUNDRY_AGENT_ID"))
            .or(config.agent.id)
        {
            Some(id) => id,
            None => config_dir
                .as_deref()
                .map(read_agent_id)
                .transpose()?
                .flatten()
                .ok_or(ConfigError::MissingAgent)?,
        };

        let sample_questions = match &config_dir {
            Some(dir) => read_sample_questions(dir)?,
            None => Vec::new(),
        };

        Ok(Self {
            endpoint,
            api_version: config.project.api_version,
            request_timeout: Duration::from_secs(
                config
                    .project
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            agent_id,
            max_iterations: overrides.max_iterations.or(config.agent.max_iterations),
            query_timeout: Duration::from_secs(
                config
                    .fabric
                    .query_timeout_secs
                    .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS),
            ),
            source,
            sample_questions,
        })
    }
}

/// `{data}/config` when it exists, else `{data}` itself.
fn config_dir(data_dir: &Path) -> PathBuf {
    let nested = data_dir.join("config");
    if nested.is_dir() {
        nested
    } else {
        data_dir.to_path_buf()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))
}

fn read_fabric_ids(dir: &Path) -> Result<Option<FabricIds>, ConfigError> {
    read_json(&dir.join("fabric_ids.json"))
}

fn read_agent_id(dir: &Path) -> Result<Option<String>, ConfigError> {
    let ids: Option<AgentIds> = read_json(&dir.join("agent_ids.json"))?;
    Ok(ids.and_then(|ids| ids.foundry_agent_id))
}

/// Bullet lines of `sample_questions.txt`, without the leading `- `.
fn read_sample_questions(dir: &Path) -> Result<Vec<String>, ConfigError> {
    let path = dir.join("sample_questions.txt");
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_sample_questions(&content))
}

fn parse_sample_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .map(|line| line.chars().skip(2).collect())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("{name} not set; {hint}")]
    Missing {
        name: &'static str,
        hint: &'static str,
    },

    #[error("{file} not found in the data folder; {hint}")]
    MissingFile {
        file: &'static str,
        hint: &'static str,
    },

    #[error("no agent id found; create the Foundry agent first or pass --agent-id")]
    MissingAgent,
}
