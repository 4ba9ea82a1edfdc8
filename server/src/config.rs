use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Hospital coordination server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "hospital-server", version, about = "Hospital coordination server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "HOSPITAL_PORT", default_value = "5000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "HOSPITAL_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./hospital.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "HOSPITAL_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for the SQLite database
    #[arg(long, env = "HOSPITAL_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Triage classifier configuration (loaded from [triage] section in TOML)
    #[arg(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triage: Option<TriageConfig>,

    /// Queue configuration (loaded from [queue] section in TOML)
    #[arg(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueConfig>,
}

/// Configuration for the triage classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Pretrained model file. `.json` loads a linear model, `.onnx` an ONNX
    /// classifier (requires the `onnx` feature). Unset means rules only.
    #[serde(default)]
    pub model_path: Option<String>,

    /// Name of the ONNX input tensor (default: "float_input")
    #[serde(default = "default_input_name")]
    pub input_name: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            input_name: default_input_name(),
        }
    }
}

fn default_input_name() -> String {
    "float_input".to_string()
}

/// Configuration for queue wait-time estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Minutes assumed per consultation ahead of a patient (default: 15)
    #[serde(default = "default_avg_consultation_minutes")]
    pub avg_consultation_minutes: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            avg_consultation_minutes: default_avg_consultation_minutes(),
        }
    }
}

fn default_avg_consultation_minutes() -> u32 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            config: "./hospital.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            triage: None,
            queue: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (HOSPITAL_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Self::figment(&config_path)
            .merge(Serialized::defaults(cli))
            .extract()
    }

    /// Defaults, TOML file and environment, without CLI arguments.
    pub fn figment(config_path: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("HOSPITAL_").split("__"))
    }

    pub fn triage(&self) -> TriageConfig {
        self.triage.clone().unwrap_or_default()
    }

    pub fn queue(&self) -> QueueConfig {
        self.queue.clone().unwrap_or_default()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Hospital Coordination Server Configuration
# Place this file at ./hospital.toml or specify with --config <path>
# All settings can be overridden via environment variables (HOSPITAL_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 5000)
# port = 5000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the SQLite database
# data_dir = "./data"

# ---- Triage Classifier ----
# [triage]

# Pretrained model. "*.json" = linear model, "*.onnx" = ONNX classifier
# (server must be built with --features onnx). Unset = rule-based scoring only.
# model_path = "./models/triage.json"

# Input tensor name for ONNX models
# input_name = "float_input"

# ---- Queue ----
# [queue]

# Minutes assumed per consultation when estimating wait times
# avg_consultation_minutes = 15
"#
    .to_string()
}
