use clap::Parser;
use std::path::PathBuf;
use threatscan_classifiers::{Backend, DeviceSpec};

#[derive(Parser, Debug, Default)]
#[command(name = "threatscan-server")]
#[command(author, version, about = "Cyber threat analyzer API for emails and messages", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Model directory (weights, tokenizer, label_map.json)
    #[arg(short, long)]
    pub model_dir: Option<PathBuf>,

    /// Classifier backend: bert or keyword
    #[arg(short, long)]
    pub backend: Option<Backend>,

    /// Device: auto, cpu, cuda or metal
    #[arg(short, long)]
    pub device: Option<DeviceSpec>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
