// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use sqlweave::config::{Configuration, EngineConfig};
use sqlweave::model::Value;
use sqlweave::reflection::PropertyTokenizer;
use sqlweave::scripting::{DynamicContext, SqlTemplate};

#[derive(Parser)]
#[command(name = "sqlweave")]
#[command(about = "Render dynamic SQL templates and inspect property paths")]
#[command(version)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template and print the SQL with its bindings
    Render {
        /// JSON file containing the template nodes
        #[arg(short, long)]
        template: PathBuf,
        /// JSON file containing the parameter object
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Evaluate a binding expression against parameters
    Eval {
        /// Expression to evaluate
        expression: String,
        /// JSON file containing the parameter object
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
    /// Show how a property path is split into steps
    Tokenize {
        /// Property path such as `orders[0].lines.amount`
        path: String,
    },
}

fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            template,
            params,
            pretty,
        } => {
            let configuration = load_configuration(cli.config.as_deref())?;
            handle_render(&configuration, &template, params.as_deref(), pretty)
        }
        Commands::Eval { expression, params } => {
            let configuration = load_configuration(cli.config.as_deref())?;
            handle_eval(&configuration, &expression, params.as_deref())
        }
        Commands::Tokenize { path } => {
            handle_tokenize(&path);
            Ok(())
        }
    }
}

fn load_configuration(path: Option<&Path>) -> Result<Configuration> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(Configuration::new(config))
}

fn load_params(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Null);
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file: {}", path.display()))?;
    let json = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse params file: {}", path.display()))?;
    Ok(Value::from_json(json))
}

fn handle_render(
    configuration: &Configuration,
    template: &Path,
    params: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let content = fs::read_to_string(template)
        .with_context(|| format!("Failed to read template file: {}", template.display()))?;
    let template = SqlTemplate::from_json_str(&content)?;
    let mut bound = template.render(configuration, load_params(params)?)?;
    for value in bound.bindings.values_mut() {
        *value = configuration.coders().encode(value)?;
    }
    let json = bound.to_json(configuration.reflectors())?;
    let output = if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{output}");
    Ok(())
}

fn handle_eval(configuration: &Configuration, expression: &str, params: Option<&Path>) -> Result<()> {
    let mut context = DynamicContext::new(configuration, load_params(params)?);
    let value = context.evaluate(expression)?;
    println!("{}", value.to_json(configuration.reflectors())?);
    Ok(())
}

fn handle_tokenize(path: &str) {
    for (depth, step) in PropertyTokenizer::new(path).steps().enumerate() {
        match step.index() {
            Some(index) => println!("{depth}: {} [{index}]", step.name()),
            None => println!("{depth}: {}", step.name()),
        }
    }
}
