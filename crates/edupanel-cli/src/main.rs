// Edupanel
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Edupanel CLI
//!
//! Command-line host for the access layer. Persisted credentials live in a
//! JSON file, and every navigation is a command.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::CommandContext;
use config::CliConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "edupanel")]
#[command(about = "Edupanel - role-based access for the consultancy panel")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Path to configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Session storage file (overrides $EDUPANEL_STORAGE_PATH)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the route table
    Routes,

    /// Show the landing path for a role
    Resolve {
        /// Role name, e.g. `manager` or `super-admin`
        role: String,
    },

    /// Decide a navigation for the stored session
    Navigate {
        /// Requested path
        path: String,
    },

    /// Sign in and persist the session
    Login {
        email: String,
        password: String,
        /// Path originally requested before being sent to login
        #[arg(long)]
        from: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the stored session
    Whoami,

    /// List the menu entries for the stored session
    Menu,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::resolve(cli.config, cli.storage)?;

    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"))).with_writer(std::io::stderr).init();

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(config, cli.command, cli.json))
}

async fn run(config: CliConfig, command: Commands, json: bool) -> Result<()> {
    let ctx = CommandContext::new(config, json)?;

    match command {
        Commands::Routes => commands::routes::list_routes(&ctx)?,
        Commands::Resolve { role } => commands::routes::resolve_role(&ctx, &role)?,
        Commands::Navigate { path } => commands::navigate::handle_navigate(&ctx, &path).await?,
        Commands::Login { email, password, from } => commands::session::handle_login(&ctx, &email, &password, from.as_deref()).await?,
        Commands::Logout => commands::session::handle_logout(&ctx).await?,
        Commands::Whoami => commands::session::handle_whoami(&ctx)?,
        Commands::Menu => commands::routes::show_menu(&ctx)?,
    }

    Ok(())
}
