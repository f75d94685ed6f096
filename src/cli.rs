// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{SettingsOverrides, DEFAULT_CONFIG_PATH};
use crate::hostlist::{HostSelection, HostlistError};
use crate::ssh::RemotePlatform;

#[derive(Parser, Debug)]
#[command(
    name = "fleetssh",
    version,
    about = "Parallel reachability checks, deployment and command execution across a numbered SSH fleet",
    long_about = "fleetssh works on fleet stations addressed by numeric id.\nEvery id expands to the station hostname(s) and login credentials, each host is pinged,\nand only hosts that answer are contacted over SSH. Files and folders are deployed over SFTP\nand a sequence of commands can be run afterwards, all with bounded parallelism.",
    after_help = "EXAMPLES:\n  Check logins on stations 1-40:    fleetssh scan --range 1-40\n  Deploy a folder:                  fleetssh exec --list 3,7,12 --copy-from ./build\n  Deploy and run commands:          fleetssh exec --range 1-9 --copy-from app.zip --command \"hostname && dir C:\\sthi\"\n  Export a results table:           fleetssh exec --range 1-9 --command ver --export results.csv"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        default_value = DEFAULT_CONFIG_PATH,
        help = "Configuration file path\nFalls back to the platform config directory, then to built-in defaults"
    )]
    pub config: PathBuf,

    #[arg(
        short = 'v',
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    #[arg(
        short = 'p',
        long,
        global = true,
        help = "Maximum hosts worked on at once [default: 30]"
    )]
    pub parallel: Option<usize>,

    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        help = "Ping reply timeout in seconds [default: 1]"
    )]
    pub ping_timeout: Option<u64>,

    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        help = "SSH connect timeout in seconds [default: 10]"
    )]
    pub connect_timeout: Option<u64>,

    #[arg(long, global = true, help = "SSH port [default: 22]")]
    pub port: Option<u16>,

    #[arg(
        long,
        global = true,
        value_enum,
        help = "Operating system of the stations, controls remote paths and mkdir [default: windows]"
    )]
    pub platform: Option<RemotePlatform>,
}

/// Station selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct HostArgs {
    #[arg(
        long,
        value_name = "FROM-TO",
        help = "Inclusive station id range, e.g. 1-40"
    )]
    pub range: Option<String>,

    #[arg(
        long,
        value_name = "IDS",
        help = "Comma-separated station ids, e.g. 3,7,12"
    )]
    pub list: Option<String>,
}

impl HostArgs {
    pub fn selection(&self) -> Result<HostSelection, HostlistError> {
        match (&self.range, &self.list) {
            (Some(range), _) => HostSelection::parse_range(range),
            (None, Some(list)) => HostSelection::parse_list(list),
            (None, None) => Err(HostlistError::EmptyList),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Deploy files and/or run commands on reachable stations",
        long_about = "Pings every selected station. On stations that answer, optionally copies a local\nfile or folder over SFTP and then runs a command sequence in one SSH session.\nCommands are separated with '&&'; each one runs in a fresh remote shell.",
        after_help = "Examples:\n  fleetssh exec --range 1-9 --copy-from ./tools\n  fleetssh exec --list 5,23 --command \"hostname && ipconfig\"\n  fleetssh --platform posix exec --range 1-3 --copy-from app.tar --copy-to /opt/app"
    )]
    Exec {
        #[command(flatten)]
        hosts: HostArgs,

        #[arg(long, value_name = "PATH", help = "Local file or folder to deploy")]
        copy_from: Option<PathBuf>,

        #[arg(
            long,
            value_name = "DEST",
            requires = "copy_from",
            help = "Remote destination folder [default: C:\\sthi, or from config]"
        )]
        copy_to: Option<String>,

        #[arg(
            long,
            value_name = "COMMANDS",
            help = "Commands to run, separated by '&&'"
        )]
        command: Option<String>,

        #[arg(
            long,
            value_name = "FILE",
            help = "Write the results table (hostname,pingable,cmd_result) as CSV"
        )]
        export: Option<PathBuf>,
    },

    #[command(
        about = "Ping stations and verify SSH logins",
        long_about = "Pings every selected station and runs 'echo hello <host>' on those that answer.\nResults are exported to scan_results_<timestamp>.csv with columns\nhost,username,password,pingable,ssh_able."
    )]
    Scan {
        #[command(flatten)]
        hosts: HostArgs,

        #[arg(
            long,
            value_name = "DIR",
            help = "Directory for the scan export [default: current directory, or from config]"
        )]
        export_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Command line values that override the configuration file.
    pub fn overrides(&self) -> SettingsOverrides {
        let export_dir = match &self.command {
            Commands::Scan { export_dir, .. } => export_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned()),
            Commands::Exec { .. } => None,
        };

        SettingsOverrides {
            parallel: self.parallel,
            ping_timeout: self.ping_timeout,
            connect_timeout: self.connect_timeout,
            port: self.port,
            remote_platform: self.platform,
            export_dir,
        }
    }

    pub fn host_args(&self) -> &HostArgs {
        match &self.command {
            Commands::Exec { hosts, .. } | Commands::Scan { hosts, .. } => hosts,
        }
    }
}
