use crate::types::*;
use clap::{ArgAction, Parser, Subcommand};

/// Tools for extracting and patching Pure Pure SCN scripts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Arg {
    #[arg(short = 'e', long, value_enum, global = true)]
    /// Script encoding
    pub encoding: Option<TextEncoding>,
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    /// Search for script files in the directory recursively
    pub recursive: bool,
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    /// Log every step and dump patched segments
    pub verbose: bool,
    #[arg(global = true, action = ArgAction::SetTrue, short, long)]
    /// Print backtrace on error
    pub backtrace: bool,
    #[arg(short, long, global = true)]
    /// JSON file with the strict_size and route_fix file lists.
    /// The built-in lists are used if omitted.
    pub policy: Option<String>,
    #[command(subcommand)]
    /// Command
    pub command: Command,
}

#[derive(Subcommand, Debug)]
/// Commands
pub enum Command {
    /// Extract lines into a translation table
    Extract {
        #[arg(long)]
        /// Original script file or directory
        scn: String,
        #[arg(long)]
        /// Already translated script file or directory used to prefill the table
        translated_scn: Option<String>,
        #[arg(short, long)]
        /// Output CSV file
        output: String,
    },
    /// Write translations back into scripts
    Patch {
        #[arg(long)]
        /// Original script file or directory
        scn: String,
        #[arg(long)]
        /// Translation table, a CSV file or an http(s) URL
        records: String,
        #[arg(short, long)]
        /// Output file or directory
        output: String,
        #[arg(long)]
        /// Known-good patched script file or directory to compare against
        reference: Option<String>,
        #[arg(short, long, default_value_t = 50)]
        /// Maximum line width when wrapping translations
        width: usize,
        #[arg(long, action = ArgAction::SetTrue)]
        /// Keep 【】 name brackets instead of replacing them with 「」
        keep_name_brackets: bool,
    },
}

pub fn parse_args() -> Arg {
    Arg::parse()
}
