use std::{
    fs::File,
    io::{Read, Stdin, Stdout, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Arg, ArgMatches, Command};

pub enum InputStream {
    File(File),
    Stdin(Stdin),
}

impl InputStream {
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if path.as_ref().as_os_str() == "-" {
            Ok(Self::Stdin(std::io::stdin()))
        } else {
            Ok(Self::File(std::fs::File::open(path)?))
        }
    }

    pub fn from_args(arg_matches: &ArgMatches) -> anyhow::Result<Self> {
        let path = path_arg(arg_matches, "input");

        Self::open(&path).with_context(|| format!("failed to open {}", path.display()))
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            InputStream::File(s) => s.read(buf),
            InputStream::Stdin(s) => s.read(buf),
        }
    }
}

pub enum OutputStream {
    File(File),
    Stdout(Stdout),
}

impl OutputStream {
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if path.as_ref().as_os_str() == "-" {
            Ok(Self::Stdout(std::io::stdout()))
        } else {
            Ok(Self::File(
                std::fs::OpenOptions::new()
                    .create_new(true)
                    .write(true)
                    .open(path)?,
            ))
        }
    }

    pub fn from_args(arg_matches: &ArgMatches) -> anyhow::Result<Self> {
        let path = path_arg(arg_matches, "output");

        Self::open(&path).with_context(|| format!("failed to create {}", path.display()))
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            OutputStream::File(s) => s.write(buf),
            OutputStream::Stdout(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            OutputStream::File(s) => s.flush(),
            OutputStream::Stdout(s) => s.flush(),
        }
    }
}

fn path_arg(arg_matches: &ArgMatches, id: &str) -> PathBuf {
    arg_matches
        .get_one::<PathBuf>(id)
        .cloned()
        .unwrap_or_else(|| PathBuf::from("-"))
}

pub fn build_commands() -> Command<'static> {
    let command = Command::new(clap::crate_name!())
        .about("Decode HTTP chunked transfer coding")
        .version(clap::crate_version!())
        .subcommand_required(true)
        .subcommand(crate::decode::create_body_command())
        .subcommand(crate::decode::create_response_command());

    crate::logging::add_logging_args(command)
}

pub fn input_arg() -> Arg<'static> {
    Arg::new("input")
        .value_parser(clap::value_parser!(PathBuf))
        .default_value("-")
        .help("Path of the input file. Use '-' for standard input.")
}

pub fn output_arg() -> Arg<'static> {
    Arg::new("output")
        .long("output")
        .short('o')
        .takes_value(true)
        .value_parser(clap::value_parser!(PathBuf))
        .default_value("-")
        .help("Path of the output file. Use '-' for standard output.")
        .long_help(
            "Path of the output file. Use '-' for standard output.

The file must not already exist.",
        )
}

pub fn read_size_arg() -> Arg<'static> {
    Arg::new("read_size")
        .long("read-size")
        .takes_value(true)
        .value_parser(clap::value_parser!(u64).range(1..=16_777_216))
        .default_value("4096")
        .help("Number of bytes to read from the input at a time.")
}

pub fn read_size(arg_matches: &ArgMatches) -> usize {
    arg_matches
        .get_one::<u64>("read_size")
        .map(|size| *size as usize)
        .unwrap_or(unchunk::io::DEFAULT_READ_SIZE)
}
