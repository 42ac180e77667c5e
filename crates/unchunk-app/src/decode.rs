use std::io::{Cursor, Read, Write};

use clap::{Arg, ArgMatches, Command};
use unchunk::{
    io::{SourceCountRead, UnchunkReader},
    response::{read_response_head, ResponseHead},
};

use crate::argutil::{InputStream, OutputStream};

pub fn create_body_command() -> Command<'static> {
    Command::new("body")
        .about("Decode a body in chunked transfer coding.")
        .arg(crate::argutil::input_arg())
        .arg(crate::argutil::output_arg())
        .arg(crate::argutil::read_size_arg())
}

pub fn create_response_command() -> Command<'static> {
    Command::new("response")
        .about("Extract the body from a captured HTTP response.")
        .long_about(
            "Extract the body from a captured HTTP response.

The body is decoded if the response uses chunked transfer coding. \
Otherwise, Content-Length bytes are copied, or everything up to the \
end of the input if there is no Content-Length.",
        )
        .arg(crate::argutil::input_arg())
        .arg(crate::argutil::output_arg())
        .arg(crate::argutil::read_size_arg())
        .arg(
            Arg::new("show_head")
                .long("show-head")
                .help("Print the status line and header fields to standard error."),
        )
}

pub fn run_body(arg_matches: &ArgMatches) -> anyhow::Result<()> {
    let input = InputStream::from_args(arg_matches)?;
    let mut output = OutputStream::from_args(arg_matches)?;

    let mut reader = UnchunkReader::new(input);
    reader.set_read_size(crate::argutil::read_size(arg_matches));

    let amount = std::io::copy(&mut reader, &mut output)?;
    output.flush()?;

    tracing::info!(
        decoded = amount,
        source = reader.source_read_count(),
        closed = reader.decoder().is_closed(),
        "body decoded"
    );

    if !reader.decoder().is_closed() {
        tracing::warn!("input ended before the terminal chunk");
    }

    Ok(())
}

pub fn run_response(arg_matches: &ArgMatches) -> anyhow::Result<()> {
    let mut input = InputStream::from_args(arg_matches)?;
    let mut output = OutputStream::from_args(arg_matches)?;

    let (head, body_start) = read_response_head(&mut input)?;

    if arg_matches.contains_id("show_head") {
        eprint!("{}", format_head(&head));
    }

    let mut body = Cursor::new(body_start).chain(input);

    let amount = if head.is_chunked() {
        tracing::info!("response body is chunked");
        let mut reader = UnchunkReader::new(body);
        reader.set_read_size(crate::argutil::read_size(arg_matches));

        let amount = std::io::copy(&mut reader, &mut output)?;

        if !reader.decoder().is_closed() {
            tracing::warn!("input ended before the terminal chunk");
        }

        amount
    } else if let Some(length) = head.content_length() {
        tracing::info!(length, "response body has content length");
        let amount = std::io::copy(&mut body.take(length), &mut output)?;

        if amount < length {
            tracing::warn!(amount, length, "input ended before content length");
        }

        amount
    } else {
        tracing::info!("response body is delimited by end of input");
        std::io::copy(&mut body, &mut output)?
    };

    output.flush()?;

    tracing::info!(status = %head.status, amount, "response body extracted");

    Ok(())
}

/// Formats the head with field names lowercased and sorted.
fn format_head(head: &ResponseHead) -> String {
    let mut lines = head
        .headers
        .iter()
        .map(|(name, value)| {
            format!(
                "<< {}: {}",
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes())
            )
        })
        .collect::<Vec<String>>();
    lines.sort();

    let mut text = format!(
        "** {} {}\n",
        head.status.as_u16(),
        if head.reason.is_empty() {
            head.status.canonical_reason().unwrap_or_default()
        } else {
            head.reason.as_str()
        }
    );

    for line in lines {
        text.push_str(&line);
        text.push('\n');
    }

    text.push('\n');

    text
}
