mod argutil;
mod decode;
mod logging;

use unchunk::error::format_to_string;

fn main() -> anyhow::Result<()> {
    let command = crate::argutil::build_commands();
    let arg_matches = command.get_matches();

    crate::logging::LogSettings::from_args(&arg_matches).init()?;

    let result = match arg_matches.subcommand() {
        Some(("body", sub_matches)) => crate::decode::run_body(sub_matches),
        Some(("response", sub_matches)) => crate::decode::run_response(sub_matches),
        _ => unreachable!(),
    };

    match result {
        Ok(_) => {
            tracing::info!("program exit ok");
            Ok(())
        }
        Err(error) => {
            match error.downcast_ref::<unchunk::error::Error>() {
                Some(source) => tracing::error!(error = %format_to_string(source), "program exit error"),
                None => tracing::error!(%error, "program exit error"),
            }
            Err(error)
        }
    }
}
