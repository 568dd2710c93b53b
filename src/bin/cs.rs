fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = claude_sessions::parse_cli();
    match claude_sessions::run(&cli) {
        Ok(()) => Ok(()),
        Err(err) => {
            let exit_code = claude_sessions::exit_code_for_error(&err);
            claude_sessions::write_cli_error(&err, &mut std::io::stderr())?;
            std::process::exit(exit_code);
        }
    }
}
