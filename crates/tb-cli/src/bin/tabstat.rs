#![forbid(unsafe_code)]

use tb_cli::{Command, execute, help_text, parse_args};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let command = parse_args(std::env::args().skip(1))?;
    if command == Command::Help {
        println!("{}", help_text());
        return Ok(());
    }

    let report = execute(&command)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
