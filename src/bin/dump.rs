//! Dump tool for extracting the decoded file info trailer
//!
//! Usage: cargo run --bin dump <replay.dem> [output.bin]

use std::env;
use std::fs::{self, File};
use std::process::ExitCode;

use dota_report_parser::header::read_trailer;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <replay.dem> [output.bin]", args[0]);
        eprintln!("  If output.bin is not specified, writes to file_info.bin");
        return ExitCode::FAILURE;
    }

    let input_path = &args[1];
    let output_path = args.get(2).map_or("file_info.bin", String::as_str);

    eprintln!("Reading: {input_path}");
    let mut file = match File::open(input_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let record = match read_trailer(&mut file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error reading trailer: {e}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Command: {:?}", record.command);
    eprintln!("Tick: {}", record.tick);
    eprintln!("Compressed: {}", record.compressed);
    eprintln!("Stored size: {} bytes", record.payload.len());

    let payload = match record.decode_payload() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error decoding payload: {e}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Decoded size: {} bytes", payload.len());

    if let Err(e) = fs::write(output_path, &payload) {
        eprintln!("Error writing output: {e}");
        return ExitCode::FAILURE;
    }
    eprintln!("Wrote to: {output_path}");
    ExitCode::SUCCESS
}
