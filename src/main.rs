//! # Demo harness
//!
//! Dispatches CLI flags to [`simfs::FileSystem`] operations against a raw
//! sector image file on the host disk. Stands in for the out-of-scope
//! syscall dispatcher and simulator, purely so the core can be exercised
//! end to end from a shell.

use std::fs;
use std::process::ExitCode;

use simfs::config::NUM_SECTORS;
use simfs::disk::RamDisk;
use simfs::filesystem::FileSystem;

mod cli;

fn load(image: &str) -> Result<FileSystem<RamDisk>, Box<dyn std::error::Error>> {
    let bytes = fs::read(image)?;
    let disk = RamDisk::from_bytes(&bytes)?;
    Ok(FileSystem::mount(disk)?)
}

fn persist(fs: FileSystem<RamDisk>, image: &str) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(image, fs.into_disk().to_bytes())?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = cli::build_cli().get_matches();
    let image = matches.get_one::<String>("image").unwrap().clone();

    if matches.get_flag("format") {
        return match FileSystem::format(RamDisk::default()).and_then(|fs| {
            persist(fs, &image).map_err(|_| simfs::Error::Io)
        }) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("format failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if let Some(path) = matches.get_one::<String>("execute") {
        eprintln!("-e {path}: out of scope, requires the MIPS user-mode emulator");
        return ExitCode::FAILURE;
    }

    if let Some(values) = matches.get_many::<String>("cp") {
        let args: Vec<&String> = values.collect();
        eprintln!("-cp {} {}: out of scope, requires the host-copy harness", args[0], args[1]);
        return ExitCode::FAILURE;
    }

    let mut fs = match load(&image) {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("could not mount {image}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut mutated = false;

    if let Some(name) = matches.get_one::<String>("print") {
        match fs.contents(name) {
            Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
            Err(e) => {
                eprintln!("print failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(name) = matches.get_one::<String>("remove") {
        if let Err(e) = fs.remove(name) {
            eprintln!("remove failed: {e}");
            return ExitCode::FAILURE;
        }
        mutated = true;
    }

    if let Some(path) = matches.get_one::<String>("list") {
        match fs.list(path) {
            Ok(lines) => lines.iter().for_each(|l| println!("{l}")),
            Err(e) => {
                eprintln!("list failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(path) = matches.get_one::<String>("lr") {
        match fs.list_recursive(path) {
            Ok(lines) => lines.iter().for_each(|l| println!("{l}")),
            Err(e) => {
                eprintln!("recursive list failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if matches.get_flag("dump") {
        println!("{} free of {}", fs.free_sectors(), NUM_SECTORS);
        println!("{}", fs.bitmap_dump());
    }

    if mutated {
        if let Err(e) = persist(fs, &image) {
            eprintln!("could not persist {image}: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
