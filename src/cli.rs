//! Command-line argument surface for the demo harness.
//!
//! This is the syscall-dispatcher-facing CLI spec §6 names for
//! completeness; the real dispatcher, the MIPS emulator, and the host
//! file copy machinery behind `-e`/`-cp` are out of scope for this crate
//! (see [`crate::syscall`]), so those two flags are accepted but only
//! report that they require that external harness.

use clap::{arg, Command};

pub fn build_cli() -> Command {
    Command::new("simfs")
        .about("Demo harness for the simulated-disk file system core")
        .arg(arg!(-i --image <PATH> "sector image file to operate on").default_value("sim.img"))
        .arg(arg!(-f --format "format a fresh volume").required(false))
        .arg(arg!(-e --execute <PATH> "execute a user binary (out of scope: needs the MIPS emulator)").required(false))
        .arg(
            arg!(-c --cp <ARGS> "copy host file into the volume (out of scope: needs the host-copy harness)")
                .required(false)
                .num_args(2),
        )
        .arg(arg!(-p --print <NAME> "print a file's contents").required(false))
        .arg(arg!(-r --remove <NAME> "remove a file or directory").required(false))
        .arg(arg!(-l --list <PATH> "list a directory").required(false))
        .arg(arg!(--lr <PATH> "recursively list a directory").required(false))
        .arg(arg!(-D --dump "dump the free-sector bitmap").required(false))
        .arg(arg!(-d --debug <FLAGS> "enable debug log categories (passed through to RUST_LOG)").required(false))
}
