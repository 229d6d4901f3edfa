//! Ubdump command line interface.

use std::{process, time::Duration};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings::*, Arg,
    ArgMatches, SubCommand,
};
use console::style;
use log::{debug, trace, LevelFilter};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use simplelog::*;

use ubdump::{self as ub, DumpJob, DumpRequest};

fn main() {
    println!("[UB] ubdump v{}", crate_version!());

    ctrlc::set_handler(move || {
        println!("🛑 received Ctrl+C!");
        process::exit(130);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Ubdump talks to a board sitting at the U-Boot prompt over its \
            serial console. It first synchronizes with the shell by having it \
            echo a random token, then runs `md.b` and rebuilds the binary \
            content from the hex dump printed back.\n\
            \n\
            Exit status:\n\
               \t0  dump written\n\
               \t1  invalid command line\n\
               \t2  serial device could not be opened\n\
               \t3  no answer from the bootloader shell\n\
               \t4  malformed line in the dump output\n\
               \t5  unexpected address in the dump output\n\
               \t6  bootloader went silent during the dump\n\
               \t7  output file error\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .setting(SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("DEVICE")
                .help("the serial device to use")
                .long("device")
                .takes_value(true)
                .default_value(ub::DEFAULT_DEVICE)
                .global(true),
        )
        .arg(
            Arg::with_name("BAUD_RATE")
                .help("serial port baud rate")
                .long("baudrate")
                .takes_value(true)
                .default_value("115200")
                .global(true),
        )
        .arg(
            Arg::with_name("DATA_BITS")
                .help("number of bits per character")
                .long("data-bits")
                .takes_value(true)
                .possible_values(&["5", "6", "7", "8"])
                .default_value("8")
                .global(true),
        )
        .arg(
            Arg::with_name("STOP_BITS")
                .help("number of stop bits per byte")
                .long("stop-bits")
                .takes_value(true)
                .possible_values(&["1", "2"])
                .default_value("1")
                .global(true),
        )
        .arg(
            Arg::with_name("PARITY")
                .help("parity checking protocol")
                .long("parity")
                .takes_value(true)
                .possible_values(&["none", "odd", "even"])
                .default_value("none")
                .global(true),
        )
        .arg(
            Arg::with_name("FLOW_CONTROL")
                .help("flow control mode")
                .long("flow-control")
                .takes_value(true)
                .possible_values(&["none", "soft", "hard"])
                .default_value("none")
                .global(true),
        )
        .arg(
            Arg::with_name("TIMEOUT")
                .help("seconds to wait for a line before giving up on it")
                .long("timeout")
                .takes_value(true)
                .default_value("1")
                .global(true),
        )
        .arg(
            Arg::with_name("RETRIES")
                .help("number of synchronization attempts")
                .long("retries")
                .takes_value(true)
                .default_value("5")
                .global(true),
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .global(true)
                .help(
                    "Sets the logging level of verbosity, repeat several times for \
                     higher verbosity",
                ),
        )
        .subcommand(
            SubCommand::with_name("dump")
                .about("Dump flash (or memory)")
                .arg(
                    Arg::with_name("ADDR")
                        .help("start address (hexadecimal)")
                        .long("addr")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("SIZE")
                        .help("number of bytes to dump")
                        .long_help(
                            "number of bytes to dump; decimal, or hexadecimal, \
                             octal and binary with the `0x`, `0o` and `0b` \
                             prefixes",
                        )
                        .long("size")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("OUTFILE")
                        .help("name of the output file")
                        .long("outfile")
                        .takes_value(true)
                        .default_value("dump.bin"),
                ),
        )
        .get_matches();

    // `dump` is the only command; global options given before or after it
    // are all visible from its matches.
    let dump_matches = match matches.subcommand() {
        ("dump", Some(dump_matches)) => dump_matches,
        _ => unreachable!(),
    };

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'ubdump -v -v -v' or 'ubdump -vvv' vs 'ubdump -v'
    let verbosity = std::cmp::max(
        matches.occurrences_of("v"),
        dump_matches.occurrences_of("v"),
    );
    let log_level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    trace!("{:#?}", matches);

    let settings = settings_from(dump_matches);
    let job = job_from(dump_matches);

    let mut session = ub::session::factory(settings, job);
    let exit_code = session.run();
    debug!("exit code: {}", exit_code);
    process::exit(exit_code);
}

// It's safe to call unwrap on all command line arguments with default values,
// because the value with either be what the user input at runtime or the
// default value.

fn settings_from(matches: &ArgMatches) -> ub::Settings {
    let baud_rate = value_t!(matches.value_of("BAUD_RATE"), u32)
        .unwrap_or_else(|_| invalid_value(matches, "BAUD_RATE", "baudrate"));
    let timeout = value_t!(matches.value_of("TIMEOUT"), f64)
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .unwrap_or_else(|| invalid_value(matches, "TIMEOUT", "timeout"));
    let retries = value_t!(matches.value_of("RETRIES"), u32)
        .unwrap_or_else(|_| invalid_value(matches, "RETRIES", "retries"));

    let data_bits = match matches.value_of("DATA_BITS").unwrap() {
        "5" => DataBits::Five,
        "6" => DataBits::Six,
        "7" => DataBits::Seven,
        "8" => DataBits::Eight,
        _ => unreachable!(),
    };

    let stop_bits = match matches.value_of("STOP_BITS").unwrap() {
        "1" => StopBits::One,
        "2" => StopBits::Two,
        _ => unreachable!(),
    };

    let parity = match matches.value_of("PARITY").unwrap() {
        "none" => Parity::None,
        "even" => Parity::Even,
        "odd" => Parity::Odd,
        _ => unreachable!(),
    };

    let flow_control = match matches.value_of("FLOW_CONTROL").unwrap() {
        "none" => FlowControl::None,
        "soft" => FlowControl::Software,
        "hard" => FlowControl::Hardware,
        _ => unreachable!(),
    };

    ub::SettingsBuilder::new()
        .path(matches.value_of("DEVICE").unwrap())
        .baud_rate(baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .flow_control(flow_control)
        .timeout(Duration::from_secs_f64(timeout))
        .sync_retries(retries)
        .finalize()
}

fn job_from(matches: &ArgMatches) -> DumpJob {
    // `ADDR` and `SIZE` are required, clap already rejected their absence.
    let address = ub::parse_address(matches.value_of("ADDR").unwrap())
        .unwrap_or_else(|_| invalid_value(matches, "ADDR", "addr"));
    let size = ub::parse_size(matches.value_of("SIZE").unwrap())
        .unwrap_or_else(|_| invalid_value(matches, "SIZE", "size"));

    // `md.b` prints 32 bit addresses, anything past that can never be
    // matched against the output.
    let request = DumpRequest::new(address, size);
    if !request.is_addressable() {
        println!(
            "{}: `{}` + `{}` goes past the 32 bit address space",
            style("error").red(),
            style("addr").cyan(),
            style("size").cyan()
        );
        invalid_value(matches, "ADDR", "addr");
    }

    DumpJob::new(request, matches.value_of("OUTFILE").unwrap())
}

fn invalid_value(matches: &ArgMatches, name: &str, flag: &str) -> ! {
    println!(
        "{}: `{}` does not have a valid value",
        style("error").red(),
        style(flag).cyan()
    );
    println!(
        "   {} `{}` is not a valid value",
        style("-->").cyan(),
        style(matches.value_of(name).unwrap_or_default()).on_red()
    );
    process::exit(1);
}
