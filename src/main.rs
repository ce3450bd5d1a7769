use std::convert::TryFrom;
use std::io::Read;

use anyhow::Context;
use clap::{value_t, App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;

use usb_line_codec::text;
use usb_line_codec::usb::byte::ByteIteratorExt;
use usb_line_codec::usb::encoder::Encoder;
use usb_line_codec::usb::packet::{self, PacketIteratorExt};
use usb_line_codec::usb::types::{DataPid, HandShake, Pid, TokenType};

mod logging;

const PACKET_KINDS: [&str; 5] = ["token", "sof", "handshake", "data", "raw"];

fn encode_subcommand() -> App<'static, 'static> {
    SubCommand::with_name("encode")
        .about("Encodes a packet into one line state per tick")
        .arg(Arg::from_usage("<kind> 'Packet kind'").possible_values(&PACKET_KINDS))
        .arg(Arg::from_usage(
            "--pid [pid] 'PID name (out, in, setup, ping, data0, ack, ...)'",
        ))
        .arg(Arg::from_usage("--addr [addr] 'Device address'").default_value("0"))
        .arg(Arg::from_usage("--ep [ep] 'Endpoint number'").default_value("0"))
        .arg(Arg::from_usage("--frame [frame] 'Frame number'").default_value("0"))
        .arg(Arg::from_usage("[bytes]... 'Payload bytes in hex'"))
}

fn decode_subcommand() -> App<'static, 'static> {
    SubCommand::with_name("decode")
        .about("Decodes line states (0, J, K, 1 per tick) into packets")
        .arg(
            Arg::from_usage("--reset-ticks [reset-ticks] 'SE0 ticks reported as a bus reset'")
                .default_value("360000"),
        )
        .arg(Arg::from_usage(
            "[line] 'Line states; read from stdin when absent'",
        ))
}

fn pid_of<T>(matches: &ArgMatches<'_>) -> anyhow::Result<T>
where
    T: TryFrom<Pid, Error = usb_line_codec::BuildError>,
{
    let pid: Pid = matches
        .value_of("pid")
        .context("--pid is required for this packet kind")?
        .parse()?;
    Ok(T::try_from(pid)?)
}

fn payload(matches: &ArgMatches<'_>) -> anyhow::Result<Vec<u8>> {
    matches
        .values_of("bytes")
        .into_iter()
        .flatten()
        .map(|s| {
            u8::from_str_radix(s.trim_start_matches("0x"), 16)
                .with_context(|| format!("Invalid payload byte {:?}", s))
        })
        .collect()
}

fn encode(matches: &ArgMatches<'_>) -> anyhow::Result<()> {
    let bytes = match matches.value_of("kind").unwrap_or_default() {
        "token" => packet::token(
            pid_of::<TokenType>(matches)?,
            value_t!(matches, "addr", u8).unwrap_or_else(|e| e.exit()),
            value_t!(matches, "ep", u8).unwrap_or_else(|e| e.exit()),
        )?,
        "sof" => packet::sof(value_t!(matches, "frame", u16).unwrap_or_else(|e| e.exit()))?,
        "handshake" => packet::handshake(pid_of::<HandShake>(matches)?),
        "data" => packet::data(pid_of::<DataPid>(matches)?, &payload(matches)?),
        _ => payload(matches)?,
    };

    let line: Vec<_> = Encoder::new(bytes.iter().copied()).collect();
    println!("{} {:02x?}", "bytes:".bold(), bytes);
    println!("{} {}", "ticks:".bold(), line.len());
    println!("{}", text::render(&line, 4));
    Ok(())
}

fn decode(matches: &ArgMatches<'_>) -> anyhow::Result<()> {
    let input = match matches.value_of("line") {
        Some(line) => line.to_owned(),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let reset_ticks = value_t!(matches, "reset-ticks", u32).unwrap_or_else(|e| e.exit());
    let line = text::parse(&input)?;

    for (tick, event) in line
        .into_iter()
        .into_byte()
        .with_reset_ticks(reset_ticks)
        .into_packet()
    {
        match event {
            Ok(event) => println!("{:>9}: {}", tick, format!("{:?}", event).green()),
            Err(e) => println!("{:>9}: {}", tick, e.to_string().red()),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let matches = App::new("usb-line-codec")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::from_usage("-v... 'Raises the log level'"))
        .subcommand(encode_subcommand())
        .subcommand(decode_subcommand())
        .get_matches();

    logging::setup_logging(matches.occurrences_of("v"));

    match matches.subcommand() {
        ("encode", Some(m)) => encode(m),
        ("decode", Some(m)) => decode(m),
        _ => unreachable!(),
    }
}
