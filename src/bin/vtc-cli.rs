use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

use vtc_rust::vtc_common_rs::packet::core::bit_utils::{checked_get_bits, checked_set_bits, sign_extend};
use vtc_rust::vtc_common_rs::packet::core::{ByteOrder, CrcPreset, FrameFormat};
use vtc_rust::vtc_common_rs::packet::types::{
    ControlMode, GearState, J1939Id, VehicleControlFrame, VehicleStateFrame, Wheel,
};
use vtc_rust::vtc_common_rs::utils::log_config::{init_logging, init_with_level, LogLevel};
use vtc_rust::vtc_common_rs::utils::{CodecConfig, ConfigLoader};

#[derive(Parser)]
#[command(name = "vtc")]
#[command(about = "VTC - vehicle telemetry codec tool")]
#[command(version = "0.1.0")]
#[command(long_about = "
VTC vehicle telemetry codec tool

Commands:
- crc:            checksum of hex or text input with a catalogue CRC
- get-bits:       read a bit field from a hex buffer
- set-bits:       write a bit field into a hex buffer
- decode-state:   decode a 40-byte VehicleStateFrame
- decode-control: decode a 16-byte VehicleControlFrame
- encode-control: build a VehicleControlFrame
- j1939:          decompose a 29-bit J1939 identifier
- config:         show the effective configuration
")]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a CRC
    Crc {
        /// Hex input
        data: Option<String>,
        /// Treat the input as text instead of hex
        #[arg(short, long)]
        text: bool,
        /// Catalogue name (defaults to the configured algorithm)
        #[arg(short, long)]
        algorithm: Option<String>,
        /// List catalogue algorithms
        #[arg(short, long)]
        list: bool,
    },
    /// Read a bit field
    GetBits {
        data: String,
        offset: usize,
        length: usize,
        /// little / big (defaults to the configured byte order)
        #[arg(short, long)]
        order: Option<ByteOrder>,
        /// Sign-extend the value
        #[arg(short, long)]
        signed: bool,
    },
    /// Write a bit field and print the buffer
    SetBits {
        data: String,
        /// Decimal or 0x-prefixed hex
        value: String,
        offset: usize,
        length: usize,
        #[arg(short, long)]
        order: Option<ByteOrder>,
    },
    /// Decode a vehicle state frame
    DecodeState {
        data: String,
        #[arg(long)]
        no_verify: bool,
    },
    /// Decode a vehicle control frame
    DecodeControl {
        data: String,
        #[arg(long)]
        no_verify: bool,
    },
    /// Encode a vehicle control frame
    EncodeControl {
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        steering: f32,
        #[arg(long, default_value = "0")]
        throttle: f32,
        #[arg(long, default_value = "0")]
        brake: f32,
        /// park / reverse / neutral / drive
        #[arg(long, default_value = "park")]
        gear: GearState,
        /// manual / autonomous / remote
        #[arg(long, default_value = "manual")]
        mode: ControlMode,
        #[arg(long)]
        handbrake: bool,
        #[arg(long)]
        emergency_stop: bool,
        #[arg(long, default_value = "0")]
        sequence: u8,
    },
    /// Decompose a J1939 identifier
    J1939 {
        /// Decimal or 0x-prefixed hex
        id: String,
    },
    /// Show the effective configuration
    Config {
        /// Write it to a file instead
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
}

fn parse_hex(input: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let cleaned: String = input
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    Ok(hex::decode(cleaned)?)
}

fn parse_number(input: &str) -> Result<u64, Box<dyn Error>> {
    let input = input.trim();
    let value = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16)?,
        None => input.parse()?,
    };
    Ok(value)
}

fn load_config(path: Option<PathBuf>) -> Result<CodecConfig, Box<dyn Error>> {
    let loader = ConfigLoader::new();
    let config = match path {
        Some(path) => loader.load_required(&path)?,
        None => loader.load()?,
    };
    Ok(config)
}

fn run_crc(
    config: &CodecConfig,
    data: Option<String>,
    text: bool,
    algorithm: Option<String>,
    list: bool,
) -> Result<(), Box<dyn Error>> {
    if list {
        for preset in CrcPreset::all() {
            println!("{:<18} width {:>2}  check 0x{:X}", preset.name(), preset.width(), preset.check());
        }
        return Ok(());
    }
    let input = data.ok_or("missing input")?;
    let bytes = if text { input.into_bytes() } else { parse_hex(&input)? };
    let preset = match algorithm {
        Some(name) => CrcPreset::by_name(&name)?,
        None => config.crc_preset()?,
    };
    let digits = preset.width() / 4;
    println!("{}: 0x{:0width$X}", preset.name(), preset.checksum(&bytes), width = digits);
    Ok(())
}

fn print_state(frame: &VehicleStateFrame) {
    println!("VehicleStateFrame");
    for wheel in Wheel::ALL {
        let state = frame.wheel(wheel);
        println!(
            "  {:<11} {:>10.3} rad/s {:>10.3} N·m",
            format!("{:?}", wheel),
            state.angular_velocity,
            state.torque
        );
    }
    println!("  steering     {:.4} rad", frame.steering_angle);
    println!("  gear         {:?}", frame.gear);
    println!("  control mode {:?}", frame.control_mode);
}

fn print_control(frame: &VehicleControlFrame) {
    println!("VehicleControlFrame");
    println!("  steering       {:.4} rad", frame.steering_angle);
    println!("  throttle       {:.3}", frame.throttle);
    println!("  brake          {:.3}", frame.brake);
    println!("  gear           {:?}", frame.gear);
    println!("  control mode   {:?}", frame.control_mode);
    println!("  handbrake      {}", frame.handbrake);
    println!("  emergency stop {}", frame.emergency_stop);
    println!("  sequence       {}", frame.sequence);
}

fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = load_config(cli.config)?;
    if cli.debug {
        init_with_level(LogLevel::Debug);
    } else {
        init_logging(&config.logging);
    }
    let default_order = config.frame.byte_order;

    match cli.command {
        Commands::Crc { data, text, algorithm, list } => {
            run_crc(&config, data, text, algorithm, list)?;
        }

        Commands::GetBits { data, offset, length, order, signed } => {
            let bytes = parse_hex(&data)?;
            let raw: u64 = checked_get_bits(&bytes, offset, length, order.unwrap_or(default_order))?;
            if signed {
                println!("{}", sign_extend(raw, length));
            } else {
                println!("{} (0x{:X})", raw, raw);
            }
        }

        Commands::SetBits { data, value, offset, length, order } => {
            let mut bytes = parse_hex(&data)?;
            checked_set_bits(&mut bytes, parse_number(&value)?, offset, length, order.unwrap_or(default_order))?;
            println!("{}", hex::encode(&bytes));
        }

        Commands::DecodeState { data, no_verify } => {
            let verify = config.crc.verify_on_decode && !no_verify;
            let frame = VehicleStateFrame::from_bytes_with(&parse_hex(&data)?, verify)?;
            print_state(&frame);
        }

        Commands::DecodeControl { data, no_verify } => {
            let verify = config.crc.verify_on_decode && !no_verify;
            let frame = VehicleControlFrame::from_bytes_with(&parse_hex(&data)?, verify)?;
            print_control(&frame);
        }

        Commands::EncodeControl {
            steering,
            throttle,
            brake,
            gear,
            mode,
            handbrake,
            emergency_stop,
            sequence,
        } => {
            let frame = VehicleControlFrame::new(steering, throttle, brake, gear, mode)
                .with_handbrake(handbrake)
                .with_emergency_stop(emergency_stop)
                .with_sequence(sequence);
            println!("{}", hex::encode(frame.to_bytes()));
        }

        Commands::J1939 { id } => {
            let id = J1939Id::from_raw(u32::try_from(parse_number(&id)?)?)?;
            println!("priority      {}", id.priority);
            println!("pgn           0x{:05X} ({})", id.pgn(), id.pgn());
            match id.destination_address() {
                Some(da) => println!("destination   0x{:02X}", da),
                None => println!("destination   broadcast (PDU2)"),
            }
            println!("source        0x{:02X}", id.source_address);
        }

        Commands::Config { save } => match save {
            Some(path) => {
                ConfigLoader::new().save_config(&config, &path)?;
                println!("saved {}", path.display());
            }
            None => print!("{}", toml::to_string_pretty(&config)?),
        },
    }

    Ok(())
}
