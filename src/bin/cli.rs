//! This is the command line tool that loads an input file and either compresses
//! or decompresses it.

extern crate clap;
extern crate env_logger;
extern crate log;

use clap::{value_parser, Arg, ArgAction, Command};
use zstream::same_buffer::{compress_in_place, decompress_in_place, reserve_headroom};
use zstream::utils::signatures::FILE_EXTENSION;
use zstream::{
    compress_stream, decompress_stream, decompress_to_vec, looks_gzip_compressed,
    peek_gzip_compressed, CompressionLevel, Context, Format, Totals, DEFAULT_CHUNK_SIZE,
};

use std::process::ExitCode;
use std::{fs, time::Instant};
use std::{fs::File, io::Write};

fn save_file(data: &[u8], path: &str) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(data)?;
    log::info!("Wrote {}.", &path);
    Ok(())
}

/// A scoped utility struct for measuring and reporting time.
struct Timer {
    start: std::time::Instant,
}

impl Timer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let now = Instant::now();
        if let Some(duration) = now.checked_duration_since(self.start) {
            log::info!(
                "Operation completed in {:03} seconds",
                duration.as_secs_f32()
            );
        }
    }
}

fn parse_format(name: &str) -> Format {
    match name {
        "zlib" => Format::Zlib,
        "deflate" => Format::Deflate,
        _ => Format::Gzip,
    }
}

/// Compress or decompress 'input_path' into 'output_path' by streaming
/// between the two files.
fn handle_files(
    is_compress: bool,
    format: Format,
    ctx: Context,
    input_path: &str,
    output_path: &str,
) -> zstream::Result<Totals> {
    let mut input = File::open(input_path)?;
    if is_compress && peek_gzip_compressed(&mut input)? {
        log::warn!("{} already looks gzip-compressed", input_path);
    }
    let output = File::create(output_path)?;
    if is_compress {
        log::info!("Compressing as {:?}", format);
        compress_stream(input, output, format, ctx)
    } else {
        log::info!("Decompressing {:?}", format);
        decompress_stream(input, output, format, ctx)
    }
}

/// Compress or decompress the whole file in memory, reusing the buffer the
/// file was read into.
fn handle_in_place(
    is_compress: bool,
    format: Format,
    ctx: Context,
    input_path: &str,
    output_path: &str,
) -> zstream::Result<Totals> {
    let mut buffer = fs::read(input_path)?;
    let totals = if is_compress {
        if looks_gzip_compressed(&buffer) {
            log::error!("Looks like this is already gzip/deflated");
            return Err(zstream::Error::AlreadyCompressed);
        }
        reserve_headroom(&mut buffer, format);
        log::info!("Compressing {} bytes in place", buffer.len());
        compress_in_place(&mut buffer, format, ctx)?
    } else {
        log::info!("Decompressing {} bytes in place", buffer.len());
        decompress_in_place(&mut buffer, format, ctx)?
    };
    save_file(&buffer, output_path)?;
    Ok(totals)
}

fn main() -> ExitCode {
    let matches = Command::new("CLI")
        .version("1.x")
        .arg(
            Arg::new("checked")
                .long("check")
                .help("Verify that the output decompresses to the input")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("decompress")
                .short('d')
                .long("decompress")
                .help("Try to decompress the input")
                .action(ArgAction::SetTrue)
                .conflicts_with("compress"),
        )
        .arg(
            Arg::new("compress")
                .short('c')
                .long("compress")
                .help("Compress the input")
                .conflicts_with("decompress")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("in-place")
                .long("in-place")
                .help("Compress the file contents into the buffer they were read into")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path of the output file")
                .num_args(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("format")
                .help("The framing around the compressed data.")
                .value_parser(["gzip", "zlib", "deflate"])
                .num_args(1),
        )
        .arg(
            Arg::new("level")
                .short('l')
                .long("level")
                .value_name("0-9")
                .help("The compression level")
                .value_parser(value_parser!(u32).range(0..=9))
                .num_args(1),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .value_name("BYTES")
                .help("Size of the internal output chunk")
                .value_parser(value_parser!(usize))
                .num_args(1),
        )
        .arg(
            Arg::new("INPUT")
                .help("Sets the input file to use")
                .required(true)
                .index(1),
        )
        .get_matches();

    env_logger::builder().format_timestamp(None).init();

    let mut cli_compress = matches.get_flag("compress");
    let cli_decompress = matches.get_flag("decompress");
    let cli_checked_mode = matches.get_flag("checked");
    let cli_in_place = matches.get_flag("in-place");
    let mut cli_output_path = matches.get_one::<String>("output").cloned();
    let format = parse_format(
        matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("gzip"),
    );

    let level = match matches.get_one::<u32>("level") {
        Some(level) => match CompressionLevel::from_numeric(*level) {
            Ok(level) => level,
            Err(err) => {
                log::error!("{}", err);
                return ExitCode::FAILURE;
            }
        },
        None => CompressionLevel::Default,
    };
    let chunk_size = matches
        .get_one::<usize>("chunk-size")
        .copied()
        .unwrap_or(DEFAULT_CHUNK_SIZE);
    let ctx = Context::new(level, chunk_size);

    let input_path = match matches.get_one::<String>("INPUT") {
        Some(path) => path.clone(),
        None => return ExitCode::FAILURE,
    };

    // The user did not specify if this is compress of decompress. Try to figure
    // out using the extension.
    let ends_with_ext = input_path.ends_with(FILE_EXTENSION);
    if !cli_compress && !cli_decompress && !ends_with_ext {
        cli_compress = true;
    }

    // Come up with a file name.
    if cli_output_path.is_none() {
        if ends_with_ext {
            // remove the extension.
            let end = input_path.len() - FILE_EXTENSION.len();
            cli_output_path = Some(String::from(&input_path[0..end]));
        } else {
            // Add the extension.
            cli_output_path = Some(input_path.clone() + FILE_EXTENSION);
        }
    }
    let out = cli_output_path.unwrap_or_default();

    let timer = Timer::new();
    let result = if cli_in_place {
        handle_in_place(cli_compress, format, ctx, &input_path, &out)
    } else {
        handle_files(cli_compress, format, ctx, &input_path, &out)
    };
    drop(timer);

    let totals = match result {
        Ok(totals) => totals,
        Err(err) => {
            log::error!("{} failed: {}", if cli_compress { "Compression" } else { "Decompression" }, err);
            return ExitCode::FAILURE;
        }
    };

    if cli_compress {
        log::info!("Compressed from {} to {} bytes.", totals.read, totals.written);
        log::info!("Compression ratio is {:.4}x.", totals.ratio());
    } else {
        log::info!("Decompressed from {} to {} bytes.", totals.read, totals.written);
    }

    if cli_compress && cli_checked_mode {
        let verified = fs::read(&input_path).and_then(|original| {
            let compressed = fs::read(&out)?;
            Ok((original, compressed))
        });
        let (original, compressed) = match verified {
            Ok(pair) => pair,
            Err(err) => {
                log::error!("Could not read back the files: {}", err);
                return ExitCode::FAILURE;
            }
        };
        match decompress_to_vec(&compressed, format) {
            Ok(decoded) if decoded == original => log::info!("Correct!"),
            Ok(_) => {
                log::info!("Incorrect!");
                return ExitCode::FAILURE;
            }
            Err(err) => {
                log::info!("Could not decompress the file: {}", err);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
