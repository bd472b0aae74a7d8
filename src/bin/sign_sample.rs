//! Sign a generated sample PDF
//!
//! Builds a document of blank pages, reserves a signature (or document
//! timestamp) placeholder and embeds a stand-in signature: the SHA-256
//! digest of the covered bytes.
//!
//! Usage:
//!   cargo run --release --bin sign_sample
//!   cargo run --release --bin sign_sample -- --output signed.pdf --pages 3 --timestamp
//!   cargo run --release --bin sign_sample -- --reserve 4096 --object-streams --verbose

use pdf_seal::document::PdfDocument;
use pdf_seal::signatures::{DigestAlgorithm, DigestSigner, PdfSigner, SignOptions, SignatureBound};
use pdf_seal::writer::PdfWriterConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

struct SampleConfig {
    output: PathBuf,
    pages: usize,
    timestamp: bool,
    reserve: usize,
    object_streams: bool,
    verbose: bool,
}

impl SampleConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self {
            output: PathBuf::from("signed_sample.pdf"),
            pages: 1,
            timestamp: false,
            reserve: 8192,
            object_streams: false,
            verbose: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--output" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        config.output = PathBuf::from(&args[i]);
                    }
                },
                "--pages" => {
                    i += 1;
                    if let Some(n) = args.get(i).and_then(|v| v.parse().ok()) {
                        config.pages = n;
                    }
                },
                "--reserve" => {
                    i += 1;
                    if let Some(n) = args.get(i).and_then(|v| v.parse().ok()) {
                        config.reserve = n;
                    }
                },
                "--timestamp" => config.timestamp = true,
                "--object-streams" => config.object_streams = true,
                "--verbose" | "-v" => config.verbose = true,
                other => eprintln!("Ignoring unknown argument: {}", other),
            }
            i += 1;
        }

        config
    }
}

fn run(config: &SampleConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bound = SignatureBound::new(config.reserve)
        .ok_or("--reserve must be at least 1 byte")?;

    let mut doc = PdfDocument::new();
    for _ in 0..config.pages.max(1) {
        doc.add_letter_page()?;
    }

    let options = if config.timestamp {
        SignOptions::timestamp()
    } else {
        SignOptions::signature().with_reason("Sample signature")
    };

    let signer = DigestSigner::new(DigestAlgorithm::Sha256, bound, |digest: &[u8]| {
        Ok(digest.to_vec())
    });
    let writer_config = PdfWriterConfig::default()
        .with_compress(config.object_streams)
        .with_object_streams(config.object_streams);
    let pdf_signer = PdfSigner::new(signer, options).with_writer_config(writer_config);

    let start = Instant::now();
    let signed = pdf_signer.prepare_and_sign(&mut doc, &config.output)?;
    let elapsed = start.elapsed();

    println!("Wrote {}", config.output.display());
    println!("  File size:      {} bytes", signed.layout.file_size);
    println!("  /ByteRange at:  {}", signed.layout.offset_byte_range);
    println!("  /Contents at:   {}", signed.layout.offset_contents);
    println!("  ByteRange:      {}", signed.byte_range.to_pdf_array());
    println!("  Signature:      {} of {} bytes", signed.signature_len, bound.bytes());
    println!("  Time:           {:.2?}", elapsed);

    Ok(())
}

fn main() -> ExitCode {
    let config = SampleConfig::from_args();

    let level = if config.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
