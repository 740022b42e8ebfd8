//! `pubsub-cli`: encode, decode, and demonstrate the PubSub NetworkMessage
//! codec from the command line.

mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use error::CliError;
use pubsub_proto::{
    BinaryDecode, BinaryEncode, Cursor, DataSetMessage, DataSetMessageHeader,
    DataSetMessagePayload, FieldEncoding, FieldValue, JsonCodecContext, NetworkMessage, OffsetKind,
    Reader, ScalarValue, Variant, decode_network_message, encode_network_message,
};
use pubsub_rt::{InMemoryTransport, NoSecurity, PublishedDataSet, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// PubSub NetworkMessage codec command-line tool.
#[derive(Parser, Debug)]
#[command(name = "pubsub-cli")]
#[command(about = "Encode, decode, and demo OPC UA PubSub NetworkMessages")]
#[command(version)]
struct Args {
    /// Path to a TOML config file; falls back to defaults if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a `ua-data` JSON envelope and print its UADP binary encoding as hex.
    Encode {
        /// Path to the JSON input file; reads stdin when omitted.
        input: Option<PathBuf>,
    },
    /// Read UADP binary (as hex) and print its `ua-data` JSON envelope.
    Decode {
        /// Path to the hex-encoded input file; reads stdin when omitted.
        input: Option<PathBuf>,
        /// `DataSetWriterId`s to thread through JSON decode, one per
        /// expected dataset message.
        #[arg(long, value_delimiter = ',')]
        writer_ids: Vec<u16>,
    },
    /// Run a short in-process publish/subscribe demo over the offset-table
    /// realtime fast path.
    DemoRt {
        /// Number of publish cycles to run.
        #[arg(long, default_value_t = 5)]
        cycles: u32,
    },
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pubsub_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let cfg = config::PubSubConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Encode { input } => run_encode(input.as_deref(), &cfg.codec),
        Command::Decode { input, writer_ids } => run_decode(input.as_deref(), &writer_ids, &cfg.codec),
        Command::DemoRt { cycles } => run_demo_rt(cycles),
    }
}

fn read_input(path: Option<&std::path::Path>) -> Result<String, CliError> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|source| CliError::Io { path: path.display().to_string(), source }),
        None => {
            use std::io::Read as _;
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| CliError::Io { path: "<stdin>".to_string(), source })?;
            Ok(buf)
        },
    }
}

#[allow(clippy::print_stdout)]
fn run_encode(input: Option<&std::path::Path>, codec: &pubsub_proto::CodecConfig) -> Result<(), CliError> {
    let text = read_input(input)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let ctx = JsonCodecContext::new(codec);
    let message = decode_network_message(&json, &ctx)?;
    let mut buf = vec![0u8; message.calc_size()];
    let mut cursor = Cursor::writer(&mut buf);
    message.encode(&mut cursor)?;
    println!("{}", hex_encode(&buf));
    Ok(())
}

#[allow(clippy::print_stdout)]
fn run_decode(
    input: Option<&std::path::Path>,
    writer_ids: &[u16],
    codec: &pubsub_proto::CodecConfig,
) -> Result<(), CliError> {
    let text = read_input(input)?;
    let bytes = hex_decode(text.trim())?;
    let mut reader = Reader::new(&bytes);
    let message = NetworkMessage::decode(&mut reader)?;
    let ctx = JsonCodecContext::with_dataset_writer_ids(codec, writer_ids);
    let json = encode_network_message(&message, "00000000-0000-0000-0000-000000000000", &ctx)?;
    let rendered = if codec.pretty_print {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{rendered}");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn run_demo_rt(cycles: u32) -> Result<(), CliError> {
    let (publisher_transport, subscriber_transport) = InMemoryTransport::pair();
    let mut published = PublishedDataSet::new(publisher_transport, NoSecurity, DemoKeys);
    let subscriber = Subscriber::new(subscriber_transport, NoSecurity, DemoKeys);

    let message = NetworkMessage {
        version: 1,
        publisher_id: None,
        dataset_class_id: None,
        chunk_message: false,
        group_header: None,
        payload_header: None,
        security_header: None,
        timestamp: None,
        picoseconds: None,
        promoted_fields: None,
        dataset_messages: vec![DataSetMessage {
            header: DataSetMessageHeader { valid: true, ..Default::default() },
            field_encoding: FieldEncoding::Variant,
            payload: DataSetMessagePayload::KeyFrame(vec![FieldValue::Variant(Variant::Scalar(
                ScalarValue::UInt32(0),
            ))]),
        }],
        security_footer: Vec::new(),
    };
    published.configure(&message)?;

    for cycle in 0..cycles {
        published.update_field(
            OffsetKind::KeyframeField { index: 0, field: 0 },
            &cycle.to_le_bytes(),
        )?;
        published.publish()?;
        subscriber.poll(|decoded| {
            println!("cycle {cycle}: {decoded:?}");
        })?;
    }
    Ok(())
}

struct DemoKeys;

impl pubsub_rt::SecurityKeyService for DemoKeys {
    fn current_key(&self) -> Result<(u32, Vec<u8>), pubsub_rt::RtError> {
        Err(pubsub_rt::RtError::NoKeyAvailable { token_id: 0 })
    }

    fn key_for_token(&self, token_id: u32) -> Result<Vec<u8>, pubsub_rt::RtError> {
        Err(pubsub_rt::RtError::NoKeyAvailable { token_id })
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

fn hex_decode(text: &str) -> Result<Vec<u8>, CliError> {
    let text = if text.len() % 2 == 1 { &text[..text.len() - 1] } else { text };
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(CliError::from)
}
