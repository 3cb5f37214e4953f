use std::{io::IsTerminal, net::SocketAddr};

use anyhow::{Context, Result};
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use tracing::{info, warn};

use crate::{
    channel::{LineReader, LineWriter, MessageSink, MessageSource},
    cli::ClientArgs,
    message::ChatMessage,
};

const LINE_ENDINGS: &[char] = &['\n', '\r'];
const INPUT_PROMPT: &str = "You: ";

/// Connects, asks for a name if none was given, then prints incoming
/// messages on a background task while forwarding stdin lines.
///
/// Returns when stdin reaches end of input or a send fails.
pub async fn run(args: ClientArgs) -> Result<()> {
    let stream = establish_connection(args.server).await?;
    let interactive = std::io::stdin().is_terminal();
    let mut stdin = BufReader::new(io::stdin());

    let name = match args.name {
        Some(name) => name,
        None => prompt_name(&mut stdin).await?,
    };

    let (reader, writer) = stream.into_split();
    let source = LineReader::new(BufReader::new(reader));
    tokio::spawn(async move {
        if let Err(error) = print_incoming(source, io::stdout(), interactive).await {
            warn!(?error, "failed to write to stdout");
        }
    });

    let sink = LineWriter::new(writer);
    send_outgoing(&mut stdin, &sink, &name, interactive).await
}

async fn establish_connection(server: SocketAddr) -> Result<TcpStream> {
    let stream = TcpStream::connect(server)
        .await
        .with_context(|| format!("failed to connect to {server}"))?;
    info!("connected to {}", server);
    Ok(stream)
}

async fn prompt_name<I>(input: &mut I) -> Result<String>
where
    I: AsyncBufRead + Unpin,
{
    write_inline(&mut io::stdout(), "Enter your name: ").await?;
    let mut line = String::new();
    let bytes = input
        .read_line(&mut line)
        .await
        .context("failed to read name")?;
    if bytes == 0 {
        anyhow::bail!("input closed before a name was entered");
    }
    Ok(line.trim_end_matches(LINE_ENDINGS).to_string())
}

/// Sends each input line as a message from `name` until end of input.
pub async fn send_outgoing<I, S>(
    input: &mut I,
    sink: &S,
    name: &str,
    interactive: bool,
) -> Result<()>
where
    I: AsyncBufRead + Unpin,
    S: MessageSink,
{
    let mut line = String::new();
    loop {
        if interactive {
            write_inline(&mut io::stdout(), INPUT_PROMPT).await?;
        }

        line.clear();
        let bytes = input
            .read_line(&mut line)
            .await
            .context("failed to read input")?;
        if bytes == 0 {
            return Ok(());
        }

        let text = line.trim_end_matches(LINE_ENDINGS);
        sink.send(&ChatMessage::new(name, text))
            .await
            .context("failed to send message")?;
    }
}

/// Prints every message the relay delivers until the channel ends.
///
/// A lost connection is reported on `out` but is not an error: the sending
/// side keeps running on its own.
pub async fn print_incoming<R, W>(mut source: R, mut out: W, interactive: bool) -> io::Result<()>
where
    R: MessageSource,
    W: AsyncWrite + Unpin,
{
    loop {
        match source.receive().await {
            Ok(Some(message)) => {
                write_line(&mut out, &format_incoming(&message)).await?;
                if interactive {
                    write_inline(&mut out, INPUT_PROMPT).await?;
                }
            }
            Ok(None) => {
                write_line(&mut out, "*** connection closed by relay").await?;
                return Ok(());
            }
            Err(error) => {
                warn!(?error, "receive error");
                write_line(&mut out, &format!("*** connection lost: {error}")).await?;
                return Ok(());
            }
        }
    }
}

pub fn format_incoming(message: &ChatMessage) -> String {
    format!("[{}]: {}", message.sender_identity, message.text.trim_end())
}

async fn write_line<W>(out: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

async fn write_inline<W>(out: &mut W, text: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}
