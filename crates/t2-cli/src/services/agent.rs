// crates/t2-cli/src/services/agent.rs - Device agent link
//
// One request per connection, both directions newline-delimited JSON:
//
//   -> {"op":"restart","options":{...}}
//   -> {"op":"deploy","options":{...},"payload":{...}}
//   <- {"ok":true,"result":...}
//   <- {"ok":false,"error":"...","code":3}

use anyhow::Context as AnyhowContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use t2_core::{Device, ErrorCode, OperationError, ResolvedOptions, Transport};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Byte stream to a device agent
pub trait AgentStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AgentStream for T {}

#[derive(Serialize)]
struct Request<'a> {
    op: &'a str,
    options: &'a ResolvedOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a Value>,
}

#[derive(Deserialize)]
struct Reply {
    ok: bool,
    #[serde(default)]
    result: Value,
    error: Option<String>,
    code: Option<ErrorCode>,
}

/// Open a stream to `device` over its transport
pub async fn connect(device: &Device) -> Result<Box<dyn AgentStream>, OperationError> {
    let stream: Box<dyn AgentStream> = match device.transport {
        Transport::Lan => Box::new(
            tokio::net::TcpStream::connect(&device.address)
                .await
                .with_context(|| format!("Cannot connect to {} at {}", device.name, device.address))?,
        ),
        Transport::Usb => Box::new(
            tokio::fs::OpenOptions::new()
                .read(true)
                .write(true)
                .open(&device.address)
                .await
                .with_context(|| format!("Cannot open {}", device.address))?,
        ),
    };
    Ok(stream)
}

/// Send one operation and wait for its reply
pub async fn request<S>(
    stream: &mut S,
    op: &str,
    options: &ResolvedOptions,
    payload: Option<&Value>,
) -> Result<Value, OperationError>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    let request = Request {
        op,
        options,
        payload,
    };
    let mut line = serde_json::to_string(&request).context("Cannot encode request")?;
    line.push('\n');
    debug!(op, "sending request");

    stream.write_all(line.as_bytes()).await?;
    stream.flush().await?;

    let mut reader = BufReader::new(stream);
    let mut reply = String::new();
    if reader.read_line(&mut reply).await? == 0 {
        return Err(OperationError::new("Device closed the connection without replying"));
    }

    interpret(&reply)
}

fn interpret(line: &str) -> Result<Value, OperationError> {
    let reply: Reply = serde_json::from_str(line.trim())
        .map_err(|e| OperationError::new(format!("Malformed reply from device: {}", e)))?;

    if reply.ok {
        return Ok(reply.result);
    }

    let err = OperationError::new(reply.error.unwrap_or_else(|| "Device reported an error".to_string()));
    Err(match reply.code {
        // numeric codes sent as strings
        Some(ErrorCode::Named(name)) => err.with_code(ErrorCode::parse(&name)),
        Some(code) => err.with_code(code),
        None => err,
    })
}
