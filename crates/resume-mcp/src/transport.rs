//! Line-delimited JSON-RPC over stdio.
//!
//! One request per line in, one response per line out. Requests are handled
//! in order; notifications produce no output.

use crate::server::McpServer;
use crate::types::{McpError, McpRequest, McpResponse, RequestId};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<R, W>(server: &McpServer, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(server, line.trim()).await,
            Err(e) => {
                warn!(error = %e, "Request is not valid UTF-8");
                Some(McpResponse::error(RequestId::Null, McpError::parse_error()))
            }
        };
        let Some(response) = response else {
            continue;
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }

    info!("Input closed, shutting down");
    Ok(())
}

/// Serve on the process's stdin and stdout.
pub async fn serve_stdio(server: &McpServer) -> std::io::Result<()> {
    serve(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

async fn handle_line(server: &McpServer, line: &str) -> Option<McpResponse> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Unparseable request");
            return Some(McpResponse::error(RequestId::Null, McpError::parse_error()));
        }
    };

    let id = value
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value(id).ok())
        .unwrap_or(RequestId::Null);

    match serde_json::from_value::<McpRequest>(value) {
        Ok(request) => {
            debug!(method = %request.method, "Request received");
            server.handle_request(request).await
        }
        Err(e) => {
            warn!(error = %e, "Malformed request");
            Some(McpResponse::error(
                id,
                McpError::invalid_request().with_data(Value::String(e.to_string())),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(input: &str) -> Vec<Value> {
        let server = McpServer::new("resume-mcp", "test");
        let mut output = Vec::new();
        serve(&server, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_response_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], json!(1));
        assert_eq!(responses[1]["result"]["tools"], json!([]));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_serving() {
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'{', b'\n']);
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

        let server = McpServer::new("resume-mcp", "test");
        let mut output = Vec::new();
        serve(&server, input.as_slice(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[1]["error"]["code"], json!(McpError::PARSE_ERROR));
        assert_eq!(responses[2]["id"], json!(2));
    }

    #[tokio::test]
    async fn test_parse_errors() {
        let responses = run("not json\n{\"id\": 5}\n").await;
        assert_eq!(responses[0]["error"]["code"], json!(McpError::PARSE_ERROR));
        assert_eq!(responses[1]["id"], json!(5));
        assert_eq!(responses[1]["error"]["code"], json!(McpError::INVALID_REQUEST));
    }
}
