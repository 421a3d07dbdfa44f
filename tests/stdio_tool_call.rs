use serde_json::{Value, json};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tempfile::tempdir;

// Nothing listens on the discard port, so generation fails fast.
const CLOSED_ENDPOINT: &str = "http://127.0.0.1:9";

struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Server {
    fn start(data_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_design-repo-mcp"))
            .args(["serve", "--stdio", "--data-dir"])
            .arg(data_dir)
            .args([
                "--azure-endpoint",
                CLOSED_ENDPOINT,
                "--azure-api-key",
                "test-key",
                "--azure-deployment",
                "test-deployment",
                "--generation-timeout-secs",
                "5",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().expect("stdin available");
        let stdout = BufReader::new(child.stdout.take().expect("stdout available"));
        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }

    fn request(&mut self, request: &Value) -> Result<Value, Box<dyn std::error::Error>> {
        let serialized = serde_json::to_string(request)?;
        writeln!(self.stdin, "{serialized}")?;
        self.stdin.flush()?;

        let mut line = String::new();
        self.stdout.read_line(&mut line)?;
        Ok(serde_json::from_str(line.trim())?)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

fn call(id: u64, name: &str, user_query: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {
            "name": name,
            "arguments": { "user_query": user_query }
        }
    })
}

fn envelope_text(response: &Value) -> Value {
    let text = response
        .get("result")
        .and_then(|value| value.get("content"))
        .and_then(|value| value.as_array())
        .and_then(|arr| arr.first())
        .and_then(|value| value.get("text"))
        .and_then(|value| value.as_str())
        .expect("text content present");
    serde_json::from_str(text).expect("envelope text is JSON")
}

#[test]
fn missing_catalog_returns_error_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut server = Server::start(dir.path())?;

    let response = server.request(&call(3, "icon_repository", "red gradient icon"))?;
    assert_eq!(response.get("id").and_then(|v| v.as_u64()), Some(3));

    let result = response.get("result").expect("result present");
    assert_eq!(result.get("isError").and_then(|v| v.as_bool()), Some(false));
    let expected = json!({"response": ["Error loading icon repository data"]});
    assert_eq!(result.get("structuredContent"), Some(&expected));
    assert_eq!(envelope_text(&response), expected);
    Ok(())
}

#[test]
fn generation_failure_returns_error_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("ppt_repository.json"),
        r#"{"decks/q3_newsletter.pptx": "Quarterly review deck"}"#,
    )?;
    let mut server = Server::start(dir.path())?;

    let response = server.request(&call(4, "ppt_repository", "Q3 review deck"))?;
    assert_eq!(
        envelope_text(&response),
        json!({"response": ["Error generating PPT repository response"]})
    );
    Ok(())
}

#[test]
fn every_tool_answers_with_an_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("internal_logos.json"), r#"{"logo.svg": "logo"}"#)?;
    let mut server = Server::start(dir.path())?;

    let names = [
        "emailer_and_newsletters",
        "icon_repository",
        "internal_logos",
        "mahindra_branding_guideline",
        "ppt_repository",
    ];
    for (id, name) in names.iter().enumerate() {
        let response = server.request(&call(10 + id as u64, name, "anything at all"))?;
        let envelope = envelope_text(&response);
        let object = envelope.as_object().expect("envelope is an object");
        assert_eq!(object.len(), 1);
        let items = object
            .get("response")
            .and_then(|value| value.as_array())
            .expect("response is an array");
        assert_eq!(items.len(), 1);
    }
    Ok(())
}

#[test]
fn unknown_tool_is_reported_as_tool_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut server = Server::start(dir.path())?;

    let response = server.request(&call(5, "hwp.convert", "anything"))?;
    let result = response.get("result").expect("result present");
    assert_eq!(result.get("isError").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        result
            .get("structuredContent")
            .and_then(|value| value.get("error"))
            .and_then(|value| value.get("kind"))
            .and_then(|value| value.as_str()),
        Some("unknown_tool")
    );
    Ok(())
}

#[test]
fn missing_user_query_is_reported_as_tool_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut server = Server::start(dir.path())?;

    let response = server.request(&json!({
        "jsonrpc": "2.0",
        "id": 6,
        "method": "tools/call",
        "params": { "name": "internal_logos", "arguments": { "query": "logo" } }
    }))?;
    let result = response.get("result").expect("result present");
    assert_eq!(result.get("isError").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        result
            .get("structuredContent")
            .and_then(|value| value.get("error"))
            .and_then(|value| value.get("kind"))
            .and_then(|value| value.as_str()),
        Some("invalid_input")
    );
    Ok(())
}

#[test]
fn ping_and_unknown_method() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut server = Server::start(dir.path())?;

    let pong = server.request(&json!({"jsonrpc": "2.0", "id": 7, "method": "ping"}))?;
    assert_eq!(pong.get("result"), Some(&json!({})));

    // notifications produce no output, so the next line answers id 8
    let serialized = serde_json::to_string(&json!({
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }))?;
    writeln!(server.stdin, "{serialized}")?;

    let response = server.request(&json!({"jsonrpc": "2.0", "id": 8, "method": "resources/list"}))?;
    assert_eq!(response.get("id").and_then(|v| v.as_u64()), Some(8));
    assert_eq!(
        response
            .get("error")
            .and_then(|value| value.get("code"))
            .and_then(|value| value.as_i64()),
        Some(-32601)
    );
    Ok(())
}
