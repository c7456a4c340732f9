//! Test doubles shared by the parser and poller tests.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use keylight_sdk::Recorder;
use keylight_types::PollOutcome;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One call made on a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Outcome(PollOutcome),
    StatusCode(u16),
    LastPoll,
    LastGoodPoll,
    LastError,
    PollDuration,
    ParseDuration,
    OnOff(i64),
    Brightness(i64),
    Temperature(i64),
}

/// Recorder that remembers every call in order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Recorder for EventLog {
    fn record_poll_outcome(&self, outcome: PollOutcome) {
        self.push(Event::Outcome(outcome));
    }

    fn record_status_code(&self, code: u16) {
        self.push(Event::StatusCode(code));
    }

    fn record_last_poll_time(&self, _ts: DateTime<Utc>) {
        self.push(Event::LastPoll);
    }

    fn record_last_good_poll_time(&self, _ts: DateTime<Utc>) {
        self.push(Event::LastGoodPoll);
    }

    fn record_last_error_time(&self, _ts: DateTime<Utc>) {
        self.push(Event::LastError);
    }

    fn record_poll_duration(&self, _duration: Duration) {
        self.push(Event::PollDuration);
    }

    fn record_parse_duration(&self, _duration: Duration) {
        self.push(Event::ParseDuration);
    }

    fn record_on_off(&self, value: i64) {
        self.push(Event::OnOff(value));
    }

    fn record_brightness(&self, value: i64) {
        self.push(Event::Brightness(value));
    }

    fn record_temperature(&self, value: i64) {
        self.push(Event::Temperature(value));
    }
}

/// What the fake device does with each connection.
#[derive(Debug, Clone)]
pub enum Script {
    /// Write these raw bytes after reading the request, then close.
    Respond(String),
    /// Read the request and never answer.
    Hang,
}

/// A complete HTTP/1.1 response with a correct `Content-Length`.
pub fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

/// Start a fake device on a random local port.
pub async fn spawn_device(script: Script) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let script = script.clone();

            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                match script {
                    Script::Respond(raw) => {
                        let _ = stream.write_all(raw.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    }
                    Script::Hang => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            });
        }
    });

    port
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
