//! Output backends for processed readings and alerts.
//!
//! Every processed reading is emitted as a `sensor_data` event; every
//! non-empty alert batch as a `health_alerts` event. Serialized outputs
//! write one JSON object per line:
//!
//! ```json
//! {"event": "sensor_data", "data": {"timestamp": 1700000000000, "heartRate": 72.0, ...}}
//! {"event": "health_alerts", "data": [{"severity": "warning", "channel": "heartRate", ...}]}
//! ```

use std::path::PathBuf;

use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use vitalwatch_types::{Alert, EnrichedReading};

use crate::wire::encode_enriched;

/// Something emitted by the monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A processed reading, emitted for every reading.
    SensorData(EnrichedReading),
    /// Alerts raised by one reading. Never empty.
    HealthAlerts(Vec<Alert>),
}

impl Event {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SensorData(_) => "sensor_data",
            Event::HealthAlerts(_) => "health_alerts",
        }
    }

    /// Serialize as `{"event": ..., "data": ...}`.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let data = match self {
            Event::SensorData(reading) => encode_enriched(reading),
            Event::HealthAlerts(alerts) => serde_json::to_value(alerts)?,
        };
        Ok(json!({ "event": self.name(), "data": data }))
    }
}

/// Output destination for events.
#[derive(Debug)]
pub enum Output {
    /// Write events to standard output, one per line.
    Stdout,

    /// Append events to a file, one per line.
    File(PathBuf),

    /// Send events to a TCP server as newline-delimited JSON.
    ///
    /// A connection is opened per event; delivery is best effort.
    Tcp(String),

    /// Send events through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(mpsc::Sender<Event>),
}

impl Output {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vitalwatch::Output;
    ///
    /// let output = Output::file("vitals.ndjson");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a TCP output.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Output::Tcp(addr.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vitalwatch::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive events
    /// // while let Some(event) = rx.recv().await {
    /// //     println!("Got {}", event.name());
    /// // }
    /// ```
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Human-readable description for logs.
    pub fn description(&self) -> String {
        match self {
            Output::Stdout => "stdout".to_string(),
            Output::File(path) => format!("file: {}", path.display()),
            Output::Tcp(addr) => format!("tcp: {}", addr),
            Output::Channel(_) => "channel".to_string(),
        }
    }

    /// Emit an event to this output.
    pub async fn emit(&self, event: &Event) -> std::io::Result<()> {
        match self {
            Output::Stdout => {
                let line = to_line(event)?;
                let mut stdout = tokio::io::stdout();
                stdout.write_all(line.as_bytes()).await?;
                stdout.flush().await?;
            }
            Output::File(path) => {
                let line = to_line(event)?;
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(line.as_bytes()).await?;
                // tokio completes the write in the background until flushed
                file.flush().await?;
            }
            Output::Tcp(addr) => {
                use tokio::net::TcpStream;

                let line = to_line(event)?;
                let mut stream = TcpStream::connect(addr).await?;
                stream.write_all(line.as_bytes()).await?;
            }
            Output::Channel(tx) => {
                // Never block the monitor; a dropped event is reported instead
                tx.try_send(event.clone()).map_err(|e| match e {
                    mpsc::error::TrySendError::Full(_) => {
                        std::io::Error::other("channel full, event dropped")
                    }
                    mpsc::error::TrySendError::Closed(_) => {
                        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "channel closed")
                    }
                })?;
            }
        }
        Ok(())
    }
}

fn to_line(event: &Event) -> std::io::Result<String> {
    let mut line = serde_json::to_string(&event.to_json()?)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalwatch_types::{Channel, ChannelReading, Severity, Trend};

    fn sample_reading() -> EnrichedReading {
        let mut reading = EnrichedReading::with_timestamp(5);
        reading.channels.insert(
            Channel::Spo2,
            ChannelReading {
                raw: 97.0,
                smoothed: 97.0,
                trend: Trend::Stable,
                anomaly: false,
            },
        );
        reading
    }

    fn sample_alert() -> Alert {
        Alert {
            severity: Severity::Danger,
            channel: Channel::Spo2,
            message: "Low SpO2: 90%".to_string(),
            value: 90.0,
            trend: Trend::Decreasing,
            anomaly: false,
            timestamp_ms: 5,
        }
    }

    #[test]
    fn event_json_shapes() {
        let reading = Event::SensorData(sample_reading()).to_json().unwrap();
        assert_eq!(reading["event"], "sensor_data");
        assert_eq!(reading["data"]["spo2"], 97.0);
        assert_eq!(reading["data"]["spo2_trend"], "stable");

        let alerts = Event::HealthAlerts(vec![sample_alert()]).to_json().unwrap();
        assert_eq!(alerts["event"], "health_alerts");
        assert_eq!(alerts["data"][0]["severity"], "danger");
        assert_eq!(alerts["data"][0]["channel"], "spo2");
    }

    #[test]
    fn descriptions() {
        assert_eq!(Output::Stdout.description(), "stdout");
        assert_eq!(Output::tcp("localhost:9000").description(), "tcp: localhost:9000");
        assert_eq!(Output::file("/tmp/out.ndjson").description(), "file: /tmp/out.ndjson");
    }

    #[tokio::test]
    async fn channel_output_forwards_events() {
        let (output, mut rx) = Output::channel(4);
        let event = Event::SensorData(sample_reading());

        output.emit(&event).await.unwrap();

        assert_eq!(rx.recv().await, Some(event));
    }

    #[tokio::test]
    async fn channel_output_reports_dropped_events() {
        let (output, rx) = Output::channel(1);
        let event = Event::SensorData(sample_reading());

        output.emit(&event).await.unwrap();
        // Buffer of one is now full
        assert!(output.emit(&event).await.is_err());

        drop(rx);
        let err = output.emit(&event).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn file_output_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let output = Output::file(&path);

        output.emit(&Event::SensorData(sample_reading())).await.unwrap();
        output.emit(&Event::HealthAlerts(vec![sample_alert()])).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        // Lines land in emit order
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first["event"], "sensor_data");
        assert_eq!(second["event"], "health_alerts");
    }

    #[tokio::test]
    async fn tcp_output_sends_one_line() {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = String::new();
            socket.read_to_string(&mut buf).await.unwrap();
            buf
        });

        Output::tcp(addr)
            .emit(&Event::SensorData(sample_reading()))
            .await
            .unwrap();

        let received = server.await.unwrap();
        assert!(received.ends_with('\n'));
        let value: Value = serde_json::from_str(received.trim()).unwrap();
        assert_eq!(value["event"], "sensor_data");
    }
}
