//! Monitor runner: moves readings from a source through the pipeline to outputs.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::data::{Pipeline, Processed};
use crate::output::{Event, Output};
use crate::source::ReadingSource;

/// Running totals kept by the monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Readings processed.
    pub readings: u64,
    /// Channel values dropped at decode or in the pipeline.
    pub rejected_values: u64,
    pub warnings: u64,
    pub dangers: u64,
    /// Failed output writes.
    pub output_errors: u64,
}

impl MonitorStats {
    /// Total alerts raised.
    pub fn alerts(&self) -> u64 {
        self.warnings + self.dangers
    }
}

/// Main monitor state.
pub struct Monitor {
    source: Box<dyn ReadingSource>,
    pipeline: Pipeline,
    outputs: Vec<Output>,
    stats: MonitorStats,
    last_error: Option<String>,
}

impl Monitor {
    /// Create a new Monitor reading from `source` and emitting to `outputs`.
    pub fn new(source: Box<dyn ReadingSource>, pipeline: Pipeline, outputs: Vec<Output>) -> Self {
        Self {
            source,
            pipeline,
            outputs,
            stats: MonitorStats::default(),
            last_error: None,
        }
    }

    /// Returns a description of the current reading source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Poll the source once and handle the reading, if any.
    ///
    /// Returns the processed result, or `None` if no reading was available.
    pub async fn step(&mut self) -> Option<Processed> {
        self.check_source_error();

        let decoded = self.source.poll()?;
        self.stats.rejected_values += decoded.rejected.len() as u64;

        let processed = self.pipeline.process(&decoded.reading);
        self.stats.readings += 1;
        self.stats.rejected_values += processed.rejected.len() as u64;

        for alert in &processed.alerts {
            if alert.is_danger() {
                self.stats.dangers += 1;
            } else {
                self.stats.warnings += 1;
            }
        }

        self.emit(Event::SensorData(processed.reading.clone())).await;
        if !processed.alerts.is_empty() {
            info!(
                count = processed.alerts.len(),
                "Alerts raised: {}",
                processed
                    .alerts
                    .iter()
                    .map(|a| a.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
            self.emit(Event::HealthAlerts(processed.alerts.clone())).await;
        }

        Some(processed)
    }

    /// Handle every reading currently available, then return.
    pub async fn drain(&mut self) -> MonitorStats {
        while self.step().await.is_some() {}
        self.stats
    }

    /// Keep polling until the source closes.
    ///
    /// Sleeps for `poll_interval` whenever the source has nothing new.
    pub async fn run(&mut self, poll_interval: Duration) -> MonitorStats {
        info!(source = %self.source.description(), "Monitoring");
        loop {
            if self.step().await.is_some() {
                continue;
            }
            if self.source.is_closed() {
                info!(source = %self.source.description(), "Source closed");
                break;
            }
            tokio::time::sleep(poll_interval).await;
        }
        self.stats
    }

    async fn emit(&mut self, event: Event) {
        for output in &self.outputs {
            if let Err(e) = output.emit(&event).await {
                error!(output = %output.description(), "Failed to emit {}: {}", event.name(), e);
                self.stats.output_errors += 1;
            }
        }
    }

    /// Log a source error once, when it first appears or changes.
    fn check_source_error(&mut self) {
        let current = self.source.error();
        if current != self.last_error {
            match &current {
                Some(err) => warn!(source = %self.source.description(), "Source error: {}", err),
                None => debug!(source = %self.source.description(), "Source recovered"),
            }
            self.last_error = current;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ChannelSource;
    use vitalwatch_types::{Channel, RawReading, Severity};

    fn monitor_with_channel() -> (
        tokio::sync::mpsc::Sender<RawReading>,
        tokio::sync::mpsc::Receiver<Event>,
        Monitor,
    ) {
        let (tx, source) = ChannelSource::create("test", 16);
        let (output, rx) = Output::channel(16);
        let monitor = Monitor::new(Box::new(source), Pipeline::default(), vec![output]);
        (tx, rx, monitor)
    }

    #[tokio::test]
    async fn step_without_reading_returns_none() {
        let (_tx, mut rx, mut monitor) = monitor_with_channel();

        assert!(monitor.step().await.is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(monitor.stats(), MonitorStats::default());
    }

    #[tokio::test]
    async fn normal_reading_emits_only_sensor_data() {
        let (tx, mut rx, mut monitor) = monitor_with_channel();
        tx.send(RawReading::with_timestamp(1).with(Channel::HeartRate, 72.0))
            .await
            .unwrap();

        let processed = monitor.step().await.unwrap();
        assert!(processed.alerts.is_empty());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "sensor_data");
        assert!(rx.try_recv().is_err());
        assert_eq!(monitor.stats().readings, 1);
    }

    #[tokio::test]
    async fn alerting_reading_emits_both_events() {
        let (tx, mut rx, mut monitor) = monitor_with_channel();
        tx.send(
            RawReading::with_timestamp(1)
                .with(Channel::HeartRate, 45.0)
                .with(Channel::Spo2, 88.0),
        )
        .await
        .unwrap();

        monitor.step().await.unwrap();

        assert_eq!(rx.recv().await.unwrap().name(), "sensor_data");
        match rx.recv().await.unwrap() {
            Event::HealthAlerts(alerts) => {
                assert_eq!(alerts.len(), 2);
                assert_eq!(alerts[0].channel, Channel::HeartRate);
                assert_eq!(alerts[1].severity, Severity::Danger);
            }
            other => panic!("expected alerts, got {:?}", other),
        }

        let stats = monitor.stats();
        assert_eq!(stats.warnings, 1);
        assert_eq!(stats.dangers, 1);
        assert_eq!(stats.alerts(), 2);
    }

    #[tokio::test]
    async fn drain_processes_everything_buffered() {
        let (tx, mut rx, mut monitor) = monitor_with_channel();
        for i in 0..3 {
            tx.send(RawReading::with_timestamp(i).with(Channel::Temperature, 36.8))
                .await
                .unwrap();
        }

        let stats = monitor.drain().await;
        assert_eq!(stats.readings, 3);
        assert_eq!(monitor.pipeline().windows().len(Channel::Temperature), 3);

        let mut events = 0;
        while rx.try_recv().is_ok() {
            events += 1;
        }
        assert_eq!(events, 3);
    }

    #[tokio::test]
    async fn non_finite_values_are_counted() {
        let (tx, _rx, mut monitor) = monitor_with_channel();
        tx.send(
            RawReading::with_timestamp(1)
                .with(Channel::HeartRate, f64::NAN)
                .with(Channel::Spo2, 97.0),
        )
        .await
        .unwrap();

        let processed = monitor.step().await.unwrap();
        assert!(processed.reading.get(Channel::HeartRate).is_none());
        assert_eq!(monitor.stats().rejected_values, 1);
    }

    #[tokio::test]
    async fn closed_output_counts_errors() {
        let (tx, rx, mut monitor) = monitor_with_channel();
        drop(rx);
        tx.send(RawReading::with_timestamp(1).with(Channel::HeartRate, 45.0))
            .await
            .unwrap();

        monitor.step().await.unwrap();

        // Both the reading and its alert batch failed to send
        assert_eq!(monitor.stats().output_errors, 2);
    }

    #[tokio::test]
    async fn run_stops_when_source_closes() {
        let (tx, mut rx, mut monitor) = monitor_with_channel();
        tx.send(RawReading::with_timestamp(1).with(Channel::BloodSugar, 100.0))
            .await
            .unwrap();
        drop(tx);

        let stats = monitor.run(Duration::from_millis(1)).await;
        assert_eq!(stats.readings, 1);
        assert_eq!(rx.recv().await.unwrap().name(), "sensor_data");
    }
}
