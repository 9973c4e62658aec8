//! Job Timeline
//!
//! Records when watched jobs were seen entering each state, for timing
//! reports and a Gantt-style overview.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::client::JobState;

/// Type of timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// Job is queued on the service
    Submitted,
    /// Job was seen running
    Started,
    /// Job finished successfully
    Completed,
    /// Job finished in a failure state
    Failed,
    /// Job was cancelled
    Cancelled,
}

impl EventType {
    /// Maps a service-reported state onto a timeline event.
    pub fn from_state(state: JobState) -> Self {
        match state {
            JobState::Waiting => Self::Submitted,
            JobState::Running => Self::Started,
            JobState::Success => Self::Completed,
            JobState::Cancelled => Self::Cancelled,
            _ => Self::Failed,
        }
    }

    /// Returns true for events that end a job's bar.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// A single event in the timeline.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    /// Name of the job
    pub job: String,
    pub event_type: EventType,
    /// When the event was observed
    pub timestamp: Instant,
    /// Wall-clock time of the observation, for reports
    pub observed_at: DateTime<Local>,
}

/// Tracks the observed lifecycle of a set of jobs.
#[derive(Debug, Clone)]
pub struct ExecutionTimeline {
    events: Vec<TimelineEvent>,
    start_time: Instant,
}

impl ExecutionTimeline {
    /// Creates a new timeline starting now.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Records an event for a job.
    pub fn add_event(&mut self, job: impl Into<String>, event_type: EventType) {
        self.events.push(TimelineEvent {
            job: job.into(),
            event_type,
            timestamp: Instant::now(),
            observed_at: Local::now(),
        });
    }

    /// Returns all recorded events.
    pub fn get_events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Returns the last event recorded for a job.
    pub fn last_event(&self, job: &str) -> Option<&TimelineEvent> {
        self.events.iter().rev().find(|e| e.job == job)
    }

    /// Returns the total elapsed time since timeline creation.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Start and end offsets (ms) of each job that reached a final state.
    ///
    /// A job starts at its first event, whichever that is.
    fn spans(&self) -> HashMap<String, (u128, u128)> {
        let mut starts: HashMap<String, u128> = HashMap::new();
        let mut spans: HashMap<String, (u128, u128)> = HashMap::new();

        for event in &self.events {
            let elapsed = event.timestamp.duration_since(self.start_time).as_millis();
            let start = *starts.entry(event.job.clone()).or_insert(elapsed);

            if event.event_type.is_final() {
                spans.insert(event.job.clone(), (start, elapsed));
            }
        }

        spans
    }

    /// Returns how long each finished job was observed, in milliseconds.
    pub fn get_durations(&self) -> HashMap<String, u128> {
        self.spans()
            .into_iter()
            .map(|(job, (start, end))| (job, end - start))
            .collect()
    }

    /// Generates an ASCII Gantt chart of the finished jobs.
    pub fn gantt_chart(&self) -> String {
        let mut output = String::from("\nJob Timeline:\n\n");

        let total_time = self.start_time.elapsed().as_millis();
        if total_time == 0 {
            return output;
        }

        // Scale to 50 characters width
        let scale = 50.0 / total_time as f64;

        let mut sorted_jobs: Vec<_> = self.spans().into_iter().collect();
        sorted_jobs.sort_by_key(|(_, (start, _))| *start);

        for (job, (start, end)) in sorted_jobs {
            let start_pos = (start as f64 * scale) as usize;
            let width = ((end - start) as f64 * scale).max(1.0) as usize;

            let mut bar = " ".repeat(start_pos);
            bar.push_str(&"#".repeat(width));

            output.push_str(&format!(
                "{:16} |{}| ({} ms)\n",
                truncate(&job, 16),
                bar,
                end - start
            ));
        }

        output.push_str(&format!("\nTotal: {} ms\n", total_time));
        output
    }

    /// One line per event with its wall-clock time.
    pub fn event_log(&self) -> String {
        self.events
            .iter()
            .map(|e| {
                format!(
                    "{} {:16} {:?}\n",
                    e.observed_at.format("%H:%M:%S"),
                    truncate(&e.job, 16),
                    e.event_type
                )
            })
            .collect()
    }
}

impl Default for ExecutionTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Pads or truncates a string to exactly `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
