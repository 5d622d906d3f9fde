//! Weekly post generation schedule.
//!
//! Three fixed cron triggers, evaluated in the server's local time zone:
//!
//! | Day | Time | Cron | Job |
//! |---|---|---|---|
//! | Monday | 18:00 | `0 0 18 * * Mon` | static post |
//! | Wednesday | 18:00 | `0 0 18 * * Wed` | carousel, 5 slides |
//! | Friday | 18:00 | `0 0 18 * * Fri` | reel, 30 seconds |
//!
//! Each trigger runs in its own task: sleep until the next fire time, spawn
//! the firing, repeat. A firing runs detached from the loop, so a slow or
//! failing generator never delays the next firing and never stops the
//! scheduler. Missed firings (process down, machine asleep) are not replayed.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use cron::Schedule;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use powerchip_core::GenerationKind;

use super::JobRunner;
use super::generator::GenerationJob;

/// A cron expression (seconds first) and the job it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub name: &'static str,
    pub cron: &'static str,
    pub job: GenerationJob,
}

/// The production schedule.
pub const WEEKLY_TRIGGERS: [Trigger; 3] = [
    Trigger {
        name: "monday-static",
        cron: "0 0 18 * * Mon",
        job: GenerationJob::new(GenerationKind::Static),
    },
    Trigger {
        name: "wednesday-carousel",
        cron: "0 0 18 * * Wed",
        job: GenerationJob::new(GenerationKind::Carousel).with_count(5),
    },
    Trigger {
        name: "friday-reels",
        cron: "0 0 18 * * Fri",
        job: GenerationJob::new(GenerationKind::Reels).with_duration(30),
    },
];

impl Trigger {
    /// Parse the cron expression.
    ///
    /// # Errors
    ///
    /// Returns the parser error for a malformed expression.
    pub fn schedule(&self) -> Result<Schedule, cron::error::Error> {
        Schedule::from_str(self.cron)
    }

    /// The first fire time strictly after `now`, in `now`'s time zone.
    ///
    /// `None` if the expression does not parse or never fires again.
    #[must_use]
    pub fn next_fire_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule().ok()?.after(now).next()
    }
}

/// Next fire time of every trigger, soonest first.
#[must_use]
pub fn upcoming<'a, Tz: TimeZone>(
    triggers: &'a [Trigger],
    now: &DateTime<Tz>,
) -> Vec<(&'a Trigger, DateTime<Tz>)> {
    let mut times: Vec<_> = triggers
        .iter()
        .filter_map(|trigger| Some((trigger, trigger.next_fire_after(now)?)))
        .collect();
    times.sort_by(|a, b| a.1.cmp(&b.1));
    times
}

/// Fires triggers against a [`JobRunner`].
pub struct Scheduler<R, Tz = Local> {
    runner: Arc<R>,
    triggers: Vec<Trigger>,
    tz: Tz,
}

impl<R: JobRunner> Scheduler<R, Local> {
    /// Scheduler for [`WEEKLY_TRIGGERS`] in the local time zone.
    #[must_use]
    pub fn new(runner: Arc<R>) -> Self {
        Self::with_timezone(runner, Local)
    }
}

impl<R, Tz> Scheduler<R, Tz>
where
    R: JobRunner,
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync + std::fmt::Display,
{
    /// Scheduler for [`WEEKLY_TRIGGERS`] in a given time zone.
    #[must_use]
    pub fn with_timezone(runner: Arc<R>, tz: Tz) -> Self {
        Self {
            runner,
            triggers: WEEKLY_TRIGGERS.to_vec(),
            tz,
        }
    }

    /// Replace the trigger table.
    #[must_use]
    pub fn with_triggers(mut self, triggers: impl IntoIterator<Item = Trigger>) -> Self {
        self.triggers = triggers.into_iter().collect();
        self
    }

    /// Start one background task per trigger.
    #[must_use]
    pub fn spawn(self) -> SchedulerHandle {
        info!(triggers = self.triggers.len(), "Starting post scheduler");

        let tasks = self
            .triggers
            .into_iter()
            .filter_map(|trigger| match trigger.schedule() {
                Ok(schedule) => {
                    let runner = Arc::clone(&self.runner);
                    let tz = self.tz.clone();
                    Some(tokio::spawn(run_trigger(runner, trigger, schedule, tz)))
                }
                Err(e) => {
                    error!(
                        trigger = trigger.name,
                        cron = trigger.cron,
                        error = %e,
                        "Invalid cron expression, trigger skipped"
                    );
                    None
                }
            })
            .collect();

        SchedulerHandle { tasks }
    }
}

/// Handle to the running trigger tasks.
#[derive(Debug)]
pub struct SchedulerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Number of trigger tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop all trigger loops. Firings already in progress run to completion.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        info!("Post scheduler stopped");
    }
}

async fn run_trigger<R, Tz>(runner: Arc<R>, trigger: Trigger, schedule: Schedule, tz: Tz)
where
    R: JobRunner,
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync + std::fmt::Display,
{
    let mut after = Utc::now().with_timezone(&tz);

    loop {
        let Some(next) = schedule.after(&after).next() else {
            warn!(trigger = trigger.name, "Schedule has no further fire times");
            return;
        };
        let wait = (next.with_timezone(&Utc) - Utc::now())
            .to_std()
            .unwrap_or_default();

        info!(trigger = trigger.name, next_run = %next, "Next generation scheduled");
        tokio::time::sleep(wait).await;

        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            fire(runner.as_ref(), &trigger).await;
        });

        after = next.max(Utc::now().with_timezone(&tz));
    }
}

/// Run one firing, logging the outcome. Never propagates failure.
#[instrument(skip_all, fields(trigger = trigger.name, job = %trigger.job))]
async fn fire<R: JobRunner>(runner: &R, trigger: &Trigger) {
    info!("Scheduled generation started");

    match runner.run(&trigger.job).await {
        Ok(result) => info!(result = %result.as_value(), "Scheduled generation finished"),
        Err(e) => error!(error = %e, "Scheduled generation failed"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Datelike, FixedOffset, TimeDelta, Timelike, Weekday};
    use powerchip_core::JobResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    use crate::jobs::GeneratorError;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn trigger(name: &str) -> Trigger {
        WEEKLY_TRIGGERS.into_iter().find(|t| t.name == name).unwrap()
    }

    fn weekday_of(trigger: &Trigger) -> Weekday {
        match trigger.name {
            "monday-static" => Weekday::Mon,
            "wednesday-carousel" => Weekday::Wed,
            _ => Weekday::Fri,
        }
    }

    #[test]
    fn test_table() {
        assert_eq!(WEEKLY_TRIGGERS.len(), 3);
        assert_eq!(trigger("monday-static").job.kind, GenerationKind::Static);
        assert_eq!(trigger("wednesday-carousel").job.extra_args(), vec!["--count", "5"]);
        assert_eq!(trigger("friday-reels").job.extra_args(), vec!["--duration", "30"]);
        assert!(WEEKLY_TRIGGERS.iter().all(|t| t.schedule().is_ok()));
    }

    #[test]
    fn test_invalid_cron_never_fires() {
        let broken = Trigger {
            name: "broken",
            cron: "every friday",
            job: GenerationJob::new(GenerationKind::Static),
        };
        assert!(broken.schedule().is_err());
        assert_eq!(broken.next_fire_after(&utc(2026, 3, 2, 9, 0, 0)), None);
        assert!(upcoming(&[broken], &utc(2026, 3, 2, 9, 0, 0)).is_empty());
    }

    #[test]
    fn test_next_fire_same_day() {
        // 2026-03-02 is a Monday
        let now = utc(2026, 3, 2, 17, 59, 59);
        assert_eq!(
            trigger("monday-static").next_fire_after(&now),
            Some(utc(2026, 3, 2, 18, 0, 0))
        );
    }

    #[test]
    fn test_next_fire_is_strictly_after() {
        let now = utc(2026, 3, 2, 18, 0, 0);
        assert_eq!(
            trigger("monday-static").next_fire_after(&now),
            Some(utc(2026, 3, 9, 18, 0, 0))
        );
    }

    #[test]
    fn test_next_fire_later_in_week() {
        let now = utc(2026, 3, 2, 9, 0, 0);
        assert_eq!(
            trigger("wednesday-carousel").next_fire_after(&now),
            Some(utc(2026, 3, 4, 18, 0, 0))
        );
        assert_eq!(
            trigger("friday-reels").next_fire_after(&now),
            Some(utc(2026, 3, 6, 18, 0, 0))
        );
    }

    #[test]
    fn test_next_fire_wraps_week() {
        let now = utc(2026, 3, 7, 12, 0, 0);
        assert_eq!(
            trigger("monday-static").next_fire_after(&now),
            Some(utc(2026, 3, 9, 18, 0, 0))
        );
    }

    #[test]
    fn test_next_fire_uses_local_wall_clock() {
        let sao_paulo = FixedOffset::west_opt(3 * 3600).unwrap();
        // Monday 20:30 UTC is 17:30 in UTC-3
        let now = utc(2026, 3, 2, 20, 30, 0).with_timezone(&sao_paulo);
        let next = trigger("monday-static").next_fire_after(&now).unwrap();

        assert_eq!(next.hour(), 18);
        assert_eq!(next.weekday(), Weekday::Mon);
        assert_eq!(next.with_timezone(&Utc), utc(2026, 3, 2, 21, 0, 0));
    }

    #[test]
    fn test_next_fire_always_matches_and_within_a_week() {
        let start = utc(2026, 3, 1, 0, 0, 0);
        for trigger in WEEKLY_TRIGGERS {
            for hour in 0..(24 * 8) {
                let now = start + TimeDelta::hours(hour) + TimeDelta::minutes(17);
                let next = trigger.next_fire_after(&now).unwrap();
                assert!(next > now);
                assert!(next - now <= TimeDelta::weeks(1));
                assert_eq!(next.weekday(), weekday_of(&trigger));
                assert_eq!((next.hour(), next.minute(), next.second()), (18, 0, 0));
            }
        }
    }

    #[test]
    fn test_upcoming_sorted() {
        let now = utc(2026, 3, 5, 9, 0, 0); // Thursday
        let names: Vec<_> = upcoming(&WEEKLY_TRIGGERS, &now)
            .into_iter()
            .map(|(t, _)| t.name)
            .collect();
        assert_eq!(
            names,
            vec!["friday-reels", "monday-static", "wednesday-carousel"]
        );
    }

    /// Records every job; fails the first `fail_first` calls.
    struct RecordingRunner {
        calls: AtomicUsize,
        fail_first: usize,
        tx: mpsc::UnboundedSender<GenerationJob>,
    }

    impl JobRunner for RecordingRunner {
        async fn run(&self, job: &GenerationJob) -> Result<JobResult, GeneratorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.tx.send(*job);
            if call < self.fail_first {
                return Err(GeneratorError::Failed {
                    code: Some(1),
                    message: "boom".to_string(),
                });
            }
            Ok(JobResult::fallback("done"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_keeps_firing_after_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let runner = Arc::new(RecordingRunner {
            calls: AtomicUsize::new(0),
            fail_first: 1,
            tx,
        });

        let handle = Scheduler::with_timezone(Arc::clone(&runner), Utc)
            .with_triggers([trigger("wednesday-carousel")])
            .spawn();
        assert_eq!(handle.len(), 1);

        for _ in 0..3 {
            let job = rx.recv().await.unwrap();
            assert_eq!(job.kind, GenerationKind::Carousel);
            assert_eq!(job.count, Some(5));
        }
        assert!(runner.calls.load(Ordering::SeqCst) >= 3);

        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_runs_every_trigger() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let runner = Arc::new(RecordingRunner {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            tx,
        });

        let handle = Scheduler::with_timezone(runner, Utc).spawn();
        assert_eq!(handle.len(), 3);

        let mut kinds = Vec::new();
        while kinds.len() < 6 {
            kinds.push(rx.recv().await.unwrap().kind);
        }
        for kind in GenerationKind::ALL {
            assert!(kinds.contains(&kind));
        }

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_scheduler_skips_invalid_trigger() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let runner = Arc::new(RecordingRunner {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            tx,
        });
        let broken = Trigger {
            name: "broken",
            cron: "not a cron line",
            job: GenerationJob::new(GenerationKind::Static),
        };

        let handle = Scheduler::with_timezone(runner, Utc)
            .with_triggers([broken, trigger("friday-reels")])
            .spawn();
        assert_eq!(handle.len(), 1);

        handle.shutdown();
    }
}
