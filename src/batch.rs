/// Parallel checking of many rule lines
use crate::error::{Result, RuleCheckError};
use crate::input::RuleLine;
use crate::rules::{process_rule, RuleReport};
use crossbeam::channel;
use std::thread;
use tracing::{debug, info};

/// Outcome for one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedRule {
    pub line: RuleLine,
    pub report: RuleReport,
}

/// Runs `process_rule` over a batch of lines on a pool of worker threads
///
/// Every rule is checked with its own state; workers share nothing but the
/// read-only option table and grammar registry. Results come back in input
/// order regardless of which worker finished first.
#[derive(Debug, Clone)]
pub struct BatchValidator {
    worker_threads: usize,
    queue_size: usize,
}

impl BatchValidator {
    /// `worker_threads == 0` picks a count from the available CPUs
    pub fn new(worker_threads: usize, queue_size: usize) -> Self {
        Self {
            worker_threads,
            queue_size: queue_size.max(1),
        }
    }

    /// Number of worker threads that will actually run
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get().saturating_sub(2).max(1)
        } else {
            self.worker_threads
        }
    }

    pub fn validate(&self, lines: Vec<RuleLine>) -> Result<Vec<CheckedRule>> {
        let workers = self.effective_workers().min(lines.len().max(1));

        if workers <= 1 {
            debug!("Checking {} rules inline", lines.len());
            return Ok(lines.into_iter().map(check_line).collect());
        }

        info!("Checking {} rules on {} worker threads", lines.len(), workers);

        let total = lines.len();
        let (job_tx, job_rx) = channel::bounded::<(usize, RuleLine)>(self.queue_size);
        let (result_tx, result_rx) = channel::unbounded::<(usize, CheckedRule)>();

        let mut slots: Vec<Option<CheckedRule>> = vec![None; total];

        thread::scope(|scope| -> Result<()> {
            let mut handles = Vec::with_capacity(workers);

            for worker_id in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();

                handles.push(scope.spawn(move || -> Result<()> {
                    let mut checked = 0usize;
                    for (idx, line) in job_rx.iter() {
                        result_tx.send((idx, check_line(line)))?;
                        checked += 1;
                    }
                    debug!(worker_id, checked, "Worker finished");
                    Ok(())
                }));
            }

            // Only the workers hold these now, so the channels close when they finish.
            drop(job_rx);
            drop(result_tx);

            for job in lines.into_iter().enumerate() {
                job_tx.send(job)?;
            }
            drop(job_tx);

            for (idx, checked) in result_rx.iter() {
                slots[idx] = Some(checked);
            }

            for handle in handles {
                handle
                    .join()
                    .map_err(|_| RuleCheckError::ThreadError("Worker thread panicked".to_string()))??;
            }

            Ok(())
        })?;

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| {
                    RuleCheckError::ThreadError(format!("No result for rule #{}", idx + 1))
                })
            })
            .collect()
    }
}

impl Default for BatchValidator {
    fn default() -> Self {
        Self::new(0, 1_024)
    }
}

fn check_line(line: RuleLine) -> CheckedRule {
    let report = process_rule(&line.text);
    CheckedRule { line, report }
}
