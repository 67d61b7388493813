//! Tests for the background sink worker

#[cfg(test)]
mod tests {
    use crate::queue::api::{
        HandoffQueue, MetricsRecord, MetricsSink, RetryPolicy, SinkError, SinkWorker,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(10),
        }
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + timeout;
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(10));
        }
    }

    struct CollectingSink {
        names: Arc<Mutex<Vec<String>>>,
        flushes: Arc<AtomicUsize>,
    }

    impl MetricsSink for CollectingSink {
        fn put(&mut self, record: &MetricsRecord) -> Result<(), SinkError> {
            self.names.lock().unwrap().push(record.name.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<(), SinkError> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink {
        attempts: Arc<AtomicUsize>,
        fail_on: Option<String>,
        delivered: Arc<Mutex<Vec<String>>>,
    }

    impl MetricsSink for FailingSink {
        fn put(&mut self, record: &MetricsRecord) -> Result<(), SinkError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match &self.fail_on {
                Some(name) if *name == record.name => Err("simulated sink outage".into()),
                Some(_) => {
                    self.delivered.lock().unwrap().push(record.name.clone());
                    Ok(())
                }
                None => Err("simulated sink outage".into()),
            }
        }
    }

    #[test]
    fn test_worker_delivers_records_in_order() {
        let queue = Arc::new(HandoffQueue::new(64));
        let names = Arc::new(Mutex::new(Vec::new()));
        let flushes = Arc::new(AtomicUsize::new(0));

        let sink = CollectingSink {
            names: Arc::clone(&names),
            flushes: Arc::clone(&flushes),
        };
        let worker =
            SinkWorker::start("test-sink", Arc::clone(&queue), sink, fast_retry()).unwrap();
        assert_eq!(worker.name(), "test-sink");

        for i in 0..5 {
            let record = MetricsRecord::new("test", format!("record-{}", i))
                .add_metric("value", i as f64);
            assert!(queue.enqueue(record).unwrap());
        }

        wait_until(Duration::from_secs(5), || names.lock().unwrap().len() == 5);
        worker.stop();

        let delivered = names.lock().unwrap();
        let expected: Vec<String> = (0..5).map(|i| format!("record-{}", i)).collect();
        assert_eq!(*delivered, expected);
        assert!(flushes.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_worker_drops_failing_record_and_keeps_draining() {
        let queue = Arc::new(HandoffQueue::new(16));
        let attempts = Arc::new(AtomicUsize::new(0));
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let sink = FailingSink {
            attempts: Arc::clone(&attempts),
            fail_on: Some("poison".to_string()),
            delivered: Arc::clone(&delivered),
        };
        let worker =
            SinkWorker::start("flaky-sink", Arc::clone(&queue), sink, fast_retry()).unwrap();

        queue.enqueue(MetricsRecord::new("test", "first")).unwrap();
        queue.enqueue(MetricsRecord::new("test", "poison")).unwrap();
        queue.enqueue(MetricsRecord::new("test", "second")).unwrap();

        // Best-effort drain: the poison record is consumed and lost, the
        // records around it still arrive
        wait_until(Duration::from_secs(5), || {
            delivered.lock().unwrap().len() == 2
        });
        worker.stop();

        assert_eq!(
            *delivered.lock().unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn test_worker_gives_up_after_consecutive_failures() {
        let queue = Arc::new(HandoffQueue::new(16));
        let attempts = Arc::new(AtomicUsize::new(0));

        let sink = FailingSink {
            attempts: Arc::clone(&attempts),
            fail_on: None,
            delivered: Arc::new(Mutex::new(Vec::new())),
        };
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(5),
        };
        let worker = SinkWorker::start("dead-sink", Arc::clone(&queue), sink, policy).unwrap();

        for i in 0..3 {
            queue
                .enqueue(MetricsRecord::new("test", format!("r{}", i)))
                .unwrap();
        }

        wait_until(Duration::from_secs(5), || {
            attempts.load(Ordering::SeqCst) == 2
        });
        // Give the worker a moment to prove it stopped trying
        thread::sleep(Duration::from_millis(100));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        // The third record was never taken out of the queue
        assert_eq!(queue.size().unwrap(), 1);
        worker.stop();
    }

    #[test]
    fn test_worker_stops_cleanly_while_idle() {
        let queue = Arc::new(HandoffQueue::new(8));
        let sink = CollectingSink {
            names: Arc::new(Mutex::new(Vec::new())),
            flushes: Arc::new(AtomicUsize::new(0)),
        };

        let worker =
            SinkWorker::start("idle-sink", Arc::clone(&queue), sink, fast_retry()).unwrap();
        thread::sleep(Duration::from_millis(50));
        worker.stop();

        // No consumer is left behind: new records simply accumulate
        queue.enqueue(MetricsRecord::new("test", "later")).unwrap();
        assert_eq!(queue.size().unwrap(), 1);
    }

    #[test]
    fn test_dropping_worker_stops_its_thread() {
        let queue = Arc::new(HandoffQueue::new(8));
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = CollectingSink {
            names: Arc::clone(&names),
            flushes: Arc::new(AtomicUsize::new(0)),
        };

        {
            let _worker =
                SinkWorker::start("scoped-sink", Arc::clone(&queue), sink, fast_retry()).unwrap();
            queue.enqueue(MetricsRecord::new("test", "scoped")).unwrap();
            wait_until(Duration::from_secs(5), || names.lock().unwrap().len() == 1);
        }

        // Worker gone: the queue keeps accepting without being drained
        queue.enqueue(MetricsRecord::new("test", "after")).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.size().unwrap(), 1);
    }
}
