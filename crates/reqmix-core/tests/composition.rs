//! Throttle wrapped around retry, driven through the `Operation` interface.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use reqmix_core::{
    bind, named, wrap_with_retry, wrap_with_throttle, Attribute, Failure, HasName, InterruptToken,
    ManualClock, Operation, RetryError, RetryPolicy, Setting, ThrottleGate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    Busy,
    Gone,
}

#[derive(Debug, Clone, PartialEq)]
struct FetchError(Kind);

impl Failure for FetchError {
    type Kind = Kind;

    fn kind(&self) -> Kind {
        self.0
    }
}

#[derive(Debug)]
struct Crawler {
    replies: RefCell<Vec<Result<&'static str, FetchError>>>,
    calls: Cell<u32>,
    attempt_count: Option<u32>,
}

impl Crawler {
    fn new(mut replies: Vec<Result<&'static str, FetchError>>) -> Self {
        replies.reverse();
        Self {
            replies: RefCell::new(replies),
            calls: Cell::new(0),
            attempt_count: None,
        }
    }
}

impl Attribute<u32> for Crawler {
    fn attribute(&self, name: &str) -> Option<u32> {
        (name == "attempt_count").then_some(self.attempt_count?)
    }
}

impl Attribute<Duration> for Crawler {
    fn attribute(&self, _name: &str) -> Option<Duration> {
        None
    }
}

fn fetch(c: &Crawler, path: &str) -> Result<String, FetchError> {
    c.calls.set(c.calls.get() + 1);
    let reply = c
        .replies
        .borrow_mut()
        .pop()
        .unwrap_or(Err(FetchError(Kind::Gone)));
    reply.map(|body| format!("{}:{}", path, body))
}

#[test]
fn throttle_outside_retry_waits_once_per_call() {
    let clock = ManualClock::new();
    let policy = RetryPolicy::with_attempts(Setting::attribute("attempt_count", 3))
        .unwrap()
        .retry_on([Kind::Busy])
        .with_delay(Duration::from_millis(100))
        .with_clock(clock.clone());
    let gate = ThrottleGate::new(Duration::from_secs(1)).with_clock(clock.clone());
    let op = wrap_with_throttle(wrap_with_retry(named("fetch", fetch), policy), gate);
    assert_eq!(op.name(), "fetch");

    let crawler = Crawler::new(vec![
        Err(FetchError(Kind::Busy)),
        Ok("a"),
        Err(FetchError(Kind::Busy)),
        Err(FetchError(Kind::Busy)),
        Ok("b"),
    ]);

    assert_eq!(op.invoke(&crawler, "/x").unwrap(), "/x:a");
    assert_eq!(op.invoke(&crawler, "/y").unwrap(), "/y:b");
    assert_eq!(crawler.calls.get(), 5);
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_millis(100),
            Duration::from_secs(1),
            Duration::from_millis(100),
            Duration::from_millis(100),
        ]
    );
}

#[test]
fn unretryable_error_passes_through_both_layers_unchanged() {
    let clock = ManualClock::new();
    let policy = RetryPolicy::new(5)
        .unwrap()
        .retry_on([Kind::Busy])
        .with_clock(clock.clone());
    let gate = ThrottleGate::new(Duration::ZERO).with_clock(clock);
    let op = wrap_with_throttle(wrap_with_retry(named("fetch", fetch), policy), gate);

    let crawler = Crawler::new(vec![Err(FetchError(Kind::Gone))]);
    let bound = bind(&op, &crawler);
    match bound.call("/z") {
        Err(RetryError::Unretryable(e)) => assert_eq!(e, FetchError(Kind::Gone)),
        other => panic!("expected unretryable, got {:?}", other),
    }
    assert_eq!(crawler.calls.get(), 1);
}

#[test]
fn interrupt_during_throttle_wait_surfaces_as_retry_interrupt() {
    let token = InterruptToken::new();
    let clock = ManualClock::new().with_interrupt(token.clone());
    let policy = RetryPolicy::<Kind>::new(2).unwrap().with_clock(clock.clone());
    let gate = ThrottleGate::new(Duration::from_secs(10)).with_clock(clock);
    let op = wrap_with_throttle(wrap_with_retry(named("fetch", fetch), policy), gate);

    let crawler = Crawler::new(vec![Ok("first")]);
    op.invoke(&crawler, "/").unwrap();
    token.trip();
    let err = op.invoke(&crawler, "/").unwrap_err();
    assert!(err.is_interrupted());
    assert_eq!(crawler.calls.get(), 1);
}

#[test]
fn per_instance_attempt_count() {
    let clock = ManualClock::new();
    let policy = RetryPolicy::with_attempts(Setting::attribute("attempt_count", 1))
        .unwrap()
        .with_clock(clock);
    let op = wrap_with_retry(named("fetch", fetch), policy);

    let mut crawler = Crawler::new(vec![Err(FetchError(Kind::Busy)), Ok("ok")]);
    assert!(matches!(
        op.invoke(&crawler, "/"),
        Err(RetryError::Exhausted(ref agg)) if agg.len() == 1
    ));
    crawler.attempt_count = Some(4);
    assert_eq!(op.invoke(&crawler, "/").unwrap(), "/:ok");
}
